//! Script-ratio language detection

use super::scan::{is_hangul, is_latin};
use crate::document::DetectedLanguage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Hangul,
    Latin,
    Other,
}

/// Scripts that name a language when they dominate the text.
/// Any other outcome is `mixed`.
const SCRIPT_LANGUAGES: &[(Script, DetectedLanguage)] = &[
    (Script::Hangul, DetectedLanguage::Ko),
    (Script::Latin, DetectedLanguage::En),
];

fn classify(c: char) -> Option<Script> {
    if !c.is_alphabetic() {
        return None;
    }
    Some(if is_hangul(c) {
        Script::Hangul
    } else if is_latin(c) {
        Script::Latin
    } else {
        Script::Other
    })
}

/// Letter counts per script. Digits, punctuation and whitespace are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptProfile {
    pub hangul: usize,
    pub latin: usize,
    pub other: usize,
}

impl ScriptProfile {
    pub fn of(text: &str) -> Self {
        let mut profile = Self::default();
        for script in text.chars().filter_map(classify) {
            match script {
                Script::Hangul => profile.hangul += 1,
                Script::Latin => profile.latin += 1,
                Script::Other => profile.other += 1,
            }
        }
        profile
    }

    pub fn total(&self) -> usize {
        self.hangul + self.latin + self.other
    }

    fn ratio(&self, script: Script) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let count = match script {
            Script::Hangul => self.hangul,
            Script::Latin => self.latin,
            Script::Other => self.other,
        };
        count as f64 / total as f64
    }
}

/// Classify by the share of letters in each script.
///
/// Exactly one script strictly above `threshold` names the language. No
/// letters, no dominant script, or more than one candidate is `mixed`.
pub fn detect_language(text: &str, threshold: f64) -> DetectedLanguage {
    let profile = ScriptProfile::of(text);

    let dominant: Vec<DetectedLanguage> = SCRIPT_LANGUAGES
        .iter()
        .filter(|(script, _)| profile.ratio(*script) > threshold)
        .map(|(_, language)| *language)
        .collect();

    match dominant.as_slice() {
        [language] => *language,
        _ => DetectedLanguage::Mixed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: f64 = 0.9;

    #[test]
    fn hangul_text_is_korean() {
        let text = "제1조 (목적) 본 계약은 근로조건을 정함을 목적으로 한다.";
        assert_eq!(detect_language(text, THRESHOLD), DetectedLanguage::Ko);
    }

    #[test]
    fn latin_text_is_english() {
        let text = "The Employee shall keep all Confidential Information secret (제3조).";
        let profile = ScriptProfile::of(text);
        assert!(profile.latin as f64 / profile.total() as f64 > THRESHOLD);
        assert_eq!(detect_language(text, THRESHOLD), DetectedLanguage::En);
    }

    #[test]
    fn balanced_mixture_is_mixed() {
        let text = "임대인 landlord 임차인 tenant 보증금 deposit";
        assert_eq!(detect_language(text, THRESHOLD), DetectedLanguage::Mixed);
    }

    #[test]
    fn no_letters_is_mixed() {
        assert_eq!(detect_language("1234 -- 5678", THRESHOLD), DetectedLanguage::Mixed);
    }

    #[test]
    fn vietnamese_diacritics_count_as_latin() {
        let profile = ScriptProfile::of("Hợp đồng thuê nhà");
        assert_eq!(profile.other, 0);
        assert_eq!(profile.hangul, 0);
    }
}

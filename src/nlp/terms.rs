//! Legal term candidate extraction
//!
//! Rules, applied over the whole normalized text:
//! - lexicon: known legal compounds (비밀유지, 손해배상, ...)
//! - legal suffix: Hangul compounds of 3+ syllables ending in a legal suffix
//! - heading: clause headings that are not generic ("목적", "Definitions")
//! - quoted definition: `"X"(이)란`, `"X" means`
//! - capitalized phrase: 2-4 capitalized Latin words ("Confidential Information")
//!
//! Korean particles are stripped before matching. Candidates are deduplicated
//! by normalized key and ordered by first occurrence, so truncation keeps the
//! earliest terms.

use super::scan::{char_at, is_hangul, words};
use crate::document::{normalize_term, Clause, Span, TermCandidate, TermRule};
use std::collections::HashSet;

const LEXICON: &[&str] = &[
    "비밀유지", "손해배상", "위약금", "보증금", "퇴직금", "최저임금", "근로시간", "연차휴가",
    "해지", "해제", "계약해지", "영업비밀", "기밀정보", "비밀정보", "지식재산권", "저작권",
    "경업금지", "면책", "불가항력", "준거법", "관할법원", "임금", "차임", "원상복구", "갱신",
    "하자담보", "지체상금", "연대보증", "수습기간", "징계", "해고", "손해배상책임",
];

const LEGAL_SUFFIXES: &[&str] = &[
    "의무", "책임", "기간", "계약", "해지", "위반", "보험", "수당", "휴가", "정보", "비밀",
    "보증", "배상", "대금", "금", "권", "료",
];

/// Longest first, so "에게서" is tried before "에게" and "에"
const PARTICLES: &[&str] = &[
    "에게서", "으로써", "으로서", "에서는", "이라는", "에게", "에서", "으로", "로서", "로써",
    "이란", "까지", "부터", "보다", "은", "는", "이", "가", "을", "를", "의", "에", "로", "과",
    "와", "도", "만", "란",
];

const STOPWORDS: &[&str] = &[
    "부분", "문제", "상황", "방식", "이유", "방법", "관련", "사실", "정의", "절차", "이상",
    "이하", "다음", "해당", "대해", "위해", "대한", "우리", "저희", "당신", "하나", "기타",
    "목적", "본계약", "계약서", "당사자", "효력", "일반사항", "definitions", "definition",
    "purpose", "general", "miscellaneous", "term", "scope", "recitals", "notices",
    "agreement", "this agreement", "whereas",
];

/// Leading words that do not belong to a capitalized phrase
const PHRASE_LEADERS: &[&str] = &[
    "The", "This", "That", "These", "Those", "Each", "Any", "All", "Such", "Either",
    "Neither", "Both", "No", "An", "A", "If", "In", "On", "Upon", "For", "Whereas", "Article",
    "Section",
];

const DEFINITION_CUES: &[&str] = &[
    "이라 함은", "라 함은", "이란", "란", "means", "shall mean", "refers to", "has the meaning",
];

const MAX_PHRASE_WORDS: usize = 4;
const MAX_TERM_CHARS: usize = 40;

fn is_stopword(term: &str) -> bool {
    let key = normalize_term(term);
    STOPWORDS.iter().any(|s| *s == key)
}

fn strip_particle(word: &str) -> &str {
    for particle in PARTICLES {
        if let Some(stem) = word.strip_suffix(particle) {
            if stem.chars().count() >= 2 {
                return stem;
            }
        }
    }
    word
}

fn classify_hangul_word(stem: &str) -> Option<TermRule> {
    let len = stem.chars().count();
    if len < 2 || !stem.chars().all(is_hangul) || is_stopword(stem) {
        return None;
    }
    if LEXICON.contains(&stem) {
        return Some(TermRule::Lexicon);
    }
    if len >= 3 && LEGAL_SUFFIXES.iter().any(|suffix| stem.ends_with(suffix)) {
        return Some(TermRule::LegalSuffix);
    }
    None
}

fn hangul_terms(text: &str) -> Vec<TermCandidate> {
    words(text)
        .into_iter()
        .filter_map(|(offset, word)| {
            let stem = strip_particle(word);
            let rule = classify_hangul_word(stem)?;
            Some(TermCandidate::new(
                stem,
                Span::new(offset, offset + stem.len()),
                rule,
            ))
        })
        .collect()
}

fn heading_terms(text: &str, clauses: &[Clause]) -> Vec<TermCandidate> {
    clauses
        .iter()
        .filter_map(|clause| {
            let heading = clause.heading.as_deref()?;
            let len = heading.chars().count();
            if !(2..=20).contains(&len)
                || is_stopword(heading)
                || !heading.chars().any(char::is_alphabetic)
            {
                return None;
            }
            let offset = clause.span.start
                + text[clause.span.start..clause.span.end].find(heading)?;
            Some(TermCandidate::new(
                heading,
                Span::new(offset, offset + heading.len()),
                TermRule::Heading,
            ))
        })
        .collect()
}

fn closing_quote(open: char) -> Option<char> {
    Some(match open {
        '"' => '"',
        '“' => '”',
        '\'' => '\'',
        '‘' => '’',
        '「' => '」',
        '『' => '』',
        _ => return None,
    })
}

fn quoted_definitions(text: &str) -> Vec<TermCandidate> {
    let mut out = Vec::new();
    let mut resume_at = 0;

    for (i, open) in text.char_indices() {
        if i < resume_at {
            continue;
        }
        let Some(close) = closing_quote(open) else {
            continue;
        };
        let inner_start = i + open.len_utf8();
        let Some(len) = text[inner_start..].find(close) else {
            continue;
        };
        let inner = &text[inner_start..inner_start + len];
        let after = inner_start + len + close.len_utf8();
        resume_at = after;

        let chars = inner.chars().count();
        if chars < 2 || chars > MAX_TERM_CHARS || inner.contains('\n') {
            continue;
        }

        // Korean cues attach directly ("X"이란), English ones follow a space
        let rest = text[after..].trim_start_matches(' ');
        let cued = DEFINITION_CUES.iter().any(|cue| {
            rest.get(..cue.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(cue))
                && !char_at(rest, cue.len()).is_some_and(char::is_alphanumeric)
        });
        if cued && !is_stopword(inner) {
            out.push(TermCandidate::new(
                inner.trim(),
                Span::new(inner_start, inner_start + len),
                TermRule::QuotedDefinition,
            ));
        }
    }
    out
}

fn is_capitalized_word(word: &str) -> bool {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_uppercase() && word.len() >= 2 && chars.all(|c| c.is_ascii_alphabetic())
}

fn capitalized_phrases(text: &str) -> Vec<TermCandidate> {
    let words = words(text);
    let mut out = Vec::new();
    let mut i = 0;

    while i < words.len() {
        // a run of capitalized words separated only by single spaces
        let mut run = vec![words[i]];
        if !is_capitalized_word(words[i].1) {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        while j < words.len() && is_capitalized_word(words[j].1) {
            let (prev_offset, prev) = run[run.len() - 1];
            if &text[prev_offset + prev.len()..words[j].0] != " " {
                break;
            }
            run.push(words[j]);
            j += 1;
        }
        i = j;

        let leading = run
            .iter()
            .take_while(|(_, w)| PHRASE_LEADERS.contains(w))
            .count();
        let phrase = &run[leading..];
        if phrase.len() < 2 {
            continue;
        }
        let phrase = &phrase[..phrase.len().min(MAX_PHRASE_WORDS)];
        let (start, _) = phrase[0];
        let (last_offset, last) = phrase[phrase.len() - 1];
        let end = last_offset + last.len();
        let surface = &text[start..end];
        if !is_stopword(surface) {
            out.push(TermCandidate::new(
                surface,
                Span::new(start, end),
                TermRule::CapitalizedPhrase,
            ));
        }
    }
    out
}

/// Extract up to `max` candidates, earliest occurrences first
pub fn extract_term_candidates(text: &str, clauses: &[Clause], max: usize) -> Vec<TermCandidate> {
    let mut found = hangul_terms(text);
    found.extend(heading_terms(text, clauses));
    found.extend(quoted_definitions(text));
    found.extend(capitalized_phrases(text));

    // stable: on equal offsets the earlier rule keeps precedence
    found.sort_by_key(|candidate| candidate.span.start);

    let mut seen = HashSet::new();
    found
        .into_iter()
        .filter(|candidate| !candidate.key.is_empty() && seen.insert(candidate.key.clone()))
        .take(max)
        .collect()
}

//! Rule-based preprocessing of raw legal text into a [`Document`]
//!
//! Stages run in a fixed order, each a pure function over the normalized
//! text: normalization, language detection, domain tagging, clause
//! segmentation, party extraction and term-candidate extraction. Nothing
//! here touches the network.

mod domain;
mod language;
mod normalize;
mod parties;
pub(crate) mod scan;
mod segment;
mod terms;

pub use domain::{score_domains, tag_domain};
pub use language::{detect_language, ScriptProfile};
pub use normalize::{normalize_text, paragraphs};
pub use parties::{extract_parties, parties_in};
pub use segment::{find_markers, segment, Marker, MarkerKind, Segmentation};
pub use terms::extract_term_candidates;

use crate::config::NlpConfig;
use crate::document::Document;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreprocessError {
    #[error("document text is empty after normalization")]
    EmptyText,
}

/// Turns raw text into an immutable [`Document`]
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    config: NlpConfig,
}

impl Preprocessor {
    pub fn new(config: NlpConfig) -> Self {
        Self { config }
    }

    pub fn preprocess(&self, raw: &str) -> Result<Document, PreprocessError> {
        let normalized = normalize_text(raw);
        if !normalized.chars().any(char::is_alphanumeric) {
            return Err(PreprocessError::EmptyText);
        }

        let language = detect_language(&normalized, self.config.language_threshold);
        let domain = tag_domain(&normalized);
        let Segmentation {
            preamble,
            mut clauses,
        } = segment(&normalized);
        let parties = extract_parties(&normalized, domain);
        for clause in &mut clauses {
            clause.parties = parties_in(&clause.text, &parties);
        }
        let candidates =
            extract_term_candidates(&normalized, &clauses, self.config.max_term_candidates);

        debug!(
            clauses = clauses.len(),
            language = language.as_str(),
            domain = domain.as_str(),
            parties = parties.len(),
            candidates = candidates.len(),
            "preprocessed document"
        );

        Ok(Document::new(
            raw.to_string(),
            normalized,
            language,
            domain,
            preamble,
            clauses,
            parties,
            candidates,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DetectedLanguage, Domain};

    #[test]
    fn korean_nda_document() {
        let raw = "제1조 (목적) 본 계약은 ... 제2조 (비밀유지) 양 당사자는 ...";
        let doc = Preprocessor::default().preprocess(raw).unwrap();

        assert_eq!(doc.clauses().len(), 2);
        assert_eq!(doc.clauses()[0].heading.as_deref(), Some("목적"));
        assert_eq!(doc.clauses()[1].heading.as_deref(), Some("비밀유지"));
        assert_eq!(doc.language(), DetectedLanguage::Ko);
        assert_eq!(doc.domain(), Domain::Nda);
        assert!(doc
            .term_candidates()
            .iter()
            .any(|c| c.surface == "비밀유지"));
        assert_eq!(doc.clause_node_ids(), vec!["clause_1", "clause_2"]);
    }

    #[test]
    fn clause_indices_are_contiguous() {
        let raw = "서문\n제1조 (목적) 가\n제1조의2 (정의) 나\n제5조 (해지) 다";
        let doc = Preprocessor::default().preprocess(raw).unwrap();
        let indices: Vec<usize> = doc.clauses().iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(doc.preamble(), Some("서문"));
        assert_eq!(doc.clause(3).map(|c| c.heading.as_deref()), Some(Some("해지")));
    }

    #[test]
    fn clauses_record_party_mentions() {
        let raw = "제1조 (보증금) 임차인은 보증금을 지급한다.\n제2조 (반환) 임대인은 보증금을 반환한다.";
        let doc = Preprocessor::default().preprocess(raw).unwrap();
        assert_eq!(doc.domain(), Domain::Lease);
        assert_eq!(doc.clauses()[0].parties, vec!["임차인".to_string()]);
        assert_eq!(doc.clauses()[1].parties, vec!["임대인".to_string()]);
    }

    #[test]
    fn candidate_cap_comes_from_config() {
        let config = NlpConfig {
            max_term_candidates: 1,
            ..NlpConfig::default()
        };
        let doc = Preprocessor::new(config)
            .preprocess("위약금 보증금 퇴직금")
            .unwrap();
        assert_eq!(doc.term_candidates().len(), 1);
    }

    #[test]
    fn blank_input_is_rejected() {
        let pre = Preprocessor::default();
        assert_eq!(pre.preprocess("").unwrap_err(), PreprocessError::EmptyText);
        assert_eq!(
            pre.preprocess(" \n\t\u{200b} ... ").unwrap_err(),
            PreprocessError::EmptyText
        );
    }
}

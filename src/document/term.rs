//! Candidate legal terms

use super::clause::Span;
use serde::{Deserialize, Serialize};

/// Which extraction rule proposed a term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermRule {
    /// Entry of the built-in legal lexicon
    Lexicon,
    /// Clause heading such as "(비밀유지)"
    Heading,
    /// Quoted definition: `"X"(이)란`, `"X" means`
    QuotedDefinition,
    /// Hangul compound ending in a legal suffix (-금, -권, -의무, ...)
    LegalSuffix,
    /// Capitalized multi-word phrase in Latin text
    CapitalizedPhrase,
}

/// A span suspected to be a defined legal term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCandidate {
    pub surface: String,
    /// First occurrence in the normalized text
    pub span: Span,
    /// Normalized form used for deduplication
    pub key: String,
    pub rule: TermRule,
}

impl TermCandidate {
    pub fn new(surface: impl Into<String>, span: Span, rule: TermRule) -> Self {
        let surface = surface.into();
        let key = normalize_term(&surface);
        Self {
            surface,
            span,
            key,
            rule,
        }
    }
}

/// Lowercase and collapse internal whitespace
pub fn normalize_term(term: &str) -> String {
    term.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

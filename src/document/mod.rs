//! Document model produced by preprocessing
//!
//! A [`Document`] is built once by the NLP preprocessor and never mutated
//! afterwards. Every downstream stage (term resolution, prompt building,
//! graph validation) reads from it.

mod clause;
mod language;
mod party;
mod term;

pub use clause::{clause_node_id, Clause, Span};
pub use language::{DetectedLanguage, Domain, OutputLanguage, UnknownLanguage};
pub use party::{Party, PartyRole};
pub use term::{normalize_term, TermCandidate, TermRule};

use serde::{Deserialize, Serialize};

/// A preprocessed legal document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    raw_text: String,
    normalized_text: String,
    language: DetectedLanguage,
    domain: Domain,
    /// Text before the first clause marker (title, party introductions)
    preamble: Option<String>,
    clauses: Vec<Clause>,
    parties: Vec<Party>,
    term_candidates: Vec<TermCandidate>,
}

impl Document {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        raw_text: String,
        normalized_text: String,
        language: DetectedLanguage,
        domain: Domain,
        preamble: Option<String>,
        clauses: Vec<Clause>,
        parties: Vec<Party>,
        term_candidates: Vec<TermCandidate>,
    ) -> Self {
        Self {
            raw_text,
            normalized_text,
            language,
            domain,
            preamble,
            clauses,
            parties,
            term_candidates,
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Text after whitespace normalization; the cache key is derived from this.
    pub fn normalized_text(&self) -> &str {
        &self.normalized_text
    }

    pub fn language(&self) -> DetectedLanguage {
        self.language
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn preamble(&self) -> Option<&str> {
        self.preamble.as_deref()
    }

    /// Clauses in document order, indexed from 1 without gaps
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn clause(&self, index: usize) -> Option<&Clause> {
        index
            .checked_sub(1)
            .and_then(|i| self.clauses.get(i))
    }

    pub fn parties(&self) -> &[Party] {
        &self.parties
    }

    pub fn term_candidates(&self) -> &[TermCandidate] {
        &self.term_candidates
    }

    /// Graph node ids of every clause, in order
    pub fn clause_node_ids(&self) -> Vec<String> {
        self.clauses.iter().map(Clause::node_id).collect()
    }
}

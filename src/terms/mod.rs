//! Legal term resolution against an external dictionary
//!
//! Two implementations of [`TermProvider`]:
//! - `MolegClient`: the Korean Ministry of Government Legislation term service
//! - `MockTermProvider`: scripted definitions and failures (testing, offline runs)
//!
//! [`TermResolver`] fans lookups out under a concurrency bound and always
//! returns one [`TermDefinition`] per requested term.

mod mock;
mod moleg;
mod resolver;

pub use mock::MockTermProvider;
pub use moleg::{parse_moleg_response, MolegClient};
pub use resolver::TermResolver;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resolved glossary keyed by term surface form
pub type Glossary = BTreeMap<String, TermDefinition>;

/// Outcome of resolving one term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermStatus {
    Resolved,
    NotFound,
    Error,
}

impl TermStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resolved => "resolved",
            Self::NotFound => "not_found",
            Self::Error => "error",
        }
    }
}

/// Definition of a term; both texts are `None` unless resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermDefinition {
    pub term: String,
    pub ko: Option<String>,
    pub en: Option<String>,
    pub status: TermStatus,
}

impl TermDefinition {
    pub fn resolved(term: impl Into<String>, found: ProviderDefinition) -> Self {
        if found.is_empty() {
            return Self::not_found(term);
        }
        Self {
            term: term.into(),
            ko: found.ko,
            en: found.en,
            status: TermStatus::Resolved,
        }
    }

    pub fn not_found(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ko: None,
            en: None,
            status: TermStatus::NotFound,
        }
    }

    pub fn error(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ko: None,
            en: None,
            status: TermStatus::Error,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status == TermStatus::Resolved
    }
}

/// What a provider knows about a term
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderDefinition {
    pub ko: Option<String>,
    pub en: Option<String>,
}

impl ProviderDefinition {
    pub fn new(ko: Option<String>, en: Option<String>) -> Self {
        let keep = |s: Option<String>| s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            ko: keep(ko),
            en: keep(en),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ko.is_none() && self.en.is_none()
    }
}

/// Errors from a single term lookup. Never fatal to the pipeline.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TermLookupError {
    #[error("lookup timed out")]
    Timeout,
    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed provider response: {0}")]
    Malformed(String),
    #[error("lookup task failed: {0}")]
    TaskFailed(String),
}

/// A legal-term dictionary service.
///
/// `Ok(None)` means the provider has no entry for the term.
#[async_trait]
pub trait TermProvider: Send + Sync {
    async fn lookup(&self, term: &str) -> Result<Option<ProviderDefinition>, TermLookupError>;
}

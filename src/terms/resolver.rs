//! Bounded concurrent term resolution

use super::{Glossary, TermDefinition, TermLookupError, TermProvider, TermStatus};
use crate::config::TermsConfig;
use crate::document::TermCandidate;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Resolves term candidates through a [`TermProvider`]
#[derive(Clone)]
pub struct TermResolver {
    provider: Arc<dyn TermProvider>,
    timeout: Duration,
    max_concurrency: usize,
}

impl TermResolver {
    pub fn new(provider: Arc<dyn TermProvider>) -> Self {
        Self::from_config(provider, &TermsConfig::default())
    }

    pub fn from_config(provider: Arc<dyn TermProvider>, config: &TermsConfig) -> Self {
        Self {
            provider,
            timeout: config.timeout(),
            max_concurrency: config.max_concurrency.max(1),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit.max(1);
        self
    }

    /// Look up every candidate, returning one entry per distinct surface form.
    ///
    /// Failures stay per-term: a timeout, provider error or panicked task
    /// marks only that term as `error`.
    pub async fn resolve(&self, candidates: &[TermCandidate]) -> Glossary {
        // pre-filled so a panicked task still leaves its entry behind
        let mut glossary: Glossary = candidates
            .iter()
            .map(|c| (c.surface.clone(), TermDefinition::error(&c.surface)))
            .collect();
        if glossary.is_empty() {
            return glossary;
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for term in glossary.keys().cloned() {
            let provider = Arc::clone(&self.provider);
            let semaphore = Arc::clone(&semaphore);
            let timeout = self.timeout;
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return (term, Err(TermLookupError::TaskFailed(e.to_string()))),
                };
                let outcome = match tokio::time::timeout(timeout, provider.lookup(&term)).await {
                    Ok(result) => result,
                    Err(_) => Err(TermLookupError::Timeout),
                };
                (term, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (term, outcome) = match joined {
                Ok(done) => done,
                Err(e) => {
                    warn!(error = %e, "term lookup task failed");
                    continue;
                }
            };
            let definition = match outcome {
                Ok(Some(found)) => TermDefinition::resolved(&term, found),
                Ok(None) => TermDefinition::not_found(&term),
                Err(e) => {
                    debug!(term = %term, error = %e, "term lookup failed");
                    TermDefinition::error(&term)
                }
            };
            glossary.insert(term, definition);
        }

        let count = |status| glossary.values().filter(|d| d.status == status).count();
        info!(
            terms = glossary.len(),
            resolved = count(TermStatus::Resolved),
            not_found = count(TermStatus::NotFound),
            errors = count(TermStatus::Error),
            "term resolution finished"
        );
        glossary
    }
}

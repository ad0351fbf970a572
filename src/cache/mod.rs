//! Content-addressed analysis cache with single-flight computation
//!
//! [`AnalysisCache`] wraps a [`CacheBackend`] and guarantees that concurrent
//! requests for one key share a single computation. The computation runs on
//! its own task, so a caller that goes away does not cancel it.

mod memory;

pub use memory::MemoryCacheBackend;

use crate::document::OutputLanguage;
use crate::pipeline::PipelineError;
use crate::result::DocumentResult;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// SHA-256 hex digest identifying one analysis
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(
        normalized_text: &str,
        language: OutputLanguage,
        model_id: &str,
        prompt_version: &str,
    ) -> Self {
        let mut hasher = Sha256::new();
        for (i, field) in [normalized_text, language.as_str(), model_id, prompt_version]
            .iter()
            .enumerate()
        {
            if i > 0 {
                hasher.update([0x1f]);
            }
            hasher.update(field.as_bytes());
        }
        let digest = hasher.finalize();
        Self(digest.iter().map(|b| format!("{:02x}", b)).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

/// Stored result; never updated once written
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub result: DocumentResult,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: CacheKey, result: DocumentResult) -> Self {
        Self {
            key,
            result,
            created_at: Utc::now(),
        }
    }
}

/// Storage behind the cache
pub trait CacheBackend: Send + Sync {
    fn lookup(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError>;

    /// Insert unless the key exists. Returns whether the entry was written.
    fn insert(&self, entry: CacheEntry) -> Result<bool, CacheError>;
}

type Flight = watch::Receiver<Option<Result<DocumentResult, PipelineError>>>;

struct CacheInner {
    backend: Option<Arc<dyn CacheBackend>>,
    in_flight: DashMap<CacheKey, Flight>,
}

/// Shared handle; clones refer to the same cache
#[derive(Clone)]
pub struct AnalysisCache {
    inner: Arc<CacheInner>,
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl AnalysisCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self::build(Some(backend))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCacheBackend::new()))
    }

    /// Cache that stores nothing but still deduplicates concurrent work
    pub fn disabled() -> Self {
        Self::build(None)
    }

    fn build(backend: Option<Arc<dyn CacheBackend>>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                backend,
                in_flight: DashMap::new(),
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.backend.is_some()
    }

    /// Number of computations currently running
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.len()
    }

    /// Stored result for `key`. Backend failures are logged and read as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<DocumentResult> {
        let backend = self.inner.backend.as_ref()?;
        match backend.lookup(key) {
            Ok(Some(entry)) => {
                info!(key = %key, "cache hit");
                Some(entry.result)
            }
            Ok(None) => {
                debug!(key = %key, "cache miss");
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "cache bypassed");
                None
            }
        }
    }

    /// Store `result` unless the key already has an entry
    pub fn put(&self, key: &CacheKey, result: &DocumentResult) -> bool {
        let Some(backend) = self.inner.backend.as_ref() else {
            return false;
        };
        match backend.insert(CacheEntry::new(key.clone(), result.clone())) {
            Ok(written) => {
                debug!(key = %key, written, "cache put");
                written
            }
            Err(e) => {
                warn!(key = %key, error = %e, "cache write skipped");
                false
            }
        }
    }

    /// Return the cached result for `key`, or run `compute` once for all
    /// concurrent callers of the same key.
    ///
    /// `compute` is only invoked by the caller that starts the flight. Its
    /// result is stored when cacheable; errors are shared with waiting
    /// callers but never stored.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &CacheKey,
        compute: F,
    ) -> Result<DocumentResult, PipelineError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<DocumentResult, PipelineError>> + Send + 'static,
    {
        let flight = match self.inner.in_flight.entry(key.clone()) {
            Entry::Occupied(occupied) => {
                debug!(key = %key, "joining in-flight analysis");
                occupied.get().clone()
            }
            Entry::Vacant(vacant) => {
                // a flight may have finished between the caller's lookup and now
                if let Some(result) = self.get(key) {
                    return Ok(result);
                }
                let (tx, rx) = watch::channel(None);
                vacant.insert(rx.clone());

                let cache = self.clone();
                let key = key.clone();
                let work = compute();
                tokio::spawn(async move {
                    let result = match tokio::spawn(work).await {
                        Ok(result) => result,
                        Err(e) => {
                            warn!(key = %key, error = %e, "analysis task failed");
                            Err(PipelineError::Internal(format!("analysis task failed: {}", e)))
                        }
                    };
                    if let Ok(done) = &result {
                        if done.is_cacheable() {
                            cache.put(&key, done);
                        } else {
                            info!(key = %key, "degraded result not cached");
                        }
                    }
                    cache.inner.in_flight.remove(&key);
                    let _ = tx.send(Some(result));
                });
                rx
            }
        };
        Self::wait(flight).await
    }

    async fn wait(mut flight: Flight) -> Result<DocumentResult, PipelineError> {
        let outcome = match flight.wait_for(Option::is_some).await {
            Ok(done) => done
                .clone()
                .unwrap_or_else(|| Err(PipelineError::Internal("empty flight".to_string()))),
            Err(_) => Err(PipelineError::Internal(
                "analysis task ended without a result".to_string(),
            )),
        };
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::causal::CausalGraph;
    use crate::document::{DetectedLanguage, Domain};
    use crate::result::{ResultStatus, SectionStatus};
    use crate::terms::Glossary;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn result(summary: &str, llm: SectionStatus) -> DocumentResult {
        DocumentResult {
            language: OutputLanguage::Ko,
            detected_language: DetectedLanguage::Ko,
            domain: Domain::Nda,
            parties: Vec::new(),
            clauses: Vec::new(),
            overall_summary: Some(summary.to_string()),
            one_line_summary: None,
            risk_score: Some(10),
            risk_level: None,
            key_points: Vec::new(),
            recommended_actions: Vec::new(),
            term_glossary: Glossary::new(),
            causal_graph: CausalGraph::default(),
            status: ResultStatus {
                terms: SectionStatus::Resolved,
                llm,
                graph: SectionStatus::Resolved,
            },
            warnings: Vec::new(),
        }
    }

    fn key() -> CacheKey {
        CacheKey::new("본문", OutputLanguage::Ko, "mock-model", "v1")
    }

    struct BrokenBackend;

    impl CacheBackend for BrokenBackend {
        fn lookup(&self, _key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
            Err(CacheError::Unavailable("disk gone".into()))
        }

        fn insert(&self, _entry: CacheEntry) -> Result<bool, CacheError> {
            Err(CacheError::Unavailable("disk gone".into()))
        }
    }

    #[test]
    fn key_depends_on_every_field() {
        let base = key();
        assert_eq!(base, key());
        assert_eq!(base.as_str().len(), 64);
        assert_ne!(base, CacheKey::new("본문", OutputLanguage::En, "mock-model", "v1"));
        assert_ne!(base, CacheKey::new("본문", OutputLanguage::Ko, "other", "v1"));
        assert_ne!(base, CacheKey::new("본문", OutputLanguage::Ko, "mock-model", "v2"));
        // the separator keeps field boundaries distinct
        assert_ne!(
            CacheKey::new("ab", OutputLanguage::Ko, "c", "v1"),
            CacheKey::new("a", OutputLanguage::Ko, "bc", "v1")
        );
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_computation() {
        let cache = AnalysisCache::in_memory();
        let runs = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let runs = Arc::clone(&runs);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute(&key(), move || async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(result("공유", SectionStatus::Resolved))
                    })
                    .await
            }));
        }
        for handle in handles {
            let shared = handle.await.unwrap().unwrap();
            assert_eq!(shared.overall_summary.as_deref(), Some("공유"));
        }

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(cache.in_flight(), 0);
        assert!(cache.get(&key()).is_some());
    }

    #[tokio::test]
    async fn put_is_insert_once() {
        let cache = AnalysisCache::in_memory();
        assert!(cache.put(&key(), &result("first", SectionStatus::Resolved)));
        assert!(!cache.put(&key(), &result("second", SectionStatus::Resolved)));
        let stored = cache.get(&key()).unwrap();
        assert_eq!(stored.overall_summary.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn failed_results_and_errors_are_not_stored() {
        let cache = AnalysisCache::in_memory();

        let degraded = cache
            .get_or_compute(&key(), || async { Ok(result("x", SectionStatus::LlmFailed)) })
            .await
            .unwrap();
        assert_eq!(degraded.status.llm, SectionStatus::LlmFailed);
        assert!(cache.get(&key()).is_none());

        let err = cache
            .get_or_compute(&key(), || async { Err(PipelineError::EmptyDocument) })
            .await
            .unwrap_err();
        assert_eq!(err, PipelineError::EmptyDocument);
        assert!(cache.get(&key()).is_none());
    }

    #[tokio::test]
    async fn cancelled_caller_does_not_cancel_the_flight() {
        let cache = AnalysisCache::in_memory();
        let first = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_compute(&key(), || async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(result("끝까지", SectionStatus::Resolved))
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        first.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        let stored = cache.get(&key()).unwrap();
        assert_eq!(stored.overall_summary.as_deref(), Some("끝까지"));
    }

    #[tokio::test]
    async fn panicked_computation_releases_the_key() {
        let cache = AnalysisCache::in_memory();
        let err = cache
            .get_or_compute(&key(), || async { panic!("analysis blew up") })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Internal(_)));
        assert_eq!(cache.in_flight(), 0);

        let recovered = cache
            .get_or_compute(&key(), || async { Ok(result("재시도", SectionStatus::Resolved)) })
            .await
            .unwrap();
        assert_eq!(recovered.overall_summary.as_deref(), Some("재시도"));
        assert!(cache.get(&key()).is_some());
    }

    #[tokio::test]
    async fn broken_backend_is_bypassed() {
        let cache = AnalysisCache::new(Arc::new(BrokenBackend));
        assert!(cache.get(&key()).is_none());
        let computed = cache
            .get_or_compute(&key(), || async { Ok(result("계산", SectionStatus::Resolved)) })
            .await
            .unwrap();
        assert_eq!(computed.overall_summary.as_deref(), Some("계산"));
    }

    #[tokio::test]
    async fn disabled_cache_always_computes() {
        let cache = AnalysisCache::disabled();
        assert!(!cache.is_enabled());
        for _ in 0..2 {
            cache
                .get_or_compute(&key(), || async { Ok(result("매번", SectionStatus::Resolved)) })
                .await
                .unwrap();
        }
        assert!(cache.get(&key()).is_none());
    }
}

//! Scripted term provider

use super::{ProviderDefinition, TermLookupError, TermProvider};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock provider for testing and offline runs.
///
/// Unscripted terms are not found.
#[derive(Default)]
pub struct MockTermProvider {
    responses: HashMap<String, Result<ProviderDefinition, TermLookupError>>,
    delays: HashMap<String, Duration>,
    default_delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockTermProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition for a term.
    pub fn with_definition(mut self, term: impl Into<String>, definition: ProviderDefinition) -> Self {
        self.responses.insert(term.into(), Ok(definition));
        self
    }

    /// Register a failure for a term.
    pub fn with_failure(mut self, term: impl Into<String>, error: TermLookupError) -> Self {
        self.responses.insert(term.into(), Err(error));
        self
    }

    /// Delay the answer for one term.
    pub fn with_delay(mut self, term: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(term.into(), delay);
        self
    }

    /// Delay every answer without a term-specific delay.
    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of lookups observed running at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

/// Counts a lookup as in flight until dropped, including on cancellation
struct InFlightGuard<'a> {
    in_flight: &'a AtomicUsize,
}

impl<'a> InFlightGuard<'a> {
    fn enter(in_flight: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self { in_flight }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TermProvider for MockTermProvider {
    async fn lookup(&self, term: &str) -> Result<Option<ProviderDefinition>, TermLookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlightGuard::enter(&self.in_flight, &self.peak_in_flight);

        if let Some(delay) = self.delays.get(term).copied().or(self.default_delay) {
            tokio::time::sleep(delay).await;
        }

        match self.responses.get(term) {
            Some(Ok(definition)) => Ok(Some(definition.clone())),
            Some(Err(error)) => Err(error.clone()),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn timed_out_lookup_leaves_flight() {
        let provider = MockTermProvider::new().with_default_delay(Duration::from_secs(5));
        let outcome =
            tokio::time::timeout(Duration::from_millis(10), provider.lookup("보증금")).await;
        assert!(outcome.is_err());
        assert_eq!(provider.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn peak_is_not_inflated_by_cancelled_lookups() {
        let provider = Arc::new(
            MockTermProvider::new()
                .with_delay("느림", Duration::from_secs(5))
                .with_delay("빠름", Duration::from_millis(20)),
        );
        for _ in 0..3 {
            let _ = tokio::time::timeout(Duration::from_millis(5), provider.lookup("느림")).await;
        }

        let a = provider.clone();
        let b = provider.clone();
        let _ = tokio::join!(a.lookup("빠름"), b.lookup("빠름"));
        assert_eq!(provider.peak_in_flight(), 2);
        assert_eq!(provider.calls(), 5);
    }
}

//! Scripted LLM client

use super::{LlmClient, LlmError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Mock client for testing and offline runs.
///
/// Replies are chosen in this order: the first rule whose needle occurs in
/// the prompt, then the next queued reply, then the default reply. With none
/// of these the call fails with a transport error.
pub struct MockLlmClient {
    model: String,
    rules: Vec<(String, Result<String, LlmError>)>,
    queue: Mutex<VecDeque<Result<String, LlmError>>>,
    default_reply: Option<Result<String, LlmError>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            rules: Vec::new(),
            queue: Mutex::new(VecDeque::new()),
            default_reply: None,
            delay: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Queue a reply for the next unmatched call.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.push(Ok(reply.into()))
    }

    /// Queue a failure for the next unmatched call.
    pub fn with_failure(self, error: LlmError) -> Self {
        self.push(Err(error))
    }

    /// Answer every prompt containing `needle` with `reply`.
    pub fn with_rule(mut self, needle: impl Into<String>, reply: Result<String, LlmError>) -> Self {
        self.rules.push((needle.into(), reply));
        self
    }

    /// Reply used once the queue is empty.
    pub fn with_default_reply(mut self, reply: impl Into<String>) -> Self {
        self.default_reply = Some(Ok(reply.into()));
        self
    }

    /// Failure used once the queue is empty.
    pub fn with_default_failure(mut self, error: LlmError) -> Self {
        self.default_reply = Some(Err(error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push(self, reply: Result<String, LlmError>) -> Self {
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(reply);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(prompt.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some((_, reply)) = self.rules.iter().find(|(needle, _)| prompt.contains(needle)) {
            return reply.clone();
        }
        let queued = self
            .queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        queued
            .or_else(|| self.default_reply.clone())
            .unwrap_or_else(|| Err(LlmError::Transport("mock has no scripted reply".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queue_then_default() {
        let client = MockLlmClient::new()
            .with_reply("first")
            .with_failure(LlmError::RateLimited)
            .with_default_reply("again");

        assert_eq!(client.complete("p").await.unwrap(), "first");
        assert_eq!(client.complete("p").await.unwrap_err(), LlmError::RateLimited);
        assert_eq!(client.complete("p").await.unwrap(), "again");
        assert_eq!(client.complete("p").await.unwrap(), "again");
        assert_eq!(client.calls(), 4);
    }

    #[tokio::test]
    async fn rules_match_prompt_content() {
        let client = MockLlmClient::new()
            .with_rule("part 2", Ok("second".into()))
            .with_default_reply("other");
        assert_eq!(client.complete("this is part 2 of 2").await.unwrap(), "second");
        assert_eq!(client.complete("part 1").await.unwrap(), "other");
        assert_eq!(client.prompts().len(), 2);
    }

    #[tokio::test]
    async fn unscripted_calls_fail_transiently() {
        let err = MockLlmClient::new().complete("p").await.unwrap_err();
        assert!(err.is_retryable());
    }
}

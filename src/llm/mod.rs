//! LLM analysis: prompt construction, provider calls, output repair
//!
//! Two implementations of [`LlmClient`]:
//! - `GeminiClient`: Google Generative Language REST API (production)
//! - `MockLlmClient`: scripted replies (testing, offline runs)
//!
//! [`LlmOrchestrator`] splits a document into clause batches, queries the
//! client with retries, repairs malformed JSON through [`RepairMachine`] and
//! merges the batch answers into one [`AnalysisDraft`].

mod gemini;
mod mock;
mod orchestrator;
mod prompt;
mod repair;
mod schema;

pub use gemini::GeminiClient;
pub use mock::MockLlmClient;
pub use orchestrator::{AnalysisDraft, LlmOrchestrator};
pub use prompt::{build_prompt, response_schema, PromptContext};
pub use repair::{RepairMachine, RepairOutcome, RepairState, RepairStrategy, REPAIR_SEQUENCE};
pub use schema::{ClauseReply, LlmAnalysis, RelationReply, RiskReply};

use async_trait::async_trait;

/// Errors from an LLM provider call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    #[error("request timed out")]
    Timeout,
    #[error("rate limited by provider")]
    RateLimited,
    #[error("provider returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl LlmError {
    /// Transient failures worth retrying; the rest are permanent
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::RateLimited | Self::Server { .. } | Self::Transport(_)
        )
    }
}

/// A text-completion service that answers a prompt with (ideally) JSON.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Model identifier; part of the cache key
    fn model_id(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(LlmError::Timeout.is_retryable());
        assert!(LlmError::RateLimited.is_retryable());
        assert!(LlmError::Server {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(LlmError::Transport("reset".into()).is_retryable());
        assert!(!LlmError::Unauthorized("bad key".into()).is_retryable());
        assert!(!LlmError::BadRequest("too long".into()).is_retryable());
    }
}

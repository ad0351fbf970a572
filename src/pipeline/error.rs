//! Pipeline errors

use crate::llm::LlmError;
use crate::nlp::PreprocessError;
use thiserror::Error;

/// Hard failures of [`Pipeline::analyze`](super::Pipeline::analyze).
///
/// Everything else degrades into status fields and warnings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("document has no analyzable text")]
    EmptyDocument,

    #[error("LLM provider failed: {0}")]
    LlmProvider(#[from] LlmError),

    #[error("pipeline is missing its {0}")]
    MissingComponent(&'static str),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<PreprocessError> for PipelineError {
    fn from(err: PreprocessError) -> Self {
        match err {
            PreprocessError::EmptyText => Self::EmptyDocument,
        }
    }
}

//! clausewise: clause-level analysis of legal documents
//!
//! Raw contract text goes through a fixed pipeline:
//!
//! - **Preprocessing** ([`nlp`]): normalization, clause segmentation,
//!   language and domain detection, party and term extraction
//! - **Term resolution** ([`terms`]): concurrent dictionary lookups with
//!   per-term fallback
//! - **LLM analysis** ([`llm`]): batched prompts, JSON repair, retries
//! - **Causal graph** ([`causal`]): validated clause/risk relations
//!
//! Results are cached by content ([`cache`]) and can be persisted
//! ([`storage`]).
//!
//! # Example
//!
//! ```no_run
//! use clausewise::{MockLlmClient, MockTermProvider, OutputLanguage, Pipeline};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), clausewise::PipelineError> {
//! let pipeline = Pipeline::builder()
//!     .term_provider(Arc::new(MockTermProvider::new()))
//!     .llm_client(Arc::new(MockLlmClient::new().with_default_reply("{}")))
//!     .build()?;
//! let result = pipeline
//!     .analyze("제1조 (목적) 본 계약은 ...", OutputLanguage::Ko)
//!     .await?;
//! println!("{:?}", result.status);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod causal;
pub mod config;
pub mod document;
pub mod llm;
pub mod nlp;
pub mod pipeline;
pub mod result;
pub mod storage;
pub mod terms;

pub use cache::{AnalysisCache, CacheBackend, CacheEntry, CacheError, CacheKey, MemoryCacheBackend};
pub use causal::{CausalGraph, CausalGraphBuilder, DeclaredRelation, GraphEdge, GraphNode, GraphWarning, NodeKind};
pub use config::{ConfigError, PipelineConfig};
pub use document::{
    Clause, DetectedLanguage, Document, Domain, OutputLanguage, Party, PartyRole, TermCandidate,
};
pub use llm::{GeminiClient, LlmClient, LlmError, LlmOrchestrator, MockLlmClient};
pub use nlp::{PreprocessError, Preprocessor};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineError};
pub use result::{ClauseAnalysis, DocumentResult, ResultStatus, RiskLevel, SectionStatus};
pub use storage::{
    DocumentId, DocumentSummary, OpenStore, ResultStore, SqliteStore, StorageError, StorageResult,
    StoredDocument,
};
pub use terms::{
    Glossary, MockTermProvider, MolegClient, TermDefinition, TermLookupError, TermProvider,
    TermResolver, TermStatus,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

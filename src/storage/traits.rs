//! Storage trait definitions

use crate::result::DocumentResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Identifier of a saved analysis
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of [`ResultStore::list`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub language: String,
    pub domain: String,
    pub risk_score: Option<u8>,
    pub risk_level: Option<String>,
}

/// A saved analysis with its metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub result: DocumentResult,
}

/// Persistence for finished analyses
pub trait ResultStore: Send + Sync {
    /// Save a result under a new id. `None` titles fall back to
    /// [`DocumentResult::title`].
    fn save(&self, result: &DocumentResult, title: Option<&str>) -> StorageResult<DocumentId>;

    fn get(&self, id: &DocumentId) -> StorageResult<Option<StoredDocument>>;

    /// Newest first
    fn list(&self) -> StorageResult<Vec<DocumentSummary>>;

    /// Returns true if the document existed
    fn delete(&self, id: &DocumentId) -> StorageResult<bool>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (for testing)
    fn open_in_memory() -> StorageResult<Self>;
}

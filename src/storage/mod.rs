//! Persistence for analysis results
//!
//! `SqliteStore` implements both the [`ResultStore`] trait and the
//! cache's [`CacheBackend`](crate::cache::CacheBackend), so saved
//! documents and cached analyses can share one database file.

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{
    DocumentId, DocumentSummary, OpenStore, ResultStore, StorageError, StorageResult,
    StoredDocument,
};

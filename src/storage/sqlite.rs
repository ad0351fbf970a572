//! SQLite storage backend

use super::traits::{
    DocumentId, DocumentSummary, OpenStore, ResultStore, StorageError, StorageResult,
    StoredDocument,
};
use crate::cache::{CacheBackend, CacheEntry, CacheError, CacheKey};
use crate::result::DocumentResult;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// SQLite-backed result store and cache backend
///
/// Documents are stored whole as JSON, with clauses and glossary terms
/// mirrored into their own tables for querying. Thread-safe via internal
/// mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                title TEXT,
                created_at TEXT NOT NULL,
                language TEXT NOT NULL,
                domain TEXT NOT NULL,
                risk_score INTEGER,
                risk_level TEXT,
                result_json TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS clauses (
                document_id TEXT NOT NULL,
                idx INTEGER NOT NULL,
                heading TEXT,
                summary TEXT,
                risk_level TEXT,
                PRIMARY KEY (document_id, idx),
                FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS terms (
                document_id TEXT NOT NULL,
                term TEXT NOT NULL,
                ko TEXT,
                en TEXT,
                status TEXT NOT NULL,
                PRIMARY KEY (document_id, term),
                FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
            );

            -- Immutable analysis cache
            CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY,
                result_json TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_created
                ON documents(created_at);

            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // a panic mid-statement leaves no partial state in SQLite itself
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn parse_time(raw: &str) -> StorageResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| StorageError::DateParse(e.to_string()))
    }

    fn score_from_row(score: Option<i64>) -> Option<u8> {
        score.and_then(|s| u8::try_from(s).ok())
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl ResultStore for SqliteStore {
    fn save(&self, result: &DocumentResult, title: Option<&str>) -> StorageResult<DocumentId> {
        let id = DocumentId::new();
        let title = title.map(str::to_string).or_else(|| result.title());
        let result_json = serde_json::to_string(result)?;

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO documents (id, title, created_at, language, domain, risk_score, risk_level, result_json)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                id.as_str(),
                title,
                Utc::now().to_rfc3339(),
                result.language.as_str(),
                result.domain.as_str(),
                result.risk_score.map(i64::from),
                result.risk_level.map(|l| l.as_str()),
                result_json,
            ],
        )?;

        for clause in &result.clauses {
            tx.execute(
                r#"
                INSERT INTO clauses (document_id, idx, heading, summary, risk_level)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    id.as_str(),
                    clause.index as i64,
                    clause.heading,
                    clause.summary,
                    clause.risk_level.map(|l| l.as_str()),
                ],
            )?;
        }

        for definition in result.term_glossary.values() {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO terms (document_id, term, ko, en, status)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    id.as_str(),
                    definition.term,
                    definition.ko,
                    definition.en,
                    definition.status.as_str(),
                ],
            )?;
        }
        tx.commit()?;

        debug!(id = %id, clauses = result.clauses.len(), "document saved");
        Ok(id)
    }

    fn get(&self, id: &DocumentId) -> StorageResult<Option<StoredDocument>> {
        let conn = self.conn();
        let row = conn
            .query_row(
                "SELECT title, created_at, result_json FROM documents WHERE id = ?1",
                params![id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((title, created_at, result_json)) => Ok(Some(StoredDocument {
                id: id.clone(),
                title,
                created_at: Self::parse_time(&created_at)?,
                result: serde_json::from_str(&result_json)?,
            })),
            None => Ok(None),
        }
    }

    fn list(&self) -> StorageResult<Vec<DocumentSummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT id, title, created_at, language, domain, risk_score, risk_level
            FROM documents
            ORDER BY created_at DESC, rowid DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<i64>>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (id, title, created_at, language, domain, risk_score, risk_level) = row?;
            summaries.push(DocumentSummary {
                id: DocumentId::from_string(id),
                title,
                created_at: Self::parse_time(&created_at)?,
                language,
                domain,
                risk_score: Self::score_from_row(risk_score),
                risk_level,
            });
        }
        Ok(summaries)
    }

    fn delete(&self, id: &DocumentId) -> StorageResult<bool> {
        let conn = self.conn();
        let deleted = conn.execute("DELETE FROM documents WHERE id = ?1", params![id.as_str()])?;
        Ok(deleted > 0)
    }
}

impl CacheBackend for SqliteStore {
    fn lookup(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let unavailable = |e: &dyn std::fmt::Display| CacheError::Unavailable(e.to_string());

        let conn = self.conn();
        let row = conn
            .query_row(
                "SELECT result_json, created_at FROM cache_entries WHERE key = ?1",
                params![key.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .map_err(|e| unavailable(&e))?;

        let Some((result_json, created_at)) = row else {
            return Ok(None);
        };
        Ok(Some(CacheEntry {
            key: key.clone(),
            result: serde_json::from_str(&result_json).map_err(|e| unavailable(&e))?,
            created_at: Self::parse_time(&created_at).map_err(|e| unavailable(&e))?,
        }))
    }

    fn insert(&self, entry: CacheEntry) -> Result<bool, CacheError> {
        let result_json = serde_json::to_string(&entry.result)
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        let conn = self.conn();
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO cache_entries (key, result_json, created_at) VALUES (?1, ?2, ?3)",
                params![entry.key.as_str(), result_json, entry.created_at.to_rfc3339()],
            )
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        Ok(inserted > 0)
    }
}

//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Store trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Store, StorageResult};
use crate::storage::PageRecord;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite storage backend
///
/// Each append is a single `INSERT OR IGNORE`, which SQLite commits
/// atomically. A URL already present keeps its first record.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl Store for SqliteStore {
    fn append(&mut self, record: &PageRecord) -> StorageResult<()> {
        let links = serde_json::to_string(&record.links)?;
        let domain = record.domain().unwrap_or_default();

        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO pages (url, domain, status, title, snippet, links, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.url,
                domain,
                record.status,
                record.title,
                record.snippet,
                links,
                record.fetched_at.to_rfc3339(),
            ],
        )?;

        if inserted == 0 {
            tracing::debug!("Record for {} already stored, keeping the first", record.url);
        }

        Ok(())
    }

    fn count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::PageRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid stored timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Append-only sink for page records
///
/// Implementations must write each record atomically: after a crash a
/// record is either fully present or absent, and records written earlier
/// are never modified.
pub trait Store: Send {
    /// Appends one record
    fn append(&mut self, record: &PageRecord) -> StorageResult<()>;

    /// Number of records currently held by the store
    fn count(&self) -> StorageResult<u64>;
}

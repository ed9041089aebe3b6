//! Storage module for persisting crawl results
//!
//! This module handles writing page records to an append-only store:
//! - line-delimited JSON (one record per line)
//! - a SQLite `pages` table

mod jsonl;
mod schema;
mod sqlite;
mod traits;

pub use jsonl::{read_records, JsonLinesStore};
pub use sqlite::SqliteStore;
pub use traits::{Store, StorageError, StorageResult};

use crate::config::{OutputConfig, OutputFormat};
use crate::url::extract_domain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Result of crawling one page
///
/// Built once per successfully fetched URL and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub status: Option<u16>,
    pub title: Option<String>,
    pub snippet: Option<String>,
    /// Outbound links, deduplicated, in order of first appearance
    pub links: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

impl PageRecord {
    /// Normalized host of the record's URL
    pub fn domain(&self) -> Option<String> {
        ::url::Url::parse(&self.url)
            .ok()
            .and_then(|url| extract_domain(&url))
    }
}

/// Opens the store selected by the output configuration
///
/// Parent directories are created as needed.
pub fn open_store(config: &OutputConfig) -> StorageResult<Box<dyn Store>> {
    let path = Path::new(&config.path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let store: Box<dyn Store> = match config.format {
        OutputFormat::Jsonl => Box::new(JsonLinesStore::open(path)?),
        OutputFormat::Sqlite => Box::new(SqliteStore::open(path)?),
    };

    Ok(store)
}

//! Database schema definitions
//!
//! This module contains the SQL schema for the SQLite page store.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per crawled page; rows are inserted once and never updated
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    domain TEXT NOT NULL,
    status INTEGER,
    title TEXT,
    snippet TEXT,
    links TEXT NOT NULL,
    fetched_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pages_domain ON pages(domain);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

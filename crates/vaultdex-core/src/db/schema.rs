//! Database schema and initialization

use crate::config::ExclusionRules;
use crate::error::Result;
use rusqlite::{params, Connection};
use std::path::Path;

/// Main database handle
pub struct Database {
    pub(crate) conn: Connection,
    pub(crate) exclusions: ExclusionRules,
}

const SCHEMA_VERSION: i32 = 2;

const CREATE_TABLES: &str = r#"
-- One row per indexed file or PDF page (path#page=N)
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    path TEXT NOT NULL UNIQUE,
    file_name TEXT NOT NULL,
    last_modified INTEGER NOT NULL,
    tags TEXT NOT NULL DEFAULT '[]',
    token_count INTEGER NOT NULL DEFAULT 0,
    hash TEXT NOT NULL DEFAULT '',
    indexed_at TEXT NOT NULL
);

-- Postings: one row per (document, source, term, original flag)
CREATE TABLE IF NOT EXISTS terms (
    document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    term TEXT NOT NULL,
    source TEXT NOT NULL,
    is_original INTEGER NOT NULL DEFAULT 0,
    positions TEXT NOT NULL,
    PRIMARY KEY (document_id, source, term, is_original)
);

-- Key/value flags (index built, pending reindex request)
CREATE TABLE IF NOT EXISTS index_state (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_terms_lookup ON terms(term, source, is_original);
CREATE INDEX IF NOT EXISTS idx_terms_document ON terms(document_id);
"#;

impl Database {
    /// Open database at path, creating if necessary
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Ok(Self {
            conn,
            exclusions: ExclusionRules::default(),
        })
    }

    /// Open in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn,
            exclusions: ExclusionRules::default(),
        })
    }

    /// Replace the exclusion rules consulted by `is_excluded` and upserts
    pub fn set_exclusions(&mut self, rules: ExclusionRules) {
        self.exclusions = rules;
    }

    /// Whether a path falls under the exclusion rules
    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclusions.is_excluded(path)
    }

    /// Initialize database schema
    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA cache_size = -64000;
             PRAGMA busy_timeout = 5000;",
        )?;

        self.conn.execute_batch(CREATE_TABLES)?;

        // Run migrations to upgrade existing databases (BEFORE setting version)
        self.migrate()?;

        self.conn.execute(
            "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;

        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> Result<Option<i32>> {
        let version = self
            .conn
            .query_row(
                "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .ok();
        Ok(version)
    }

    /// Run migrations to upgrade schema to current version
    pub fn migrate(&self) -> Result<()> {
        let current = self.schema_version()?.unwrap_or(0);

        if current < 2 {
            self.migrate_to_v2()?;
        }

        Ok(())
    }

    fn migrate_to_v2(&self) -> Result<()> {
        // v1 stores had no content hash, so every file was reindexed
        let has_hash: bool = self
            .conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM pragma_table_info('documents') WHERE name = 'hash'",
                [],
                |row| row.get(0),
            )
            .unwrap_or(false);

        if !has_hash {
            self.conn.execute(
                "ALTER TABLE documents ADD COLUMN hash TEXT NOT NULL DEFAULT ''",
                [],
            )?;
        }

        self.conn.execute(
            "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
            params![2],
        )?;

        Ok(())
    }

    /// Flush planner statistics and close the connection
    pub fn close(self) -> Result<()> {
        self.conn.execute_batch("PRAGMA optimize;")?;
        self.conn.close().map_err(|(_, e)| e)?;
        Ok(())
    }
}

//! Persistent index state flags

use super::Database;
use crate::error::Result;
use rusqlite::{params, OptionalExtension};

const INDEX_BUILT_KEY: &str = "index_built";
const BUILT_AT_KEY: &str = "index_built_at";

impl Database {
    /// Read a state value
    pub fn get_state(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM index_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Write a state value
    pub fn set_state(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO index_state (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Delete a state value. Returns whether it existed.
    pub fn clear_state(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM index_state WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }

    /// Whether a full index build has completed
    pub fn is_index_built(&self) -> Result<bool> {
        Ok(self.get_state(INDEX_BUILT_KEY)?.as_deref() == Some("1"))
    }

    /// Mark the index as built (records the time) or as needing a rebuild
    pub fn set_index_built(&self, built: bool) -> Result<()> {
        if built {
            self.set_state(INDEX_BUILT_KEY, "1")?;
            self.set_state(BUILT_AT_KEY, &chrono::Utc::now().to_rfc3339())?;
        } else {
            self.set_state(INDEX_BUILT_KEY, "0")?;
        }
        Ok(())
    }

    /// When the last full build completed (RFC 3339)
    pub fn index_built_at(&self) -> Result<Option<String>> {
        self.get_state(BUILT_AT_KEY)
    }
}

//! Index statistics

use super::Database;
use crate::error::Result;

/// Index stats
#[derive(Debug, Clone, serde::Serialize)]
pub struct IndexStats {
    pub document_count: usize,
    pub pdf_page_count: usize,
    pub term_count: usize,
    pub distinct_terms: usize,
    pub index_built: bool,
    pub built_at: Option<String>,
}

impl Database {
    /// Get index statistics
    pub fn get_stats(&self) -> Result<IndexStats> {
        let document_count = self.count_documents()?;

        let pdf_page_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE instr(path, '#page=') > 0",
            [],
            |row| row.get(0),
        )?;

        let distinct_terms: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT term) FROM terms WHERE is_original = 0",
            [],
            |row| row.get(0),
        )?;

        Ok(IndexStats {
            document_count,
            pdf_page_count: pdf_page_count as usize,
            term_count: self.count_terms()?,
            distinct_terms: distinct_terms as usize,
            index_built: self.is_index_built()?,
            built_at: self.index_built_at()?,
        })
    }
}

//! Database layer for vaultdex
//!
//! SQLite-backed inverted index:
//! - documents, one row per file or PDF page
//! - term postings with JSON position lists
//! - persistent index state (built flag, pending reindex request)

mod schema;
mod content;
mod documents;
mod terms;
mod state;
mod stats;

pub use schema::Database;
pub use content::hash_content;
pub use documents::{Document, DocumentInsert};
pub use terms::{Posting, Term, TermEntry, TermSource};
pub use stats::IndexStats;

use crate::error::Result;
use std::path::PathBuf;

impl Database {
    /// Get the default database path
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CACHE_DIR_NAME)
            .join("index.sqlite")
    }
}

/// Storage contract used by the indexer and query evaluator.
///
/// `upsert_document` must replace a document's postings atomically.
pub trait DocumentStore {
    fn upsert_document(&self, doc: &DocumentInsert, terms: &[TermEntry]) -> Result<i64>;
    fn get_document(&self, id: i64) -> Result<Option<Document>>;
    fn get_document_by_path(&self, path: &str) -> Result<Option<Document>>;
    fn get_document_hash(&self, path: &str) -> Result<Option<String>>;
    fn list_documents(&self) -> Result<Vec<Document>>;
    fn get_terms_by_document_id(&self, document_id: i64) -> Result<Vec<Term>>;
    fn find_postings(&self, terms: &[String], sources: &[TermSource]) -> Result<Vec<Posting>>;
    fn find_terms_by_source(&self, source: TermSource) -> Result<Vec<(i64, String)>>;
    fn remove_document_by_path(&self, path: &str) -> Result<usize>;
    fn remove_documents_by_prefix(&self, prefix: &str) -> Result<usize>;
    fn move_path(&self, old: &str, new: &str) -> Result<usize>;
    fn is_excluded(&self, path: &str) -> bool;
    fn is_index_built(&self) -> Result<bool>;
    fn set_index_built(&self, built: bool) -> Result<()>;
}

impl DocumentStore for Database {
    fn upsert_document(&self, doc: &DocumentInsert, terms: &[TermEntry]) -> Result<i64> {
        Database::upsert_document(self, doc, terms)
    }

    fn get_document(&self, id: i64) -> Result<Option<Document>> {
        Database::get_document(self, id)
    }

    fn get_document_by_path(&self, path: &str) -> Result<Option<Document>> {
        Database::get_document_by_path(self, path)
    }

    fn get_document_hash(&self, path: &str) -> Result<Option<String>> {
        Database::get_document_hash(self, path)
    }

    fn list_documents(&self) -> Result<Vec<Document>> {
        Database::list_documents(self)
    }

    fn get_terms_by_document_id(&self, document_id: i64) -> Result<Vec<Term>> {
        Database::get_terms_by_document_id(self, document_id)
    }

    fn find_postings(&self, terms: &[String], sources: &[TermSource]) -> Result<Vec<Posting>> {
        Database::find_postings(self, terms, sources)
    }

    fn find_terms_by_source(&self, source: TermSource) -> Result<Vec<(i64, String)>> {
        Database::find_terms_by_source(self, source)
    }

    fn remove_document_by_path(&self, path: &str) -> Result<usize> {
        Database::remove_document_by_path(self, path)
    }

    fn remove_documents_by_prefix(&self, prefix: &str) -> Result<usize> {
        Database::remove_documents_by_prefix(self, prefix)
    }

    fn move_path(&self, old: &str, new: &str) -> Result<usize> {
        Database::move_path(self, old, new)
    }

    fn is_excluded(&self, path: &str) -> bool {
        Database::is_excluded(self, path)
    }

    fn is_index_built(&self) -> Result<bool> {
        Database::is_index_built(self)
    }

    fn set_index_built(&self, built: bool) -> Result<()> {
        Database::set_index_built(self, built)
    }
}

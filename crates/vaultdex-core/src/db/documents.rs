//! Document operations

use super::terms::TermEntry;
use super::Database;
use crate::config::vault_path::{file_name, PAGE_MARKER};
use crate::error::{Result, VaultdexError};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Document record from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub id: i64,
    pub path: String,
    pub file_name: String,
    /// Milliseconds since the Unix epoch
    pub last_modified: i64,
    pub tags: BTreeSet<String>,
    pub token_count: usize,
    pub hash: String,
}

impl Document {
    /// PDF page pseudo-document (`file.pdf#page=N`)
    pub fn is_pdf_page(&self) -> bool {
        self.path.contains(PAGE_MARKER)
    }
}

/// Parameters for writing a document row
#[derive(Debug, Clone)]
pub struct DocumentInsert<'a> {
    pub path: &'a str,
    pub file_name: &'a str,
    pub last_modified: i64,
    pub tags: &'a BTreeSet<String>,
    pub token_count: usize,
    pub hash: &'a str,
}

impl<'a> DocumentInsert<'a> {
    pub fn new(
        path: &'a str,
        last_modified: i64,
        tags: &'a BTreeSet<String>,
        token_count: usize,
        hash: &'a str,
    ) -> Self {
        Self {
            path,
            file_name: file_name(path),
            last_modified,
            tags,
            token_count,
            hash,
        }
    }
}

const DOCUMENT_COLUMNS: &str = "id, path, file_name, last_modified, tags, token_count, hash";

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    let raw_tags: String = row.get(4)?;
    let tags = serde_json::from_str(&raw_tags)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    Ok(Document {
        id: row.get(0)?,
        path: row.get(1)?,
        file_name: row.get(2)?,
        last_modified: row.get(3)?,
        tags,
        token_count: row.get::<_, i64>(5)? as usize,
        hash: row.get(6)?,
    })
}

fn validate_terms(path: &str, terms: &[TermEntry]) -> Result<()> {
    let mut seen = HashSet::with_capacity(terms.len());
    for entry in terms {
        if entry.term.is_empty() {
            return Err(VaultdexError::InvalidInput(format!(
                "empty term for {}",
                path
            )));
        }
        if entry.positions.is_empty() {
            return Err(VaultdexError::InvalidInput(format!(
                "term '{}' for {} has no positions",
                entry.term, path
            )));
        }
        if !seen.insert((entry.term.as_str(), entry.source, entry.is_original)) {
            return Err(VaultdexError::InvalidInput(format!(
                "duplicate {} term '{}' for {}",
                entry.source.as_str(),
                entry.term,
                path
            )));
        }
    }
    Ok(())
}

impl Database {
    /// Write a document and replace all of its postings.
    ///
    /// The old postings are deleted and the new ones inserted in a single
    /// transaction, so readers see either the previous version or the new
    /// one. Returns the document id, which is stable across re-indexing.
    pub fn upsert_document(&self, doc: &DocumentInsert, terms: &[TermEntry]) -> Result<i64> {
        if self.exclusions.is_excluded(doc.path) {
            return Err(VaultdexError::Excluded(doc.path.to_string()));
        }
        validate_terms(doc.path, terms)?;

        let tags = serde_json::to_string(doc.tags)?;
        let now = chrono::Utc::now().to_rfc3339();

        let tx = self.conn.unchecked_transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM documents WHERE path = ?1",
                params![doc.path],
                |row| row.get(0),
            )
            .optional()?;

        let id = match existing {
            Some(id) => {
                tx.execute("DELETE FROM terms WHERE document_id = ?1", params![id])?;
                tx.execute(
                    "UPDATE documents
                     SET file_name = ?2, last_modified = ?3, tags = ?4, token_count = ?5,
                         hash = ?6, indexed_at = ?7
                     WHERE id = ?1",
                    params![
                        id,
                        doc.file_name,
                        doc.last_modified,
                        tags,
                        doc.token_count as i64,
                        doc.hash,
                        now
                    ],
                )?;
                id
            }
            None => {
                tx.execute(
                    "INSERT INTO documents (path, file_name, last_modified, tags, token_count, hash, indexed_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        doc.path,
                        doc.file_name,
                        doc.last_modified,
                        tags,
                        doc.token_count as i64,
                        doc.hash,
                        now
                    ],
                )?;
                tx.last_insert_rowid()
            }
        };

        {
            let mut stmt = tx.prepare(
                "INSERT INTO terms (document_id, term, source, is_original, positions)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for entry in terms {
                let mut positions = entry.positions.clone();
                positions.sort_unstable();
                positions.dedup();
                let positions = serde_json::to_string(&positions)?;
                stmt.execute(params![id, entry.term, entry.source, entry.is_original, positions])?;
            }
        }

        tx.commit()?;
        Ok(id)
    }

    /// Get document by id
    pub fn get_document(&self, id: i64) -> Result<Option<Document>> {
        let doc = self
            .conn
            .query_row(
                &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1"),
                params![id],
                document_from_row,
            )
            .optional()?;
        Ok(doc)
    }

    /// Get document by vault-relative path
    pub fn get_document_by_path(&self, path: &str) -> Result<Option<Document>> {
        let doc = self
            .conn
            .query_row(
                &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE path = ?1"),
                params![path],
                document_from_row,
            )
            .optional()?;
        Ok(doc)
    }

    /// All documents ordered by path
    pub fn list_documents(&self) -> Result<Vec<Document>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY path"))?;
        let docs = stmt
            .query_map([], document_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(docs)
    }

    /// Stored content hash for a path, if indexed
    pub fn get_document_hash(&self, path: &str) -> Result<Option<String>> {
        let hash = self
            .conn
            .query_row(
                "SELECT hash FROM documents WHERE path = ?1",
                params![path],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }

    /// Remove a document together with its PDF page pseudo-documents.
    /// Returns the number of documents removed.
    pub fn remove_document_by_path(&self, path: &str) -> Result<usize> {
        let pages_prefix = format!("{path}{PAGE_MARKER}");

        let tx = self.conn.unchecked_transaction()?;
        let filter = "path = ?1 OR substr(path, 1, length(?2)) = ?2";
        tx.execute(
            &format!("DELETE FROM terms WHERE document_id IN (SELECT id FROM documents WHERE {filter})"),
            params![path, pages_prefix],
        )?;
        let removed = tx.execute(
            &format!("DELETE FROM documents WHERE {filter}"),
            params![path, pages_prefix],
        )?;
        tx.commit()?;
        Ok(removed)
    }

    /// Remove every document under a folder prefix (used for folder
    /// deletes and moves). Returns the number of documents removed.
    pub fn remove_documents_by_prefix(&self, prefix: &str) -> Result<usize> {
        let prefix = prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return Err(VaultdexError::InvalidInput(
                "refusing to remove documents for an empty prefix".to_string(),
            ));
        }
        let folder = format!("{prefix}/");

        let tx = self.conn.unchecked_transaction()?;
        let filter = "substr(path, 1, length(?1)) = ?1";
        tx.execute(
            &format!("DELETE FROM terms WHERE document_id IN (SELECT id FROM documents WHERE {filter})"),
            params![folder],
        )?;
        let removed = tx.execute(&format!("DELETE FROM documents WHERE {filter}"), params![folder])?;
        tx.commit()?;
        Ok(removed)
    }

    /// Rewrite paths for a renamed file or folder, keeping document ids and
    /// postings. PDF pages and folder contents move along. Anything already
    /// stored at the destination is replaced. Returns the number of
    /// documents moved.
    pub fn move_path(&self, old: &str, new: &str) -> Result<usize> {
        let old = old.trim_end_matches('/');
        let new = new.trim_end_matches('/');
        if old.is_empty() || new.is_empty() {
            return Err(VaultdexError::InvalidInput(
                "cannot move to or from the vault root".to_string(),
            ));
        }
        if old == new {
            return Ok(0);
        }

        let filter = "path = ?1 OR substr(path, 1, length(?2)) = ?2 OR substr(path, 1, length(?3)) = ?3";
        let new_pages = format!("{new}{PAGE_MARKER}");
        let new_folder = format!("{new}/");
        let old_pages = format!("{old}{PAGE_MARKER}");
        let old_folder = format!("{old}/");

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            &format!("DELETE FROM terms WHERE document_id IN (SELECT id FROM documents WHERE {filter})"),
            params![new, new_pages, new_folder],
        )?;
        tx.execute(
            &format!("DELETE FROM documents WHERE {filter}"),
            params![new, new_pages, new_folder],
        )?;
        let moved = tx.execute(
            &format!("UPDATE documents SET path = ?4 || substr(path, length(?1) + 1) WHERE {filter}"),
            params![old, old_pages, old_folder, new],
        )?;
        tx.execute(
            "UPDATE documents SET file_name = ?3 WHERE path = ?1 OR substr(path, 1, length(?2)) = ?2",
            params![new, new_pages, file_name(new)],
        )?;
        tx.commit()?;
        Ok(moved)
    }

    /// Drop every document and posting
    pub fn clear(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM terms", [])?;
        tx.execute("DELETE FROM documents", [])?;
        tx.commit()?;
        Ok(())
    }

    /// Number of indexed documents (files and PDF pages)
    pub fn count_documents(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExclusionRules;
    use crate::db::TermSource;

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    fn tags(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn content(term: &str, positions: Vec<i64>) -> TermEntry {
        TermEntry::new(term, TermSource::Content, positions)
    }

    #[test]
    fn test_upsert_and_get() {
        let db = setup();
        let t = tags(&["rust", "notes"]);
        let doc = DocumentInsert::new("dir/Note.md", 1_700_000_000_000, &t, 3, "abc");
        let id = db
            .upsert_document(&doc, &[content("walk", vec![0, 2]), content("park", vec![1])])
            .unwrap();

        let stored = db.get_document(id).unwrap().unwrap();
        assert_eq!(stored.path, "dir/Note.md");
        assert_eq!(stored.file_name, "Note.md");
        assert_eq!(stored.tags, t);
        assert_eq!(stored.token_count, 3);
        assert_eq!(stored.hash, "abc");
        assert!(!stored.is_pdf_page());

        assert_eq!(db.get_document_by_path("dir/Note.md").unwrap(), Some(stored));
        assert_eq!(db.get_document_hash("dir/Note.md").unwrap().as_deref(), Some("abc"));
        assert!(db.get_document_by_path("missing.md").unwrap().is_none());
    }

    #[test]
    fn test_reindex_replaces_all_postings() {
        let db = setup();
        let t = BTreeSet::new();
        let first = DocumentInsert::new("a.md", 1, &t, 2, "v1");
        let id = db
            .upsert_document(&first, &[content("old", vec![0]), content("shared", vec![1])])
            .unwrap();

        let second = DocumentInsert::new("a.md", 2, &t, 1, "v2");
        let id2 = db.upsert_document(&second, &[content("new", vec![0])]).unwrap();
        assert_eq!(id, id2, "document identity is the path");

        let terms: Vec<String> = db
            .get_terms_by_document_id(id)
            .unwrap()
            .into_iter()
            .map(|t| t.term)
            .collect();
        assert_eq!(terms, vec!["new".to_string()]);
        assert_eq!(db.count_documents().unwrap(), 1);
    }

    #[test]
    fn test_failed_upsert_keeps_previous_postings() {
        let db = setup();
        let t = BTreeSet::new();
        let doc = DocumentInsert::new("a.md", 1, &t, 1, "v1");
        let id = db.upsert_document(&doc, &[content("old", vec![0])]).unwrap();

        db.conn
            .execute_batch(
                "CREATE TRIGGER fail_boom BEFORE INSERT ON terms
                 WHEN NEW.term = 'boom'
                 BEGIN SELECT RAISE(ABORT, 'boom'); END;",
            )
            .unwrap();

        let doc = DocumentInsert::new("a.md", 2, &t, 2, "v2");
        let result = db.upsert_document(&doc, &[content("fresh", vec![0]), content("boom", vec![1])]);
        assert!(matches!(result, Err(VaultdexError::Database(_))));

        let terms = db.get_terms_by_document_id(id).unwrap();
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].term, "old");
        assert_eq!(db.get_document_hash("a.md").unwrap().as_deref(), Some("v1"));
    }

    #[test]
    fn test_invalid_terms_rejected_before_write() {
        let db = setup();
        let t = BTreeSet::new();
        let doc = DocumentInsert::new("a.md", 1, &t, 1, "h");

        let empty_positions = db.upsert_document(&doc, &[content("x", vec![])]);
        assert!(matches!(empty_positions, Err(VaultdexError::InvalidInput(_))));

        let duplicate = db.upsert_document(&doc, &[content("x", vec![0]), content("x", vec![1])]);
        assert!(matches!(duplicate, Err(VaultdexError::InvalidInput(_))));

        assert_eq!(db.count_documents().unwrap(), 0);
    }

    #[test]
    fn test_stem_and_original_can_share_text() {
        let db = setup();
        let t = BTreeSet::new();
        let doc = DocumentInsert::new("a.md", 1, &t, 1, "h");
        let id = db
            .upsert_document(
                &doc,
                &[
                    content("walk", vec![0]),
                    TermEntry::original("walk", TermSource::Content, vec![0]),
                ],
            )
            .unwrap();
        assert_eq!(db.get_terms_by_document_id(id).unwrap().len(), 2);
    }

    #[test]
    fn test_excluded_path_rejected() {
        let mut db = setup();
        db.set_exclusions(ExclusionRules::new(&["private".to_string()], &[]).unwrap());
        let t = BTreeSet::new();
        let doc = DocumentInsert::new("private/a.md", 1, &t, 1, "h");
        let result = db.upsert_document(&doc, &[content("x", vec![0])]);
        assert!(matches!(result, Err(VaultdexError::Excluded(_))));
        assert_eq!(db.count_documents().unwrap(), 0);
    }

    #[test]
    fn test_remove_by_path_includes_pdf_pages() {
        let db = setup();
        let t = BTreeSet::new();
        for path in ["scan.pdf", "scan.pdf#page=1", "scan.pdf#page=12", "scan.pdfx.md"] {
            let doc = DocumentInsert::new(path, 1, &t, 1, "h");
            db.upsert_document(&doc, &[content("x", vec![0])]).unwrap();
        }

        assert_eq!(db.remove_document_by_path("scan.pdf").unwrap(), 3);
        let remaining: Vec<String> = db.list_documents().unwrap().into_iter().map(|d| d.path).collect();
        assert_eq!(remaining, vec!["scan.pdfx.md".to_string()]);
        assert_eq!(db.count_terms().unwrap(), 1);
    }

    #[test]
    fn test_remove_by_prefix() {
        let db = setup();
        let t = BTreeSet::new();
        for path in ["notes/a.md", "notes/sub/b.md", "notesx/c.md", "d.md"] {
            let doc = DocumentInsert::new(path, 1, &t, 1, "h");
            db.upsert_document(&doc, &[content("x", vec![0])]).unwrap();
        }

        assert_eq!(db.remove_documents_by_prefix("notes/").unwrap(), 2);
        let remaining: Vec<String> = db.list_documents().unwrap().into_iter().map(|d| d.path).collect();
        assert_eq!(remaining, vec!["d.md".to_string(), "notesx/c.md".to_string()]);
        assert!(db.remove_documents_by_prefix("").is_err());
    }

    #[test]
    fn test_move_file_keeps_id_and_pages() {
        let db = setup();
        let t = BTreeSet::new();
        let mut ids = Vec::new();
        for path in ["old.pdf", "old.pdf#page=1", "new.pdf"] {
            let doc = DocumentInsert::new(path, 1, &t, 1, "h");
            ids.push(db.upsert_document(&doc, &[content("x", vec![0])]).unwrap());
        }

        assert_eq!(db.move_path("old.pdf", "new.pdf").unwrap(), 2);
        let moved = db.get_document_by_path("new.pdf").unwrap().unwrap();
        assert_eq!(moved.id, ids[0]);
        assert_eq!(moved.file_name, "new.pdf");
        let page = db.get_document_by_path("new.pdf#page=1").unwrap().unwrap();
        assert_eq!(page.file_name, "new.pdf");
        assert_eq!(db.count_documents().unwrap(), 2);
        assert_eq!(db.count_terms().unwrap(), 2);
    }

    #[test]
    fn test_move_folder() {
        let db = setup();
        let t = BTreeSet::new();
        for path in ["a/x.md", "a/b/y.md", "ab/z.md"] {
            let doc = DocumentInsert::new(path, 1, &t, 1, "h");
            db.upsert_document(&doc, &[content("x", vec![0])]).unwrap();
        }

        assert_eq!(db.move_path("a", "c/").unwrap(), 2);
        let paths: Vec<String> = db.list_documents().unwrap().into_iter().map(|d| d.path).collect();
        assert_eq!(paths, vec!["ab/z.md", "c/b/y.md", "c/x.md"]);
        assert!(db.move_path("", "c").is_err());
    }

    #[test]
    fn test_clear() {
        let db = setup();
        let t = BTreeSet::new();
        let doc = DocumentInsert::new("a.md", 1, &t, 1, "h");
        db.upsert_document(&doc, &[content("x", vec![0])]).unwrap();
        db.clear().unwrap();
        assert_eq!(db.count_documents().unwrap(), 0);
        assert_eq!(db.count_terms().unwrap(), 0);
    }
}

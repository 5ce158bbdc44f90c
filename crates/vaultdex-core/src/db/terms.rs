//! Term postings

use super::Database;
use crate::error::Result;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Type, ValueRef};
use rusqlite::{params, params_from_iter, Row, ToSql};
use serde::{Deserialize, Serialize};

/// Where in a document a term came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermSource {
    Content,
    Filename,
    Tag,
    Frontmatter,
    PdfContent,
}

impl TermSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Filename => "filename",
            Self::Tag => "tag",
            Self::Frontmatter => "frontmatter",
            Self::PdfContent => "pdf_content",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "content" => Some(Self::Content),
            "filename" => Some(Self::Filename),
            "tag" => Some(Self::Tag),
            "frontmatter" => Some(Self::Frontmatter),
            "pdf_content" => Some(Self::PdfContent),
            _ => None,
        }
    }

    /// Sources searched by free-text keywords
    pub const TEXT: &'static [TermSource] = &[Self::Content, Self::Filename, Self::PdfContent];
}

impl ToSql for TermSource {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TermSource {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        TermSource::parse(s).ok_or_else(|| FromSqlError::Other(format!("unknown term source: {s}").into()))
    }
}

/// Stored term with its positions in one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub term: String,
    pub document_id: i64,
    pub source: TermSource,
    /// Literal surface form kept for reconstruction, as opposed to the
    /// searchable stem
    pub is_original: bool,
    /// Ascending; packed `(item, offset)` values for PDF content
    pub positions: Vec<i64>,
}

/// Term to be written for a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermEntry {
    pub term: String,
    pub source: TermSource,
    pub is_original: bool,
    pub positions: Vec<i64>,
}

impl TermEntry {
    pub fn new(term: impl Into<String>, source: TermSource, positions: Vec<i64>) -> Self {
        Self {
            term: term.into(),
            source,
            is_original: false,
            positions,
        }
    }

    pub fn original(term: impl Into<String>, source: TermSource, positions: Vec<i64>) -> Self {
        Self {
            is_original: true,
            ..Self::new(term, source, positions)
        }
    }
}

/// Aggregated hit of one searchable term in one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub document_id: i64,
    pub term: String,
    pub source: TermSource,
    pub frequency: usize,
}

pub(crate) fn decode_positions(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<i64>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl Database {
    /// All postings of a document, stems and originals alike
    pub fn get_terms_by_document_id(&self, document_id: i64) -> Result<Vec<Term>> {
        let mut stmt = self.conn.prepare(
            "SELECT term, source, is_original, positions
             FROM terms WHERE document_id = ?1
             ORDER BY source, is_original, term",
        )?;

        let terms = stmt
            .query_map(params![document_id], |row| {
                Ok(Term {
                    term: row.get(0)?,
                    document_id,
                    source: row.get(1)?,
                    is_original: row.get(2)?,
                    positions: decode_positions(row, 3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(terms)
    }

    /// Searchable (non-original) postings for any of `terms` in `sources`
    pub fn find_postings(&self, terms: &[String], sources: &[TermSource]) -> Result<Vec<Posting>> {
        if terms.is_empty() || sources.is_empty() {
            return Ok(Vec::new());
        }

        let term_marks = vec!["?"; terms.len()].join(", ");
        let source_marks = vec!["?"; sources.len()].join(", ");
        let sql = format!(
            "SELECT document_id, term, source, json_array_length(positions)
             FROM terms
             WHERE is_original = 0 AND term IN ({term_marks}) AND source IN ({source_marks})
             ORDER BY document_id, term, source"
        );

        let mut params_vec: Vec<&dyn ToSql> = Vec::with_capacity(terms.len() + sources.len());
        params_vec.extend(terms.iter().map(|t| t as &dyn ToSql));
        params_vec.extend(sources.iter().map(|s| s as &dyn ToSql));

        let mut stmt = self.conn.prepare(&sql)?;
        let postings = stmt
            .query_map(params_from_iter(params_vec), |row| {
                Ok(Posting {
                    document_id: row.get(0)?,
                    term: row.get(1)?,
                    source: row.get(2)?,
                    frequency: row.get::<_, i64>(3)? as usize,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(postings)
    }

    /// Every (document id, term) pair stored for one source
    pub fn find_terms_by_source(&self, source: TermSource) -> Result<Vec<(i64, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT document_id, term FROM terms
             WHERE source = ?1 AND is_original = 0
             ORDER BY document_id, term",
        )?;
        let rows = stmt
            .query_map(params![source], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Total number of stored postings
    pub fn count_terms(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM terms", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DocumentInsert;
    use std::collections::BTreeSet;

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    fn insert(db: &Database, path: &str, terms: &[TermEntry]) -> i64 {
        let tags = BTreeSet::new();
        let doc = DocumentInsert::new(path, 0, &tags, terms.len(), "h");
        db.upsert_document(&doc, terms).unwrap()
    }

    #[test]
    fn test_term_source_round_trip() {
        for source in [
            TermSource::Content,
            TermSource::Filename,
            TermSource::Tag,
            TermSource::Frontmatter,
            TermSource::PdfContent,
        ] {
            assert_eq!(TermSource::parse(source.as_str()), Some(source));
        }
        assert_eq!(TermSource::parse("body"), None);
    }

    #[test]
    fn test_get_terms_by_document_id() {
        let db = setup();
        let id = insert(
            &db,
            "a.md",
            &[
                TermEntry::new("walk", TermSource::Content, vec![3, 1]),
                TermEntry::new("a", TermSource::Filename, vec![0]),
            ],
        );

        let terms = db.get_terms_by_document_id(id).unwrap();
        assert_eq!(terms.len(), 2);
        let walk = terms.iter().find(|t| t.term == "walk").unwrap();
        assert_eq!(walk.positions, vec![1, 3], "positions are stored ascending");
        assert_eq!(walk.document_id, id);
        assert!(!walk.is_original);
    }

    #[test]
    fn test_find_postings_filters_sources_and_originals() {
        let db = setup();
        let id = insert(
            &db,
            "a.md",
            &[
                TermEntry::new("walk", TermSource::Content, vec![1, 4, 9]),
                TermEntry::original("walked", TermSource::Content, vec![1]),
                TermEntry::new("walk", TermSource::Tag, vec![0]),
            ],
        );

        let postings = db
            .find_postings(&["walk".to_string(), "walked".to_string()], &[TermSource::Content])
            .unwrap();
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].document_id, id);
        assert_eq!(postings[0].frequency, 3);
        assert_eq!(postings[0].source, TermSource::Content);
    }

    #[test]
    fn test_find_postings_empty_inputs() {
        let db = setup();
        assert!(db.find_postings(&[], TermSource::TEXT).unwrap().is_empty());
        assert!(db.find_postings(&["x".to_string()], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_find_terms_by_source() {
        let db = setup();
        let a = insert(&db, "a.md", &[TermEntry::new("rust", TermSource::Tag, vec![0])]);
        let b = insert(&db, "b.md", &[TermEntry::new("status:done", TermSource::Frontmatter, vec![0])]);

        assert_eq!(db.find_terms_by_source(TermSource::Tag).unwrap(), vec![(a, "rust".to_string())]);
        assert_eq!(
            db.find_terms_by_source(TermSource::Frontmatter).unwrap(),
            vec![(b, "status:done".to_string())]
        );
        assert_eq!(db.count_terms().unwrap(), 2);
    }
}

//! Single-document indexing
//!
//! Turns one vault file into a document row plus its postings and hands
//! both to the store in one atomic upsert. PDFs become a filename-only
//! document plus one pseudo-document per page.

use super::parser::{parse_note, property_term};
use super::position::PdfPosition;
use crate::analysis::{tokenize, TokenizerConfig};
use crate::config::vault_path::{file_stem, page_path};
use crate::db::{hash_content, DocumentInsert, DocumentStore, TermEntry, TermSource};
use crate::error::Result;
use crate::providers::{FileEntry, PdfExtractor, PdfPage, Vault};
use std::collections::{BTreeMap, BTreeSet};

/// What happened to one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    /// Postings written; carries the number of term entries stored
    Indexed { terms: usize },
    /// Content hash matches the stored document
    Unchanged,
    /// Path matches an exclusion rule
    Excluded,
}

impl IndexOutcome {
    pub fn terms_indexed(&self) -> usize {
        match self {
            Self::Indexed { terms } => *terms,
            _ => 0,
        }
    }
}

/// Collects positions per (term, source, original) before writing
#[derive(Default)]
struct TermCollector {
    entries: BTreeMap<(TermSource, bool, String), Vec<i64>>,
}

impl TermCollector {
    fn add(&mut self, source: TermSource, is_original: bool, term: &str, position: i64) {
        self.entries
            .entry((source, is_original, term.to_string()))
            .or_default()
            .push(position);
    }

    fn into_entries(self) -> Vec<TermEntry> {
        self.entries
            .into_iter()
            .map(|((source, is_original, term), positions)| TermEntry {
                term,
                source,
                is_original,
                positions,
            })
            .collect()
    }
}

/// Indexes files from a vault into a document store
pub struct Indexer<'a> {
    store: &'a dyn DocumentStore,
    vault: &'a dyn Vault,
    pdf: Option<&'a dyn PdfExtractor>,
    tokenizer: &'a TokenizerConfig,
}

impl<'a> Indexer<'a> {
    pub fn new(
        store: &'a dyn DocumentStore,
        vault: &'a dyn Vault,
        tokenizer: &'a TokenizerConfig,
    ) -> Self {
        Self {
            store,
            vault,
            pdf: None,
            tokenizer,
        }
    }

    /// Enable PDF page indexing
    pub fn with_pdf(mut self, pdf: &'a dyn PdfExtractor) -> Self {
        self.pdf = Some(pdf);
        self
    }

    /// Index one file. Unchanged files are skipped unless `force` is set.
    pub fn index_file(&self, file: &FileEntry, force: bool) -> Result<IndexOutcome> {
        if self.store.is_excluded(&file.path) {
            tracing::debug!("Skipping excluded file: {}", file.path);
            return Ok(IndexOutcome::Excluded);
        }

        if file.extension.as_deref() == Some("pdf") {
            self.index_pdf(file, force)
        } else {
            self.index_text(file, force)
        }
    }

    fn is_unchanged(&self, path: &str, hash: &str, force: bool) -> Result<bool> {
        if force {
            return Ok(false);
        }
        Ok(self.store.get_document_hash(path)?.as_deref() == Some(hash))
    }

    fn add_filename_terms(&self, collector: &mut TermCollector, path: &str) {
        for token in tokenize(file_stem(path), self.tokenizer) {
            collector.add(TermSource::Filename, false, &token.term, token.position as i64);
        }
    }

    fn index_text(&self, file: &FileEntry, force: bool) -> Result<IndexOutcome> {
        let content = self.vault.read_text(&file.path)?;
        let hash = hash_content(content.as_bytes());
        if self.is_unchanged(&file.path, &hash, force)? {
            return Ok(IndexOutcome::Unchanged);
        }

        let note = parse_note(&content);
        let mut collector = TermCollector::default();

        let tokens = tokenize(note.body, self.tokenizer);
        for token in &tokens {
            let offset = (note.body_offset + token.offset()) as i64;
            collector.add(TermSource::Content, false, &token.term, offset);
        }

        self.add_filename_terms(&mut collector, &file.path);

        for (tag, offsets) in &note.tags {
            for offset in offsets {
                collector.add(TermSource::Tag, false, tag, *offset as i64);
            }
        }

        for (name, values) in &note.properties {
            for (idx, value) in values.iter().enumerate() {
                collector.add(TermSource::Frontmatter, false, &property_term(name, value), idx as i64);
            }
        }

        let entries = collector.into_entries();
        let tags = note.tag_set();
        let doc = DocumentInsert::new(&file.path, file.modified, &tags, tokens.len(), &hash);
        self.store.upsert_document(&doc, &entries)?;

        tracing::debug!("Indexed {} ({} terms)", file.path, entries.len());
        Ok(IndexOutcome::Indexed {
            terms: entries.len(),
        })
    }

    fn index_pdf(&self, file: &FileEntry, force: bool) -> Result<IndexOutcome> {
        let bytes = self.vault.read_binary(&file.path)?;
        let hash = hash_content(&bytes);
        if self.is_unchanged(&file.path, &hash, force)? {
            return Ok(IndexOutcome::Unchanged);
        }

        let pages = match self.pdf {
            Some(extractor) => match extractor.extract_pages(&file.path, &bytes) {
                Ok(pages) => Some(pages),
                Err(e) => {
                    tracing::warn!("{}; indexing the filename only", e);
                    None
                }
            },
            None => Some(Vec::new()),
        };

        // Drops the file row too, so a failure below leaves no stored hash
        // and the next run retries
        self.store.remove_document_by_path(&file.path)?;

        let mut total = 0;
        for page in pages.iter().flatten() {
            total += self.index_pdf_page(file, page, None)?;
        }

        let mut collector = TermCollector::default();
        self.add_filename_terms(&mut collector, &file.path);
        let entries = collector.into_entries();
        total += entries.len();

        // An empty hash makes a failed extraction retry on the next run
        let stored_hash = if pages.is_some() { hash.as_str() } else { "" };
        let tags = BTreeSet::new();
        let doc = DocumentInsert::new(&file.path, file.modified, &tags, 0, stored_hash);
        self.store.upsert_document(&doc, &entries)?;

        tracing::debug!("Indexed {} ({} terms)", file.path, total);
        Ok(IndexOutcome::Indexed { terms: total })
    }

    /// Index one PDF page as the pseudo-document `<path>#page=<n>`.
    ///
    /// Every occurrence is stored twice: as its searchable stem and as the
    /// literal surface word (`is_original`), both at the packed
    /// `(item, char offset)` position. `folder_id` is recorded as the
    /// `folder:<id>` property. Returns the number of term entries stored.
    pub fn index_pdf_page(
        &self,
        file: &FileEntry,
        page: &PdfPage,
        folder_id: Option<&str>,
    ) -> Result<usize> {
        let path = page_path(&file.path, page.number);
        if self.store.is_excluded(&path) {
            tracing::debug!("Skipping excluded page: {}", path);
            return Ok(0);
        }

        let surface = self.tokenizer.with_stopword_removal(false).with_stemming(false);
        let mut collector = TermCollector::default();
        let mut token_count = 0;

        for (item_index, item) in page.items.iter().enumerate() {
            let stems: BTreeMap<usize, String> = tokenize(item, self.tokenizer)
                .into_iter()
                .map(|t| (t.span.start, t.term))
                .collect();

            for token in tokenize(item, &surface) {
                let char_offset = item[..token.span.start].chars().count() as u32;
                let Some(position) = PdfPosition::new(item_index as u32, char_offset) else {
                    tracing::debug!("Item {} of {} too long to address", item_index, path);
                    continue;
                };
                let packed = position.pack();

                collector.add(TermSource::PdfContent, true, &item[token.span.clone()], packed);
                if let Some(stem) = stems.get(&token.span.start) {
                    collector.add(TermSource::PdfContent, false, stem, packed);
                    token_count += 1;
                }
            }
        }

        if let Some(id) = folder_id {
            collector.add(TermSource::Frontmatter, false, &Self::folder_term(id), 0);
        }

        let entries = collector.into_entries();
        let hash = hash_content(page.items.join("\n").as_bytes());
        let tags = BTreeSet::new();
        let doc = DocumentInsert::new(&path, file.modified, &tags, token_count, &hash);
        self.store.upsert_document(&doc, &entries)?;

        Ok(entries.len())
    }

    /// Drop a file (and its PDF pages) from the index
    pub fn remove(&self, path: &str) -> Result<usize> {
        self.store.remove_document_by_path(path)
    }

    /// Drop every document under a folder
    pub fn remove_folder(&self, folder: &str) -> Result<usize> {
        self.store.remove_documents_by_prefix(folder)
    }

    /// Rename a file: move its document, then refresh its postings so the
    /// filename terms follow the new name
    pub fn rename(&self, old_path: &str, file: &FileEntry) -> Result<IndexOutcome> {
        if self.store.is_excluded(&file.path) {
            self.store.remove_document_by_path(old_path)?;
            return Ok(IndexOutcome::Excluded);
        }
        self.store.move_path(old_path, &file.path)?;
        self.index_file(file, true)
    }

    /// Move a folder; names do not change, so postings are kept as is
    pub fn move_folder(&self, old_folder: &str, new_folder: &str) -> Result<usize> {
        self.store.move_path(old_folder, new_folder)
    }

    /// Stored term for a page's folder id
    pub fn folder_term(folder_id: &str) -> String {
        property_term("folder", folder_id)
    }
}

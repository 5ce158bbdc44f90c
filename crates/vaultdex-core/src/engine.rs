//! Process-scoped search engine
//!
//! `Engine` owns the store, the configuration and the vault collaborators.
//! It is created once with [`Engine::open`] and torn down with
//! [`Engine::shutdown`]; nothing is kept in globals.

use crate::config::vault_path::split_page_path;
use crate::config::Config;
use crate::db::{Database, IndexStats, TermSource};
use crate::error::{Result, VaultdexError};
use crate::index::{
    BatchIndexer, CancellationFlag, IndexOutcome, IndexProgress, IndexReport, Indexer,
    ReindexRequest,
};
use crate::providers::{FsVault, PdfExtractBackend, PdfExtractor, Vault};
use crate::search::{
    highlight, paginate, pdf_snippet, Evaluation, HighlightedLine, MatchMode, Operation,
    OperationFailure, PaginatedResult, PdfSnippet, QueryEvaluator, ConditionResult,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::mpsc::UnboundedSender;

const PENDING_REINDEX_KEY: &str = "pending_reindex";

/// One page of search results plus the operations that failed
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub results: PaginatedResult<ConditionResult>,
    pub failures: Vec<OperationFailure>,
}

/// Highlighted context for one matched document
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Snippet {
    /// Highlighted lines of a text document
    Text { lines: Vec<HighlightedLine> },
    /// Densest window of a PDF page, with its deep link
    Pdf {
        page: u32,
        snippet: Option<PdfSnippet>,
        link: Option<String>,
    },
}

/// Search engine bound to one vault and one index
pub struct Engine {
    db: Database,
    config: Config,
    vault: Box<dyn Vault>,
    pdf: Box<dyn PdfExtractor>,
}

impl Engine {
    /// Open the configured vault and index, creating or migrating the schema
    pub fn open(config: Config) -> Result<Self> {
        let vault = FsVault::new(config.resolve_vault_path()?);
        let db = Database::open(config.resolve_database_path())?;
        Self::open_with(db, config, Box::new(vault), Box::new(PdfExtractBackend::new()))
    }

    /// Open with explicit collaborators
    pub fn open_with(
        mut db: Database,
        config: Config,
        vault: Box<dyn Vault>,
        pdf: Box<dyn PdfExtractor>,
    ) -> Result<Self> {
        db.initialize()?;
        db.set_exclusions(config.exclusions.rules()?);
        tracing::debug!(
            "Engine opened (schema v{})",
            db.schema_version()?.unwrap_or_default()
        );
        Ok(Self {
            db,
            config,
            vault,
            pdf,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn indexer(&self) -> Indexer<'_> {
        Indexer::new(&self.db, self.vault.as_ref(), &self.config.search.tokenizer)
            .with_pdf(self.pdf.as_ref())
    }

    /// Index the whole vault
    pub fn reindex(
        &self,
        force: bool,
        progress: Option<UnboundedSender<IndexProgress>>,
        cancel: &CancellationFlag,
    ) -> Result<IndexReport> {
        let root = self.vault.root()?;
        let mut batch = BatchIndexer::new(self.indexer(), &self.db, &self.config.indexing);
        if let Some(sender) = progress {
            batch = batch.with_progress(sender);
        }
        batch.run(&root, force, cancel)
    }

    /// Index a single file
    pub fn index_path(&self, path: &str, force: bool) -> Result<IndexOutcome> {
        let file = self.vault.metadata(path)?;
        self.indexer().index_file(&file, force)
    }

    /// Drop a deleted file or folder
    pub fn remove_path(&self, path: &str) -> Result<usize> {
        let indexer = self.indexer();
        let removed = indexer.remove(path)?;
        Ok(removed + indexer.remove_folder(path)?)
    }

    /// Follow a renamed file
    pub fn rename_path(&self, old_path: &str, new_path: &str) -> Result<IndexOutcome> {
        let file = self.vault.metadata(new_path)?;
        self.indexer().rename(old_path, &file)
    }

    /// Follow a moved folder
    pub fn move_folder(&self, old_folder: &str, new_folder: &str) -> Result<usize> {
        self.indexer().move_folder(old_folder, new_folder)
    }

    /// Evaluate operations with the configured match mode
    pub fn evaluate(&self, operations: &[Operation]) -> Result<Evaluation> {
        self.evaluate_with_mode(operations, self.config.search.match_mode)
    }

    pub fn evaluate_with_mode(&self, operations: &[Operation], mode: MatchMode) -> Result<Evaluation> {
        QueryEvaluator::new(&self.db, &self.config.search.tokenizer)
            .with_mode(mode)
            .evaluate(operations)
    }

    /// Evaluate and return one page; `limit` defaults to the configured
    /// page size
    pub fn search(
        &self,
        operations: &[Operation],
        mode: Option<MatchMode>,
        page: usize,
        limit: Option<usize>,
    ) -> Result<SearchPage> {
        let evaluation =
            self.evaluate_with_mode(operations, mode.unwrap_or(self.config.search.match_mode))?;
        let limit = limit.unwrap_or(self.config.search.page_size);
        Ok(SearchPage {
            results: paginate(&evaluation.results, page, limit),
            failures: evaluation.failures,
        })
    }

    /// Highlight keywords in a text document read from the vault
    pub fn highlight(&self, path: &str, keywords: &[String]) -> Result<Vec<HighlightedLine>> {
        if self.db.is_excluded(path) {
            return Err(VaultdexError::Excluded(path.to_string()));
        }
        let content = self.vault.read_text(path)?;
        highlight(&content, keywords, &self.config.search.tokenizer)
    }

    /// Densest-window snippet of an indexed PDF page (`file.pdf#page=N`)
    pub fn pdf_snippet(&self, page_path: &str, keywords: &[String]) -> Result<Option<PdfSnippet>> {
        let doc = self
            .db
            .get_document_by_path(page_path)?
            .ok_or_else(|| VaultdexError::DocumentNotFound(page_path.to_string()))?;
        let terms = self.db.get_terms_by_document_id(doc.id)?;
        Ok(pdf_snippet(&terms, keywords, &self.config.search.tokenizer))
    }

    /// Snippet for any matched document
    pub fn snippet(&self, path: &str, keywords: &[String]) -> Result<Snippet> {
        match split_page_path(path) {
            (_, Some(page)) => {
                let snippet = self.pdf_snippet(path, keywords)?;
                let link = snippet.as_ref().map(|s| s.selection.link_fragment(page));
                Ok(Snippet::Pdf {
                    page,
                    snippet,
                    link,
                })
            }
            (file, None) => Ok(Snippet::Text {
                lines: self.highlight(file, keywords)?,
            }),
        }
    }

    /// Every indexed tag with the number of documents carrying it
    pub fn tags(&self) -> Result<BTreeMap<String, usize>> {
        let mut docs: BTreeMap<String, BTreeSet<i64>> = BTreeMap::new();
        for (document_id, tag) in self.db.find_terms_by_source(TermSource::Tag)? {
            docs.entry(tag).or_default().insert(document_id);
        }
        Ok(docs.into_iter().map(|(tag, ids)| (tag, ids.len())).collect())
    }

    pub fn stats(&self) -> Result<IndexStats> {
        self.db.get_stats()
    }

    /// Record a reindex to run once confirmed. Replaces any earlier request.
    pub fn request_reindex(&self, force: bool, reason: &str) -> Result<ReindexRequest> {
        let request = ReindexRequest::new(force, reason);
        self.db
            .set_state(PENDING_REINDEX_KEY, &serde_json::to_string(&request)?)?;
        tracing::info!("Reindex requested: {}", reason);
        Ok(request)
    }

    /// The request waiting for confirmation, if any
    pub fn pending_reindex(&self) -> Result<Option<ReindexRequest>> {
        match self.db.get_state(PENDING_REINDEX_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Run the pending reindex. The request is kept if the run is cancelled.
    pub fn confirm_reindex(
        &self,
        progress: Option<UnboundedSender<IndexProgress>>,
        cancel: &CancellationFlag,
    ) -> Result<Option<IndexReport>> {
        let Some(request) = self.pending_reindex()? else {
            return Ok(None);
        };
        let report = self.reindex(request.force, progress, cancel)?;
        if !report.cancelled {
            self.db.clear_state(PENDING_REINDEX_KEY)?;
        }
        Ok(Some(report))
    }

    /// Drop the pending request. Returns whether there was one.
    pub fn discard_reindex(&self) -> Result<bool> {
        self.db.clear_state(PENDING_REINDEX_KEY)
    }

    /// Optimize and close the store
    pub fn shutdown(self) -> Result<()> {
        tracing::debug!("Engine shutting down");
        self.db.close()
    }
}

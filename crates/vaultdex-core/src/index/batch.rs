//! Batch (re)indexing with cancellation and progress reporting

use super::indexer::{IndexOutcome, Indexer};
use crate::config::vault_path::split_page_path;
use crate::config::IndexingConfig;
use crate::db::DocumentStore;
use crate::error::Result;
use crate::providers::FolderEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Shared cancellation signal, checked before each file
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A file that could not be indexed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedItem {
    pub path: String,
    pub error: String,
}

/// Summary of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexReport {
    /// Files whose postings were written
    pub indexed: usize,
    /// Files whose content hash was unchanged
    pub unchanged: usize,
    /// Excluded files and unsupported extensions
    pub skipped: usize,
    /// Stale or excluded documents dropped from the store
    pub removed: usize,
    pub failed: Vec<FailedItem>,
    pub cancelled: bool,
}

impl IndexReport {
    pub fn processed(&self) -> usize {
        self.indexed + self.unchanged + self.skipped + self.failed.len()
    }
}

/// Progress events emitted while a batch runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum IndexProgress {
    Started { total: usize },
    Progress { processed: usize, total: usize, current: String },
    Finished { report: IndexReport },
}

/// A reindex waiting for confirmation. Persisted in the store so it
/// survives a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexRequest {
    /// Reindex unchanged files too
    pub force: bool,
    /// Why the rebuild was requested (shown when asking for confirmation)
    pub reason: String,
    /// RFC 3339
    pub requested_at: String,
}

impl ReindexRequest {
    pub fn new(force: bool, reason: impl Into<String>) -> Self {
        Self {
            force,
            reason: reason.into(),
            requested_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Runs [`Indexer`] over a whole vault tree
pub struct BatchIndexer<'a> {
    indexer: Indexer<'a>,
    store: &'a dyn DocumentStore,
    config: &'a IndexingConfig,
    progress: Option<UnboundedSender<IndexProgress>>,
}

impl<'a> BatchIndexer<'a> {
    pub fn new(indexer: Indexer<'a>, store: &'a dyn DocumentStore, config: &'a IndexingConfig) -> Self {
        Self {
            indexer,
            store,
            config,
            progress: None,
        }
    }

    /// Send progress events to a channel. Sending never blocks indexing.
    pub fn with_progress(mut self, sender: UnboundedSender<IndexProgress>) -> Self {
        self.progress = Some(sender);
        self
    }

    fn emit(&self, event: IndexProgress) {
        if let Some(sender) = &self.progress {
            // A dropped receiver only means nobody is watching
            let _ = sender.send(event);
        }
    }

    /// Index every file under `root`, then drop documents whose files are
    /// gone or now excluded, and mark the index as built.
    ///
    /// Per-file failures are recorded and skipped. Only a fatal (store)
    /// error aborts the run. When cancelled, the documents written so far
    /// stay valid and the index is not marked as built.
    pub fn run(&self, root: &FolderEntry, force: bool, cancel: &CancellationFlag) -> Result<IndexReport> {
        let files = root.files();
        let total = files.len();
        let interval = self.config.progress_interval.max(1);
        let mut report = IndexReport::default();
        let mut seen: HashSet<&str> = HashSet::with_capacity(total);

        tracing::info!("Indexing {} files", total);
        self.emit(IndexProgress::Started { total });

        for (idx, file) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::info!("Indexing cancelled after {} of {} files", idx, total);
                report.cancelled = true;
                break;
            }

            seen.insert(file.path.as_str());

            let supported = file.extension.as_deref().is_some_and(|ext| {
                self.config.accepts_extension(ext) && (ext != "pdf" || self.config.index_pdfs)
            });

            if !supported {
                report.skipped += 1;
            } else {
                match self.indexer.index_file(file, force) {
                    Ok(IndexOutcome::Indexed { .. }) => report.indexed += 1,
                    Ok(IndexOutcome::Unchanged) => report.unchanged += 1,
                    Ok(IndexOutcome::Excluded) => report.skipped += 1,
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        tracing::warn!("Failed to index {}: {}", file.path, e);
                        report.failed.push(FailedItem {
                            path: file.path.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }

            let processed = idx + 1;
            if processed % interval == 0 || processed == total {
                self.emit(IndexProgress::Progress {
                    processed,
                    total,
                    current: file.path.clone(),
                });
            }
        }

        if !report.cancelled {
            report.removed = self.remove_stale(&seen)?;
            self.store.set_index_built(true)?;
        }

        tracing::info!(
            "Indexing finished: {} indexed, {} unchanged, {} skipped, {} removed, {} failed",
            report.indexed,
            report.unchanged,
            report.skipped,
            report.removed,
            report.failed.len()
        );
        self.emit(IndexProgress::Finished {
            report: report.clone(),
        });

        Ok(report)
    }

    /// Drop documents whose file no longer exists or is excluded
    fn remove_stale(&self, seen: &HashSet<&str>) -> Result<usize> {
        let mut removed = 0;
        let mut dropped: HashSet<String> = HashSet::new();

        for doc in self.store.list_documents()? {
            let (file, _) = split_page_path(&doc.path);
            if dropped.contains(file) {
                continue;
            }
            if !seen.contains(file) || self.store.is_excluded(&doc.path) {
                tracing::debug!("Removing stale document: {}", file);
                removed += self.store.remove_document_by_path(file)?;
                dropped.insert(file.to_string());
            }
        }

        Ok(removed)
    }
}

//! Vaultdex Core Library
//!
//! Core functionality for vaultdex, a local full-text search engine for
//! markdown and PDF vaults.
//!
//! # Features
//! - Tokenizer with diacritic folding, compound splitting, stopwords and a
//!   Porter stemmer
//! - SQLite inverted index with atomic per-document posting replacement
//! - Incremental indexing with content hashes, frontmatter and tags
//! - Multi-operation queries over keywords, filenames, folders and properties
//! - Line highlighting and PDF snippets with deep-link selection ranges

pub mod analysis;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod index;
pub mod providers;
pub mod search;

pub use analysis::{tokenize, Token, TokenizerConfig};
pub use config::{Config, ExclusionRules};
pub use db::{Database, Document, DocumentStore, IndexStats, Term, TermSource};
pub use engine::{Engine, SearchPage, Snippet};
pub use error::{Error, Result, VaultdexError};
pub use index::{CancellationFlag, IndexProgress, IndexReport, Indexer, ReindexRequest};
pub use providers::{FsVault, MemoryVault, PdfExtractor, PdfPage, Vault};
pub use search::{
    paginate, ConditionResult, HighlightedLine, MatchMode, Operation, PaginatedResult,
    PdfSelection, PdfSnippet, PropertyFilter,
};

/// Default cache directory name
pub const CACHE_DIR_NAME: &str = "vaultdex";

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "vaultdex";

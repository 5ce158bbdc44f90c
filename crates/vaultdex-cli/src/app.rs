//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vaultdex")]
#[command(
    author,
    version,
    about = "Local full-text search for markdown and PDF vaults"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, env = "VAULTDEX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index the vault
    Index(IndexArgs),

    /// Search indexed documents
    Search(SearchArgs),

    /// Highlight keywords in one document
    Highlight(HighlightArgs),

    /// List indexed tags
    Tags,

    /// Show index status
    Status,

    /// Manage a reindex waiting for confirmation
    Pending(PendingArgs),
}

#[derive(Args)]
pub struct IndexArgs {
    /// Reindex files whose content did not change
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Keyword; prefix with # to match a tag (repeatable)
    #[arg(short, long = "keyword")]
    pub keywords: Vec<String>,

    /// Filename substring, or /regex/ (repeatable)
    #[arg(long = "filename")]
    pub filenames: Vec<String>,

    /// Folder prefix, /regex/, or / for the vault root (repeatable)
    #[arg(long = "folder")]
    pub folders: Vec<String>,

    /// Property filter as name=value (repeatable)
    #[arg(short, long = "property")]
    pub properties: Vec<String>,

    /// Match any term of a keyword instead of all of them
    #[arg(long)]
    pub any: bool,

    /// Page number (1-based)
    #[arg(long, default_value = "1")]
    pub page: usize,

    /// Results per page (defaults to the configured page size)
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Show highlighted lines or PDF snippets for each result
    #[arg(long)]
    pub highlight: bool,
}

#[derive(Args)]
pub struct HighlightArgs {
    /// Vault-relative path; use file.pdf#page=N for a PDF page
    pub path: String,

    /// Keywords to highlight
    #[arg(required = true)]
    pub keywords: Vec<String>,
}

#[derive(Args)]
pub struct PendingArgs {
    #[command(subcommand)]
    pub action: PendingAction,
}

#[derive(Subcommand)]
pub enum PendingAction {
    /// Show the pending request
    Show,
    /// Request a reindex to be confirmed later
    Request {
        /// Reindex unchanged files too
        #[arg(short, long)]
        force: bool,
        /// Reason shown when asking for confirmation
        #[arg(long, default_value = "manual request")]
        reason: String,
    },
    /// Run the pending reindex
    Confirm,
    /// Drop the pending request
    Discard,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
}

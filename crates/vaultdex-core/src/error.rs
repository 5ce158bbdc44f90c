//! Error types for vaultdex

use thiserror::Error;

/// Result type alias using VaultdexError
pub type Result<T> = std::result::Result<T, VaultdexError>;

/// Error type alias for convenience
pub type Error = VaultdexError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
}

/// Main error type for vaultdex
#[derive(Debug, Error)]
pub enum VaultdexError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Path is excluded from indexing: {0}")]
    Excluded(String),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("PDF extraction failed for {path}: {reason}")]
    PdfExtraction { path: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl VaultdexError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DocumentNotFound(_) => exit_codes::NOT_FOUND,
            Self::InvalidPattern { .. }
            | Self::InvalidInput(_)
            | Self::Config(_)
            | Self::GlobPattern(_)
            | Self::Regex(_) => exit_codes::INVALID_INPUT,
            _ => exit_codes::GENERAL_ERROR,
        }
    }

    /// Whether this error means the store itself is unusable.
    ///
    /// Batch jobs and query batches record every other error per item and
    /// keep going; a fatal error aborts them and reaches the caller.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

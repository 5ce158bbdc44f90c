//! Configuration management

pub mod exclusion;
pub mod vault_path;

pub use exclusion::ExclusionRules;

use crate::analysis::TokenizerConfig;
use crate::error::{Result, VaultdexError};
use crate::search::MatchMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured vault path
pub const VAULT_ENV: &str = "VAULTDEX_VAULT";

/// Environment variable that overrides the index database location
pub const DB_ENV: &str = "VAULTDEX_DB";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Root folder of the vault to index
    #[serde(default)]
    pub vault_path: Option<PathBuf>,

    /// Query and tokenizer settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Folders and patterns that are never indexed
    #[serde(default)]
    pub exclusions: ExclusionConfig,

    /// Batch indexing settings
    #[serde(default)]
    pub indexing: IndexingConfig,
}

/// Query settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Whether every term of a keyword must match, or any of them
    #[serde(default)]
    pub match_mode: MatchMode,

    /// Default page size for paginated results
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Tokenizer shared by indexing, querying and highlighting
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::default(),
            page_size: default_page_size(),
            tokenizer: TokenizerConfig::default(),
        }
    }
}

fn default_page_size() -> usize {
    20
}

/// Exclusion configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExclusionConfig {
    /// Vault-relative folders whose contents are skipped
    #[serde(default)]
    pub folders: Vec<String>,

    /// Glob patterns matched against vault-relative paths
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl ExclusionConfig {
    /// Compile into matchable rules
    pub fn rules(&self) -> Result<ExclusionRules> {
        ExclusionRules::new(&self.folders, &self.patterns)
    }
}

/// Indexing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// File extensions (without dot) that are indexed
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Extract and index PDF pages
    #[serde(default = "default_true")]
    pub index_pdfs: bool,

    /// Emit a progress event every N processed files
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            index_pdfs: true,
            progress_interval: default_progress_interval(),
        }
    }
}

impl IndexingConfig {
    /// Whether files with this extension are indexed
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

fn default_extensions() -> Vec<String> {
    vec!["md".to_string(), "txt".to_string(), "pdf".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_progress_interval() -> usize {
    25
}

impl Config {
    /// Load config from default path
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load config from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&content)?
        } else {
            Config::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Save config to default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    /// Save config to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Vault root: `VAULTDEX_VAULT` wins over the configured path
    pub fn resolve_vault_path(&self) -> Result<PathBuf> {
        std::env::var(VAULT_ENV)
            .map(PathBuf::from)
            .ok()
            .or_else(|| self.vault_path.clone())
            .ok_or_else(|| {
                VaultdexError::Config(format!(
                    "No vault configured: set vault_path in {} or {}",
                    Self::default_path().display(),
                    VAULT_ENV
                ))
            })
    }

    /// Index database: `VAULTDEX_DB` wins over the cache-dir default
    pub fn resolve_database_path(&self) -> PathBuf {
        std::env::var(DB_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::db::Database::default_path())
    }

    fn validate(&self) -> Result<()> {
        if self.indexing.progress_interval == 0 {
            return Err(VaultdexError::Config(
                "indexing.progress_interval must be at least 1".to_string(),
            ));
        }
        self.exclusions.rules()?;
        Ok(())
    }
}

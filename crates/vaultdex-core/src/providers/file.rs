//! File system vault
//!
//! Reads a vault from a local directory using walkdir.

use super::{FileEntry, FolderEntry, Vault, VaultEntry};
use crate::config::vault_path::{extension, normalize_vault_path};
use crate::error::{Result, VaultdexError};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use walkdir::{DirEntry, WalkDir};

/// Directories never descended into
const EXCLUDE_DIRS: &[&str] = &["node_modules", ".git", ".obsidian", ".trash"];

/// Vault backed by a local directory. Symlinks are followed.
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a vault-relative path, refusing anything that escapes the root
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let normalized = normalize_vault_path(path);
        if normalized.split('/').any(|segment| segment == "..") {
            return Err(VaultdexError::InvalidInput(format!(
                "path escapes the vault: {}",
                path
            )));
        }
        Ok(self.root.join(normalized))
    }

    fn relative(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        normalize_vault_path(&relative.to_string_lossy())
    }

    fn file_entry(&self, path: &Path, meta: &std::fs::Metadata) -> FileEntry {
        let relative = self.relative(path);
        FileEntry {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            extension: extension(&relative),
            modified: modified_millis(meta),
            size: meta.len(),
            path: relative,
        }
    }

    fn read_folder(&self, dir: &Path) -> Result<FolderEntry> {
        let relative = self.relative(dir);
        let name = if relative.is_empty() {
            String::new()
        } else {
            dir.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default()
        };

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !should_skip(e));

        let mut children = Vec::new();
        for entry in walker {
            // An unreadable entry or a symlink loop loses that entry only
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable vault entry: {}", e);
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                match self.read_folder(entry.path()) {
                    Ok(folder) => children.push(VaultEntry::Folder(folder)),
                    Err(e) => tracing::warn!("Skipping folder {}: {}", entry.path().display(), e),
                }
            } else if entry.file_type().is_file() {
                match entry.metadata() {
                    Ok(meta) => children.push(VaultEntry::File(self.file_entry(entry.path(), &meta))),
                    Err(e) => tracing::warn!("Skipping {}: {}", entry.path().display(), e),
                }
            }
        }

        Ok(FolderEntry {
            path: relative,
            name,
            children,
        })
    }
}

impl Vault for FsVault {
    fn root(&self) -> Result<FolderEntry> {
        if !self.root.is_dir() {
            return Err(VaultdexError::Config(format!(
                "Vault path is not a directory: {}",
                self.root.display()
            )));
        }
        self.read_folder(&self.root)
    }

    fn read_text(&self, path: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.resolve(path)?)?)
    }

    fn read_binary(&self, path: &str) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.resolve(path)?)?)
    }

    fn metadata(&self, path: &str) -> Result<FileEntry> {
        let full = self.resolve(path)?;
        let meta = std::fs::metadata(&full)?;
        Ok(self.file_entry(&full, &meta))
    }
}

fn modified_millis(meta: &std::fs::Metadata) -> i64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn should_skip(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();

    if name.starts_with('.') {
        return true;
    }

    entry.file_type().is_dir() && EXCLUDE_DIRS.iter().any(|d| name == *d)
}

//! Vault access abstraction
//!
//! The engine only reads from a vault: it enumerates files and folders,
//! reads text or binary content and looks up basic metadata. PDF text
//! extraction sits behind its own trait so tests can supply pages directly.

use crate::error::Result;
use serde::Serialize;

pub mod file;
pub mod memory;
pub mod pdf;

pub use file::FsVault;
pub use memory::MemoryVault;
pub use pdf::{PdfExtractBackend, PdfExtractor, PdfPage};

/// Read-only view of a vault. Paths are vault-relative with `/` separators.
pub trait Vault: Send + Sync {
    /// Folder tree rooted at the vault root
    fn root(&self) -> Result<FolderEntry>;

    /// Read a file as UTF-8 text
    fn read_text(&self, path: &str) -> Result<String>;

    /// Read raw bytes
    fn read_binary(&self, path: &str) -> Result<Vec<u8>>;

    /// Metadata for a single file
    fn metadata(&self, path: &str) -> Result<FileEntry>;
}

/// A node in the vault tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VaultEntry {
    File(FileEntry),
    Folder(FolderEntry),
}

impl VaultEntry {
    pub fn path(&self) -> &str {
        match self {
            Self::File(f) => &f.path,
            Self::Folder(f) => &f.path,
        }
    }
}

/// File metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub path: String,
    pub name: String,
    /// Lowercase, without the dot
    pub extension: Option<String>,
    /// Milliseconds since the Unix epoch
    pub modified: i64,
    pub size: u64,
}

/// Folder with its direct children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct FolderEntry {
    /// Empty for the vault root
    pub path: String,
    pub name: String,
    pub children: Vec<VaultEntry>,
}

impl FolderEntry {
    /// All files below this folder, depth first
    pub fn files(&self) -> Vec<&FileEntry> {
        let mut out = Vec::new();
        collect_files(self, &mut out);
        out
    }

    /// Find a descendant folder by its vault-relative path
    pub fn find_folder(&self, path: &str) -> Option<&FolderEntry> {
        if self.path == path {
            return Some(self);
        }
        self.children.iter().find_map(|child| match child {
            VaultEntry::Folder(folder) => folder.find_folder(path),
            VaultEntry::File(_) => None,
        })
    }
}

fn collect_files<'a>(folder: &'a FolderEntry, out: &mut Vec<&'a FileEntry>) {
    for child in &folder.children {
        match child {
            VaultEntry::File(file) => out.push(file),
            VaultEntry::Folder(sub) => collect_files(sub, out),
        }
    }
}

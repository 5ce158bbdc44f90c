//! In-memory vault, for tests, benches and embedding callers

use super::{FileEntry, FolderEntry, Vault, VaultEntry};
use crate::config::vault_path::{extension, file_name, normalize_vault_path};
use crate::error::{Result, VaultdexError};
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredFile {
    bytes: Vec<u8>,
    modified: i64,
}

/// Vault holding files in a sorted map
#[derive(Debug, Default)]
pub struct MemoryVault {
    files: RwLock<BTreeMap<String, StoredFile>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a text file
    pub fn insert_text(&self, path: &str, content: &str) {
        self.insert_binary(path, content.as_bytes().to_vec());
    }

    /// Add or replace a binary file. Each write bumps the modification time.
    pub fn insert_binary(&self, path: &str, bytes: Vec<u8>) {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        let modified = files.values().map(|f| f.modified).max().unwrap_or(0) + 1;
        files.insert(normalize_vault_path(path), StoredFile { bytes, modified });
    }

    /// Delete a file. Returns whether it existed.
    pub fn remove(&self, path: &str) -> bool {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.remove(&normalize_vault_path(path)).is_some()
    }

    fn with_file<T>(&self, path: &str, f: impl FnOnce(&str, &StoredFile) -> T) -> Result<T> {
        let key = normalize_vault_path(path);
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.get(&key).map(|file| f(&key, file)).ok_or_else(|| {
            VaultdexError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such file in vault: {}", key),
            ))
        })
    }
}

fn entry_for(path: &str, file: &StoredFile) -> FileEntry {
    FileEntry {
        path: path.to_string(),
        name: file_name(path).to_string(),
        extension: extension(path),
        modified: file.modified,
        size: file.bytes.len() as u64,
    }
}

fn insert_into(folder: &mut FolderEntry, segments: &[&str], entry: FileEntry) {
    match segments {
        [] | [_] => folder.children.push(VaultEntry::File(entry)),
        [head, rest @ ..] => {
            let child_path = if folder.path.is_empty() {
                head.to_string()
            } else {
                format!("{}/{}", folder.path, head)
            };
            let existing = folder.children.iter().position(
                |c| matches!(c, VaultEntry::Folder(f) if f.path == child_path),
            );
            let idx = match existing {
                Some(idx) => idx,
                None => {
                    folder.children.push(VaultEntry::Folder(FolderEntry {
                        path: child_path,
                        name: head.to_string(),
                        children: Vec::new(),
                    }));
                    folder.children.len() - 1
                }
            };
            if let VaultEntry::Folder(sub) = &mut folder.children[idx] {
                insert_into(sub, rest, entry);
            }
        }
    }
}

impl Vault for MemoryVault {
    fn root(&self) -> Result<FolderEntry> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        let mut root = FolderEntry::default();
        for (path, file) in files.iter() {
            let segments: Vec<&str> = path.split('/').collect();
            insert_into(&mut root, &segments, entry_for(path, file));
        }
        Ok(root)
    }

    fn read_text(&self, path: &str) -> Result<String> {
        let bytes = self.read_binary(path)?;
        String::from_utf8(bytes).map_err(|e| {
            VaultdexError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }

    fn read_binary(&self, path: &str) -> Result<Vec<u8>> {
        self.with_file(path, |_, file| file.bytes.clone())
    }

    fn metadata(&self, path: &str) -> Result<FileEntry> {
        self.with_file(path, entry_for)
    }
}

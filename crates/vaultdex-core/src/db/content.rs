//! Content hashing

use sha2::{Digest, Sha256};

/// Hash content using SHA-256
pub fn hash_content(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

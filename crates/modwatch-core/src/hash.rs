//! Content hashing for cache keys and dedup checks

use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 digest of a content payload.
///
/// Used as the verdict-cache key; two items with the same payload bytes
/// always hash to the same key regardless of source or chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash raw payload bytes
    pub fn of(payload: &[u8]) -> Self {
        let digest = Sha256::digest(payload);
        let mut out = [0u8; 32];
        out.copy_from_slice(digest.as_slice());
        Self(out)
    }

    /// The raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

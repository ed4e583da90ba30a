//! Path normalization and identity hashing shared by resources and the cache.

use crate::error::{ResourceError, Result};

/// Longest accepted filename, in bytes, after normalization.
pub const MAX_FILENAME_LEN: usize = 260;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// A validated, normalized resource path together with its identity hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    normalized: String,
    hash: u32,
}

impl ResourcePath {
    /// Normalizes `path` and computes its hash, rejecting empty or oversized
    /// names.
    pub fn new(path: &str, max_len: usize) -> Result<Self> {
        if path.trim().is_empty() {
            return Err(ResourceError::PathInvalid {
                path: path.to_string(),
                reason: "path is empty",
            });
        }
        let normalized = normalize(path);
        if normalized.len() > max_len {
            return Err(ResourceError::PathInvalid {
                path: path.to_string(),
                reason: "path exceeds the maximum filename length",
            });
        }
        let hash = identity_hash(&normalized);
        Ok(Self { normalized, hash })
    }

    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }
}

impl std::fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.normalized)
    }
}

/// Lower-cases ASCII letters and turns backslashes into forward slashes.
pub fn normalize(path: &str) -> String {
    path.chars()
        .map(|c| match c {
            '\\' => '/',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// 32-bit FNV-1a over the bytes of an already normalized path.
pub fn identity_hash(normalized: &str) -> u32 {
    normalized.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

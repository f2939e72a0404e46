//! Content hashing for build fingerprints.

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

/// A 128-bit content hash computed using XXH3.
///
/// Two inputs with the same `ContentHash` are assumed to be identical. Build
/// stamps store one of these per task so a later process can tell whether the
/// task's inputs changed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Incremental hasher that folds many labelled inputs into one [`ContentHash`].
///
/// Every chunk is length-prefixed, so `("ab", "c")` and `("a", "bc")` hash
/// differently.
pub struct ContentHasher {
    state: Xxh3,
    chunks: usize,
}

impl ContentHasher {
    /// Creates an empty hasher.
    pub fn new() -> Self {
        Self {
            state: Xxh3::new(),
            chunks: 0,
        }
    }

    /// Feeds one chunk of input.
    pub fn update(&mut self, data: &[u8]) {
        self.state.update(&(data.len() as u64).to_le_bytes());
        self.state.update(data);
        self.chunks += 1;
    }

    /// Feeds a string chunk.
    pub fn update_str(&mut self, data: &str) {
        self.update(data.as_bytes());
    }

    /// Number of chunks fed so far.
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    /// Finishes hashing.
    pub fn finish(&self) -> ContentHash {
        ContentHash(self.state.digest128().to_le_bytes())
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Marker string whose digest is the origin link of every Canon hash chain.
pub const GENESIS_MARKER: &str = "OMEGA_CANON_GENESIS_V1";

/// `sha256(GENESIS_MARKER)`, hex encoded.
pub const GENESIS_HASH: &str = "d22a2a73bac4336843d0bb4e083bab9b5bad2818da1b70ac5cd1458015f34f42";

/// Hex-encoded SHA-256 digest (64 lowercase characters).
///
/// Facts, audit entries, Merkle roots, and export blobs are all identified by
/// a `ContentHash`. It serializes as a bare string so exported JSON stays
/// readable and diffable.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// SHA-256 of raw bytes.
    pub fn of(data: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(data)))
    }

    /// The genesis link shared by the fact chain and the audit chain.
    pub fn genesis() -> Self {
        Self(GENESIS_HASH.to_string())
    }

    /// Returns `true` if this is the genesis link.
    pub fn is_genesis(&self) -> bool {
        self.0 == GENESIS_HASH
    }

    /// Wrap an already computed hex digest without checking it.
    ///
    /// Used when reading records back; integrity checks recompute digests
    /// rather than trusting stored ones.
    pub fn from_hex_unchecked(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Parse a 64-character hex digest.
    pub fn parse(s: &str) -> Option<Self> {
        let valid = s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit());
        valid.then(|| Self(s.to_ascii_lowercase()))
    }

    /// The hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 hex characters, used inside identifiers and log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}

impl Default for ContentHash {
    fn default() -> Self {
        Self::genesis()
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.short())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ContentHash {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ContentHash {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

//! Hashing Primitives
//!
//! Provides the SHA-256 based digests the engine depends on:
//! - Bet commitments (`secret ‖ salt`)
//! - Per-roll seeds (`secret ‖ entropy ‖ roll index`)
//! - Simulated entropy values for the in-memory chain

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

/// Raw 256-bit digest.
pub type Hash32 = [u8; 32];

/// A 32-byte digest with hex formatting.
///
/// Used for commitment hashes and entropy values. The all-zero value is
/// reserved as "absent" and never accepted as a commitment.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Digest32(pub Hash32);

impl Digest32 {
    /// The all-zero digest.
    pub const ZERO: Digest32 = Digest32([0; 32]);

    /// Wrap raw bytes.
    pub const fn new(bytes: Hash32) -> Self {
        Self(bytes)
    }

    /// Check for the reserved zero value.
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 32]
    }

    /// Borrow raw bytes.
    pub fn as_bytes(&self) -> &Hash32 {
        &self.0
    }

    /// Lowercase hex with `0x` prefix.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl From<Hash32> for Digest32 {
    fn from(bytes: Hash32) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Debug for Digest32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Digest32({})", self.to_hex())
    }
}

impl std::fmt::Display for Digest32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Incremental SHA-256 hasher.
///
/// Order of updates is part of the wire contract: clients recompute
/// commitments and roll seeds off-engine and must feed the same bytes.
pub struct EngineHasher {
    hasher: Sha256,
}

impl EngineHasher {
    /// Create a hasher with no prefix.
    pub fn new() -> Self {
        Self { hasher: Sha256::new() }
    }

    /// Create a hasher with a domain separator.
    pub fn with_domain(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Finalize and return the digest.
    pub fn finalize(self) -> Hash32 {
        self.hasher.finalize().into()
    }
}

impl Default for EngineHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute a simple hash of arbitrary data.
pub fn hash_bytes(data: &[u8]) -> Hash32 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

// =============================================================================
// TESTS
// =============================================================================

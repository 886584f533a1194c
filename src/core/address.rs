//! Account Addresses
//!
//! 20-byte account identifiers shared by the engine, the token ledger and
//! callers. Implements `Ord` so ledgers keyed by address iterate in a
//! deterministic order.

use serde::{Deserialize, Serialize};

/// An account address (20 bytes).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address. Never a valid owner, successor or destination.
    pub const ZERO: Address = Address([0; 20]);

    /// Sink that receives burned tokens (`0x…dEaD`).
    pub const BURN_SINK: Address = Address([
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xde, 0xad,
    ]);

    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Build a short test/demo address whose last byte is `tag`.
    pub const fn from_low_u8(tag: u8) -> Self {
        let mut bytes = [0u8; 20];
        bytes[0] = 0x10;
        bytes[19] = tag;
        Self(bytes)
    }

    /// Parse from hex, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).ok()?;
        let bytes: [u8; 20] = bytes.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Check for the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 20]
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase hex with `0x` prefix.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

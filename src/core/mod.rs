//! Core primitives.
//!
//! Leaf types with no engine state: addresses, digests and the roll
//! randomness rule. Everything here is deterministic.

pub mod address;
pub mod hash;
pub mod randomness;

// Re-export core types
pub use address::Address;
pub use hash::{Digest32, Hash32};
pub use randomness::{check_win, RollReport, Salt, Secret};

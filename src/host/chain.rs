//! Ledger Position, Clock and Delayed Entropy
//!
//! [`ChainView`] is what the engine reads from its host: the current
//! position, the current time and the entropy oracle. The oracle follows
//! a commit-then-delayed-reveal shape: the value for position `p` does
//! not exist while `current <= p`, is fixed once the chain moves past
//! `p`, and is gone for good once `current - p > REVEAL_WINDOW`.

use serde::{Deserialize, Serialize};

use crate::core::hash::{Digest32, EngineHasher, Hash32};
use crate::REVEAL_WINDOW;

/// Domain separator for simulated entropy.
const ENTROPY_DOMAIN: &[u8] = b"WAGER_ENTROPY_V1";

/// Read-only host context.
pub trait ChainView {
    /// Current ledger position (block height or equivalent).
    fn position(&self) -> u64;

    /// Current time, unix seconds.
    fn timestamp(&self) -> u64;

    /// Entropy value for `position`, if it is currently retrievable.
    fn entropy_at(&self, position: u64) -> Option<Digest32>;
}

/// Deterministic in-memory chain.
///
/// Entropy for position `p` is `sha256(domain ‖ seed ‖ p)`, which nobody
/// can observe through [`ChainView`] until the chain has advanced past
/// `p`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulatedChain {
    seed: Hash32,
    position: u64,
    timestamp: u64,
    seconds_per_position: u64,
}

impl SimulatedChain {
    /// Start at position 0 and time `genesis_time`.
    pub fn new(seed: Hash32, genesis_time: u64) -> Self {
        Self {
            seed,
            position: 0,
            timestamp: genesis_time,
            seconds_per_position: 12,
        }
    }

    /// Override the time step applied by [`advance`](Self::advance).
    pub fn with_block_time(mut self, seconds: u64) -> Self {
        self.seconds_per_position = seconds;
        self
    }

    /// Move forward `positions`, advancing the clock proportionally.
    pub fn advance(&mut self, positions: u64) {
        self.position = self.position.saturating_add(positions);
        self.timestamp = self
            .timestamp
            .saturating_add(positions.saturating_mul(self.seconds_per_position));
    }

    /// Move the clock forward without producing positions.
    pub fn advance_time(&mut self, seconds: u64) {
        self.timestamp = self.timestamp.saturating_add(seconds);
    }

    /// The value position `p` resolves to, ignoring availability.
    fn raw_entropy(&self, position: u64) -> Digest32 {
        let mut hasher = EngineHasher::with_domain(ENTROPY_DOMAIN);
        hasher.update_bytes(&self.seed);
        hasher.update_u64(position);
        Digest32::new(hasher.finalize())
    }
}

impl ChainView for SimulatedChain {
    fn position(&self) -> u64 {
        self.position
    }

    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn entropy_at(&self, position: u64) -> Option<Digest32> {
        if position >= self.position || self.position - position > REVEAL_WINDOW {
            return None;
        }
        Some(self.raw_entropy(position))
    }
}

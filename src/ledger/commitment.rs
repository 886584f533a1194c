//! Bet Commitment Protocol
//!
//! The bettor commits to `sha256(domain ‖ secret ‖ salt)` when staking and
//! discloses `secret` and `salt` at reveal. The entropy value that decides
//! the rolls does not exist until after the commit position, and stays
//! retrievable only for `REVEAL_WINDOW` positions.

use serde::{Deserialize, Serialize};

use crate::core::hash::{Digest32, EngineHasher};
use crate::core::randomness::{check_win, RollReport, Salt, Secret};
use crate::error::EngineError;
use crate::REVEAL_WINDOW;

/// Domain separator for commitments.
const COMMITMENT_DOMAIN: &[u8] = b"WAGER_COMMIT_V1";

/// Compute the commitment for a secret/salt pair.
pub fn commitment_hash(secret: &Secret, salt: &Salt) -> Digest32 {
    let mut hasher = EngineHasher::with_domain(COMMITMENT_DOMAIN);
    hasher.update_bytes(secret);
    hasher.update_bytes(salt);
    Digest32::new(hasher.finalize())
}

/// Positions during which a bet's entropy value is retrievable.
///
/// Both ends are inclusive: `opens_at = commit + 1`,
/// `closes_at = commit + REVEAL_WINDOW`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealWindow {
    /// First position at which the entropy value exists.
    pub opens_at: u64,
    /// Last position at which the entropy value is retrievable.
    pub closes_at: u64,
}

impl RevealWindow {
    /// Window for a bet committed at `commit_position`.
    pub fn after_commit(commit_position: u64) -> Self {
        Self {
            opens_at: commit_position.saturating_add(1),
            closes_at: commit_position.saturating_add(REVEAL_WINDOW),
        }
    }

    /// Check if a position is inside the window.
    pub fn contains(&self, position: u64) -> bool {
        position >= self.opens_at && position <= self.closes_at
    }

    /// Fail with the matching timing error when outside the window.
    pub fn check(&self, current: u64) -> Result<(), EngineError> {
        if self.contains(current) {
            return Ok(());
        }
        if current < self.opens_at {
            return Err(EngineError::TooEarly { opens_at: self.opens_at, current });
        }
        Err(EngineError::Expired { deadline: self.closes_at, current })
    }
}

/// Client-side preimage of a commitment.
///
/// Generated and kept by the bettor; the engine only ever sees the
/// commitment until reveal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetTicket {
    /// Secret mixed into every roll seed.
    pub secret: Secret,
    /// Salt mixed into the commitment only.
    pub salt: Salt,
}

impl BetTicket {
    /// Create a ticket from a secret and salt.
    pub fn new(secret: Secret, salt: Salt) -> Self {
        Self { secret, salt }
    }

    /// Commitment to submit with the bet.
    pub fn commitment(&self) -> Digest32 {
        commitment_hash(&self.secret, &self.salt)
    }

    /// Verify that this ticket opens a stored commitment.
    pub fn verify(&self, commitment: &Digest32) -> bool {
        self.commitment() == *commitment
    }

    /// Evaluate the rolls off-engine once the entropy value is known.
    pub fn preview(&self, entropy: &Digest32, multiplier: u32, roll_count: u8) -> RollReport {
        check_win(&self.secret, entropy, multiplier, roll_count)
    }

    /// Attach the engine-assigned identity after the commit confirms.
    pub fn into_receipt(self, bet_index: u64, commit_position: u64) -> BetReceipt {
        BetReceipt {
            ticket: self,
            bet_index,
            commit_position,
        }
    }
}

/// What a client must persist durably as soon as a commit confirms.
///
/// Losing this record means the bet can never be revealed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetReceipt {
    /// Secret and salt.
    pub ticket: BetTicket,
    /// Index assigned by the ledger.
    pub bet_index: u64,
    /// Position whose entropy value resolves the bet.
    pub commit_position: u64,
}

impl BetReceipt {
    /// Window in which this receipt can be redeemed.
    pub fn window(&self) -> RevealWindow {
        RevealWindow::after_commit(self.commit_position)
    }
}

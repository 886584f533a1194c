//! Solvency Guard
//!
//! Prices the worst case of a candidate bet and decides whether the pool
//! can take it on. Two independent checks must both pass:
//!
//! ```text
//! (a) post_balance - reserved >= candidate     // can still pay everyone
//! (b) candidate <= post_balance / 5           // no single bet too large
//! ```
//!
//! `post_balance` is the pool balance after the stake has arrived and the
//! stake burn has left, so the candidate's own stake counts toward the
//! capacity that covers it.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::ledger::bet::Amount;
use crate::{CLAIM_BURN_PERCENT, HOUSE_EDGE_PERCENT, MAX_PAYOUT_DIVISOR, STAKE_BURN_PERCENT};

/// Payout for `wins` winning rolls, before any claim burn.
///
/// `stake × multiplier × (100 − edge) × wins / 100`, multiplying first.
pub fn payout_for_wins(stake: Amount, multiplier: u32, wins: u8) -> Result<Amount, EngineError> {
    stake
        .checked_mul(multiplier as Amount)
        .and_then(|v| v.checked_mul(100 - HOUSE_EDGE_PERCENT))
        .and_then(|v| v.checked_mul(wins as Amount))
        .map(|v| v / 100)
        .ok_or(EngineError::Overflow)
}

/// Payout for a single winning roll.
pub fn payout_per_win(stake: Amount, multiplier: u32) -> Result<Amount, EngineError> {
    payout_for_wins(stake, multiplier, 1)
}

/// Payout if every roll wins. This is what admission reserves.
pub fn worst_case_payout(
    stake: Amount,
    multiplier: u32,
    roll_count: u8,
) -> Result<Amount, EngineError> {
    payout_for_wins(stake, multiplier, roll_count)
}

/// Burn taken from the total stake at commit.
pub fn stake_burn(total_stake: Amount) -> Amount {
    total_stake * STAKE_BURN_PERCENT / 100
}

/// Burn taken from a payout at reveal.
pub fn claim_burn(payout: Amount) -> Amount {
    payout * CLAIM_BURN_PERCENT / 100
}

/// Largest worst case the pool could admit right now.
pub fn admissible_capacity(post_balance: Amount, reserved: Amount) -> Amount {
    let free = post_balance.saturating_sub(reserved);
    free.min(post_balance / MAX_PAYOUT_DIVISOR)
}

/// Admission decision for a candidate worst case.
pub fn admit(candidate: Amount, post_balance: Amount, reserved: Amount) -> Result<(), EngineError> {
    let available = admissible_capacity(post_balance, reserved);
    if candidate > available {
        return Err(EngineError::InsufficientCapacity {
            required: candidate,
            available,
        });
    }
    Ok(())
}

/// Payout figures for a prospective bet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutPreview {
    /// Gross payout per winning roll.
    pub per_win: Amount,
    /// Gross payout if every roll wins (the reservation).
    pub worst_case: Amount,
    /// Net to the bettor if every roll wins, after the claim burn.
    pub worst_case_net: Amount,
    /// Total tokens pulled at commit.
    pub total_stake: Amount,
    /// Burned from the stake at commit.
    pub stake_burn: Amount,
}

impl PayoutPreview {
    /// Compute every figure for a bet shape.
    pub fn compute(
        stake: Amount,
        multiplier: u32,
        roll_count: u8,
        claim_burn_enabled: bool,
    ) -> Result<Self, EngineError> {
        let per_win = payout_per_win(stake, multiplier)?;
        let worst_case = worst_case_payout(stake, multiplier, roll_count)?;
        let burn = if claim_burn_enabled { claim_burn(worst_case) } else { 0 };
        let total_stake = stake
            .checked_mul(roll_count as Amount)
            .ok_or(EngineError::Overflow)?;

        Ok(Self {
            per_win,
            worst_case,
            worst_case_net: worst_case - burn,
            total_stake,
            stake_burn: stake_burn(total_stake),
        })
    }
}

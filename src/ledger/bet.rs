//! Bet Records
//!
//! The stored bet and its closed value domains. Stake tiers and
//! multipliers are enums so that no value outside the enumerated sets can
//! ever be stored; the raw wire values are converted at the ledger edge.

use serde::{Deserialize, Serialize};

use crate::core::address::Address;
use crate::core::hash::Digest32;
use crate::{MAX_ROLLS, REVEAL_WINDOW};

/// Token amount in base units.
pub type Amount = u128;

// =============================================================================
// STAKE TIER
// =============================================================================

/// Allowed stake per roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum StakeTier {
    /// 100 units
    T100 = 0,
    /// 500 units
    T500 = 1,
    /// 1,000 units
    T1K = 2,
    /// 5,000 units
    T5K = 3,
    /// 10,000 units
    T10K = 4,
    /// 50,000 units
    T50K = 5,
    /// 100,000 units
    T100K = 6,
}

impl StakeTier {
    /// Every tier, smallest first.
    pub const ALL: [StakeTier; 7] = [
        StakeTier::T100,
        StakeTier::T500,
        StakeTier::T1K,
        StakeTier::T5K,
        StakeTier::T10K,
        StakeTier::T50K,
        StakeTier::T100K,
    ];

    /// Stake per roll in base units.
    pub fn amount(self) -> Amount {
        match self {
            StakeTier::T100 => 100,
            StakeTier::T500 => 500,
            StakeTier::T1K => 1_000,
            StakeTier::T5K => 5_000,
            StakeTier::T10K => 10_000,
            StakeTier::T50K => 50_000,
            StakeTier::T100K => 100_000,
        }
    }

    /// Look up the tier for an exact amount.
    pub fn from_amount(amount: Amount) -> Option<StakeTier> {
        Self::ALL.into_iter().find(|tier| tier.amount() == amount)
    }
}

// =============================================================================
// MULTIPLIER
// =============================================================================

/// Allowed payout odds. Every multiplier is a power of two; a roll wins
/// with probability `1 / multiplier`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Multiplier {
    /// 2x
    X2 = 1,
    /// 4x
    X4 = 2,
    /// 8x
    X8 = 3,
    /// 16x
    X16 = 4,
    /// 32x
    X32 = 5,
    /// 64x
    X64 = 6,
    /// 128x
    X128 = 7,
    /// 256x
    X256 = 8,
    /// 512x
    X512 = 9,
    /// 1024x
    X1024 = 10,
}

impl Multiplier {
    /// Every multiplier, lowest odds first.
    pub const ALL: [Multiplier; 10] = [
        Multiplier::X2,
        Multiplier::X4,
        Multiplier::X8,
        Multiplier::X16,
        Multiplier::X32,
        Multiplier::X64,
        Multiplier::X128,
        Multiplier::X256,
        Multiplier::X512,
        Multiplier::X1024,
    ];

    /// Numeric multiplier (`2^exponent`).
    #[inline]
    pub fn value(self) -> u32 {
        1u32 << (self as u8)
    }

    /// Look up the multiplier for an exact value.
    pub fn from_value(value: u32) -> Option<Multiplier> {
        Self::ALL.into_iter().find(|m| m.value() == value)
    }
}

// =============================================================================
// ROLL COUNT
// =============================================================================

/// Number of independent rolls in one bet, in `[1, MAX_ROLLS]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RollCount(u8);

impl RollCount {
    /// Validate a raw roll count.
    pub fn new(count: u8) -> Option<RollCount> {
        (1..=MAX_ROLLS).contains(&count).then_some(RollCount(count))
    }

    /// Raw count.
    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for RollCount {
    type Error = String;

    fn try_from(count: u8) -> Result<Self, Self::Error> {
        RollCount::new(count)
            .ok_or_else(|| format!("roll count {} outside [1, {}]", count, MAX_ROLLS))
    }
}

impl From<RollCount> for u8 {
    fn from(count: RollCount) -> u8 {
        count.0
    }
}

// =============================================================================
// BET
// =============================================================================

/// A committed bet.
///
/// Created only by a successful commit. `claimed` flips to `true` exactly
/// once, on a winning reveal or a forfeit, and never flips back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    /// Account that placed (and alone may settle) the bet.
    pub owner: Address,
    /// `sha256(domain ‖ secret ‖ salt)`.
    pub commitment: Digest32,
    /// Stake per roll.
    pub stake: StakeTier,
    /// Payout odds.
    pub multiplier: Multiplier,
    /// Number of rolls.
    pub roll_count: RollCount,
    /// Ledger position at admission; its entropy value resolves the bet.
    pub commit_position: u64,
    /// Settled by reveal or forfeit.
    pub claimed: bool,
}

impl Bet {
    /// Total tokens pulled from the owner (`stake × rolls`).
    pub fn total_stake(&self) -> Amount {
        self.stake.amount() * self.roll_count.get() as Amount
    }

    /// First position at which the bet may be revealed or forfeited.
    pub fn reveal_opens_at(&self) -> u64 {
        self.commit_position.saturating_add(1)
    }

    /// Last position at which the bet may be revealed.
    pub fn reveal_deadline(&self) -> u64 {
        self.commit_position.saturating_add(REVEAL_WINDOW)
    }

    /// Derived lifecycle status at a ledger position.
    pub fn status_at(&self, position: u64) -> BetStatus {
        if self.claimed {
            BetStatus::Claimed
        } else if position > self.reveal_deadline() {
            BetStatus::Expired
        } else {
            BetStatus::Active
        }
    }
}

/// Lifecycle status. Only `claimed` is stored; `Expired` is derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetStatus {
    /// Unclaimed and the reveal window has not closed.
    Active,
    /// Unclaimed and past the reveal window. Liability stays reserved
    /// until the owner forfeits.
    Expired,
    /// Settled by reveal or forfeit.
    Claimed,
}

/// Bet with its identity and derived status, as returned by views.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetView {
    /// Index in the owner's sequence.
    pub index: u64,
    /// The stored record.
    pub bet: Bet,
    /// Status at the position the view was taken.
    pub status: BetStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bet(commit_position: u64) -> Bet {
        Bet {
            owner: Address::from_low_u8(1),
            commitment: Digest32::new([9; 32]),
            stake: StakeTier::T1K,
            multiplier: Multiplier::X4,
            roll_count: RollCount::new(3).unwrap(),
            commit_position,
            claimed: false,
        }
    }

    #[test]
    fn test_stake_tier_lookup() {
        for tier in StakeTier::ALL {
            assert_eq!(StakeTier::from_amount(tier.amount()), Some(tier));
        }
        assert_eq!(StakeTier::from_amount(0), None);
        assert_eq!(StakeTier::from_amount(1_001), None);
    }

    #[test]
    fn test_multipliers_are_powers_of_two() {
        let values: Vec<u32> = Multiplier::ALL.iter().map(|m| m.value()).collect();
        assert_eq!(values, vec![2, 4, 8, 16, 32, 64, 128, 256, 512, 1024]);

        assert_eq!(Multiplier::from_value(1024), Some(Multiplier::X1024));
        assert_eq!(Multiplier::from_value(1), None);
        assert_eq!(Multiplier::from_value(3), None);
        assert_eq!(Multiplier::from_value(2048), None);
    }

    #[test]
    fn test_roll_count_bounds() {
        assert!(RollCount::new(0).is_none());
        assert_eq!(RollCount::new(1).map(RollCount::get), Some(1));
        assert_eq!(RollCount::new(MAX_ROLLS).map(RollCount::get), Some(MAX_ROLLS));
        assert!(RollCount::new(MAX_ROLLS + 1).is_none());
    }

    #[test]
    fn test_roll_count_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<RollCount>("5").is_ok());
        assert!(serde_json::from_str::<RollCount>("0").is_err());
        assert!(serde_json::from_str::<RollCount>("21").is_err());
    }

    #[test]
    fn test_status_transitions() {
        let mut bet = sample_bet(100);
        assert_eq!(bet.total_stake(), 3_000);
        assert_eq!(bet.reveal_opens_at(), 101);
        assert_eq!(bet.reveal_deadline(), 356);

        assert_eq!(bet.status_at(100), BetStatus::Active);
        assert_eq!(bet.status_at(356), BetStatus::Active);
        assert_eq!(bet.status_at(357), BetStatus::Expired);

        bet.claimed = true;
        assert_eq!(bet.status_at(357), BetStatus::Claimed);
    }
}

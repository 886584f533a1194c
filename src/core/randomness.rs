//! Roll Randomness
//!
//! Derives per-roll outcomes from a revealed secret and a delayed entropy
//! value. Pure functions only: clients evaluate the exact same rule
//! off-engine to learn whether a bet is worth revealing.
//!
//! ```text
//! seed_i = sha256(secret ‖ entropy ‖ i)      i in [0, roll_count)
//! win_i  = seed_i mod multiplier == 0
//! ```
//!
//! The secret is committed before the entropy value exists and the entropy
//! value is fixed before the secret is disclosed, so neither the bettor
//! nor whoever orders transactions can steer the result.

use serde::{Deserialize, Serialize};

use super::hash::{Digest32, EngineHasher, Hash32};

/// Bettor-chosen secret (kept client-side until reveal).
pub type Secret = [u8; 32];

/// Bettor-chosen salt mixed into the commitment.
pub type Salt = [u8; 32];

/// Outcome of evaluating every roll of a bet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollReport {
    /// Win flag per roll, in roll-index order.
    pub outcomes: Vec<bool>,
    /// Number of winning rolls.
    pub wins: u8,
}

impl RollReport {
    /// Did any roll win?
    pub fn any_win(&self) -> bool {
        self.wins > 0
    }
}

/// Derive the seed for one roll.
///
/// The roll index is appended as a little-endian `u32`.
pub fn roll_seed(secret: &Secret, entropy: &Digest32, roll_index: u32) -> Hash32 {
    let mut hasher = EngineHasher::new();
    hasher.update_bytes(secret);
    hasher.update_bytes(entropy.as_bytes());
    hasher.update_u32(roll_index);
    hasher.finalize()
}

/// Reduce a seed (big-endian 256-bit integer) modulo `modulus`.
///
/// Returns 0 for a zero modulus.
pub fn seed_mod(seed: &Hash32, modulus: u32) -> u32 {
    if modulus == 0 {
        return 0;
    }
    let m = modulus as u64;
    let rem = seed.iter().fold(0u64, |acc, byte| (acc * 256 + *byte as u64) % m);
    rem as u32
}

/// Check one seed against the odds. A zero multiplier never wins.
#[inline]
pub fn roll_wins(seed: &Hash32, multiplier: u32) -> bool {
    multiplier != 0 && seed_mod(seed, multiplier) == 0
}

/// Evaluate every roll of a bet.
pub fn check_win(
    secret: &Secret,
    entropy: &Digest32,
    multiplier: u32,
    roll_count: u8,
) -> RollReport {
    let outcomes: Vec<bool> = (0..roll_count as u32)
        .map(|i| roll_wins(&roll_seed(secret, entropy, i), multiplier))
        .collect();
    let wins = outcomes.iter().filter(|won| **won).count() as u8;

    RollReport { outcomes, wins }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hash::hash_bytes;

    fn entropy(tag: &[u8]) -> Digest32 {
        Digest32::new(hash_bytes(tag))
    }

    #[test]
    fn test_roll_seed_determinism() {
        let secret = [7u8; 32];
        let e = entropy(b"block");

        assert_eq!(roll_seed(&secret, &e, 3), roll_seed(&secret, &e, 3));
        assert_ne!(roll_seed(&secret, &e, 3), roll_seed(&secret, &e, 4));
        assert_ne!(roll_seed(&secret, &e, 3), roll_seed(&secret, &entropy(b"other"), 3));
    }

    #[test]
    fn test_seed_mod_matches_low_bits_for_powers_of_two() {
        let seed = hash_bytes(b"seed");
        let low = u16::from_be_bytes([seed[30], seed[31]]) as u32;

        for shift in 1..=10 {
            let m = 1u32 << shift;
            assert_eq!(seed_mod(&seed, m), low % m);
        }
    }

    #[test]
    fn test_seed_mod_small_values() {
        let mut seed = [0u8; 32];
        seed[31] = 10;
        assert_eq!(seed_mod(&seed, 4), 2);
        assert_eq!(seed_mod(&seed, 5), 0);

        seed[30] = 1; // 256 + 10 = 266
        assert_eq!(seed_mod(&seed, 7), 266 % 7);
        assert_eq!(seed_mod(&seed, 0), 0);
    }

    #[test]
    fn test_zero_multiplier_never_wins() {
        assert!(!roll_wins(&[0u8; 32], 0));
        assert!(roll_wins(&[0u8; 32], 2));
    }

    #[test]
    fn test_check_win_counts_outcomes() {
        let report = check_win(&[1u8; 32], &entropy(b"e"), 2, 20);

        assert_eq!(report.outcomes.len(), 20);
        assert_eq!(
            report.wins as usize,
            report.outcomes.iter().filter(|w| **w).count()
        );
        assert_eq!(report.any_win(), report.wins > 0);
    }

    #[test]
    fn test_even_odds_are_roughly_fair() {
        let e = entropy(b"fairness");
        let mut wins = 0u32;
        for i in 0..2000u32 {
            let mut secret = [0u8; 32];
            secret[..4].copy_from_slice(&i.to_le_bytes());
            if roll_wins(&roll_seed(&secret, &e, 0), 2) {
                wins += 1;
            }
        }
        assert!((850..=1150).contains(&wins), "wins = {}", wins);
    }
}

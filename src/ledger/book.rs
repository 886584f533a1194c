//! Bet Ledger
//!
//! Append-only arena of bets keyed by `(owner, index)` with a per-owner
//! counter. Nothing here iterates or copies an owner's full history:
//! lookups are keyed and scans are bounded.
//!
//! Mutations are journaled so an enclosing engine call can roll the
//! ledger back when a later step of the same call fails.

use std::collections::BTreeMap;

use crate::core::address::Address;
use crate::core::hash::Digest32;
use crate::error::EngineError;
use crate::ledger::bet::{Amount, Bet, BetView, Multiplier, RollCount, StakeTier};

/// Undo record for one ledger mutation.
#[derive(Clone, Copy, Debug)]
enum JournalEntry {
    Appended { owner: Address, index: u64 },
    Claimed { owner: Address, index: u64 },
}

/// Journal position to roll back to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerCheckpoint(usize);

/// Per-owner append-only bet store.
#[derive(Debug, Default)]
pub struct BetLedger {
    bets: BTreeMap<(Address, u64), Bet>,
    counts: BTreeMap<Address, u64>,
    journal: Vec<JournalEntry>,
}

impl BetLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a bet at the owner's next index.
    ///
    /// Moves no tokens and reserves nothing; the settlement engine calls
    /// this only after admission.
    pub fn place_bet(
        &mut self,
        owner: Address,
        commitment: Digest32,
        stake: Amount,
        multiplier: u32,
        roll_count: u8,
        commit_position: u64,
    ) -> Result<u64, EngineError> {
        let bet =
            Self::validate(owner, commitment, stake, multiplier, roll_count, commit_position)?;

        let index = self.bet_count(&owner);
        let next = index.checked_add(1).ok_or(EngineError::Overflow)?;

        self.bets.insert((owner, index), bet);
        self.counts.insert(owner, next);
        self.journal.push(JournalEntry::Appended { owner, index });

        Ok(index)
    }

    /// Build a bet from raw wire values, rejecting anything outside the
    /// enumerated domains.
    pub fn validate(
        owner: Address,
        commitment: Digest32,
        stake: Amount,
        multiplier: u32,
        roll_count: u8,
        commit_position: u64,
    ) -> Result<Bet, EngineError> {
        if commitment.is_zero() {
            return Err(EngineError::InvalidCommitment);
        }
        let stake = StakeTier::from_amount(stake).ok_or(EngineError::InvalidStake(stake))?;
        let multiplier =
            Multiplier::from_value(multiplier).ok_or(EngineError::InvalidMultiplier(multiplier))?;
        let roll_count =
            RollCount::new(roll_count).ok_or(EngineError::InvalidRollCount(roll_count))?;

        Ok(Bet {
            owner,
            commitment,
            stake,
            multiplier,
            roll_count,
            commit_position,
            claimed: false,
        })
    }

    /// Look up a bet.
    pub fn get_bet(&self, owner: &Address, index: u64) -> Option<&Bet> {
        self.bets.get(&(*owner, index))
    }

    /// Number of bets the owner has ever placed.
    pub fn bet_count(&self, owner: &Address) -> u64 {
        self.counts.get(owner).copied().unwrap_or(0)
    }

    /// Unclaimed bets, most recent first.
    ///
    /// Examines at most `scan_depth` of the owner's most recent bets and
    /// returns at most `limit` of them. Older unclaimed bets beyond the
    /// scan depth remain reachable through `get_bet`.
    pub fn get_active_bets(
        &self,
        owner: &Address,
        limit: usize,
        scan_depth: usize,
        position: u64,
    ) -> Vec<BetView> {
        let count = self.bet_count(owner);
        if count == 0 || limit == 0 {
            return Vec::new();
        }

        self.bets
            .range((*owner, 0)..=(*owner, count - 1))
            .rev()
            .take(scan_depth)
            .filter(|(_, bet)| !bet.claimed)
            .take(limit)
            .map(|((_, index), bet)| BetView {
                index: *index,
                bet: bet.clone(),
                status: bet.status_at(position),
            })
            .collect()
    }

    /// Single bet with its derived status.
    pub fn view(&self, owner: &Address, index: u64, position: u64) -> Option<BetView> {
        self.get_bet(owner, index).map(|bet| BetView {
            index,
            bet: bet.clone(),
            status: bet.status_at(position),
        })
    }

    /// Flip `claimed` to true. Fails if missing or already claimed.
    pub(crate) fn mark_claimed(&mut self, owner: &Address, index: u64) -> Result<Bet, EngineError> {
        let bet = self
            .bets
            .get_mut(&(*owner, index))
            .ok_or(EngineError::NoSuchBet { index })?;
        if bet.claimed {
            return Err(EngineError::AlreadyClaimed { index });
        }
        bet.claimed = true;
        self.journal.push(JournalEntry::Claimed { owner: *owner, index });
        Ok(bet.clone())
    }

    /// Current journal position.
    pub(crate) fn checkpoint(&self) -> LedgerCheckpoint {
        LedgerCheckpoint(self.journal.len())
    }

    /// Undo every mutation made since `checkpoint`, newest first.
    pub(crate) fn rollback(&mut self, checkpoint: LedgerCheckpoint) {
        while self.journal.len() > checkpoint.0 {
            let Some(entry) = self.journal.pop() else { break };
            match entry {
                JournalEntry::Appended { owner, index } => {
                    self.bets.remove(&(owner, index));
                    if index == 0 {
                        self.counts.remove(&owner);
                    } else {
                        self.counts.insert(owner, index);
                    }
                }
                JournalEntry::Claimed { owner, index } => {
                    if let Some(bet) = self.bets.get_mut(&(owner, index)) {
                        bet.claimed = false;
                    }
                }
            }
        }
    }

    /// Make every journaled mutation permanent.
    pub(crate) fn commit(&mut self) {
        self.journal.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::bet::BetStatus;

    fn alice() -> Address {
        Address::from_low_u8(0xA1)
    }

    fn commitment(tag: u8) -> Digest32 {
        Digest32::new([tag; 32])
    }

    fn place(ledger: &mut BetLedger, owner: Address, tag: u8) -> u64 {
        ledger
            .place_bet(owner, commitment(tag), 1_000, 2, 1, 10)
            .unwrap()
    }

    #[test]
    fn test_place_bet_assigns_sequential_indices() {
        let mut ledger = BetLedger::new();
        let bob = Address::from_low_u8(0xB0);

        assert_eq!(place(&mut ledger, alice(), 1), 0);
        assert_eq!(place(&mut ledger, alice(), 2), 1);
        assert_eq!(place(&mut ledger, bob, 3), 0);

        assert_eq!(ledger.bet_count(&alice()), 2);
        assert_eq!(ledger.bet_count(&bob), 1);
        assert_eq!(ledger.get_bet(&alice(), 1).unwrap().commitment, commitment(2));
        assert!(ledger.get_bet(&alice(), 2).is_none());
    }

    #[test]
    fn test_place_bet_validation() {
        let mut ledger = BetLedger::new();

        assert!(matches!(
            ledger.place_bet(alice(), Digest32::ZERO, 1_000, 2, 1, 0),
            Err(EngineError::InvalidCommitment)
        ));
        assert!(matches!(
            ledger.place_bet(alice(), commitment(1), 999, 2, 1, 0),
            Err(EngineError::InvalidStake(999))
        ));
        assert!(matches!(
            ledger.place_bet(alice(), commitment(1), 1_000, 3, 1, 0),
            Err(EngineError::InvalidMultiplier(3))
        ));
        assert!(matches!(
            ledger.place_bet(alice(), commitment(1), 1_000, 2, 0, 0),
            Err(EngineError::InvalidRollCount(0))
        ));
        assert!(matches!(
            ledger.place_bet(alice(), commitment(1), 1_000, 2, 21, 0),
            Err(EngineError::InvalidRollCount(21))
        ));

        // Nothing was stored
        assert_eq!(ledger.bet_count(&alice()), 0);
    }

    #[test]
    fn test_mark_claimed_is_monotonic() {
        let mut ledger = BetLedger::new();
        let index = place(&mut ledger, alice(), 1);

        assert!(ledger.mark_claimed(&alice(), index).is_ok());
        assert!(matches!(
            ledger.mark_claimed(&alice(), index),
            Err(EngineError::AlreadyClaimed { index: 0 })
        ));
        assert!(matches!(
            ledger.mark_claimed(&alice(), 9),
            Err(EngineError::NoSuchBet { index: 9 })
        ));
    }

    #[test]
    fn test_active_bets_most_recent_first() {
        let mut ledger = BetLedger::new();
        for tag in 0..5 {
            place(&mut ledger, alice(), tag + 1);
        }
        ledger.mark_claimed(&alice(), 3).unwrap();

        let active = ledger.get_active_bets(&alice(), 10, 200, 11);
        let indices: Vec<u64> = active.iter().map(|v| v.index).collect();
        assert_eq!(indices, vec![4, 2, 1, 0]);
        assert!(active.iter().all(|v| v.status == BetStatus::Active));

        let limited = ledger.get_active_bets(&alice(), 2, 200, 11);
        assert_eq!(limited.iter().map(|v| v.index).collect::<Vec<_>>(), vec![4, 2]);
    }

    #[test]
    fn test_active_scan_is_bounded() {
        let mut ledger = BetLedger::new();
        for tag in 0..10 {
            place(&mut ledger, alice(), tag + 1);
        }
        // Newest three are settled; a depth-3 scan finds nothing even
        // though older bets are open.
        for index in 7..10 {
            ledger.mark_claimed(&alice(), index).unwrap();
        }

        assert!(ledger.get_active_bets(&alice(), 10, 3, 11).is_empty());
        assert_eq!(ledger.get_active_bets(&alice(), 10, 4, 11).len(), 1);
    }

    #[test]
    fn test_active_bets_report_expiry() {
        let mut ledger = BetLedger::new();
        place(&mut ledger, alice(), 1);

        let views = ledger.get_active_bets(&alice(), 10, 200, 10 + 257);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].status, BetStatus::Expired);
    }

    #[test]
    fn test_rollback_undoes_appends_and_claims() {
        let mut ledger = BetLedger::new();
        place(&mut ledger, alice(), 1);
        ledger.commit();

        let checkpoint = ledger.checkpoint();
        place(&mut ledger, alice(), 2);
        ledger.mark_claimed(&alice(), 0).unwrap();
        ledger.mark_claimed(&alice(), 1).unwrap();

        ledger.rollback(checkpoint);

        assert_eq!(ledger.bet_count(&alice()), 1);
        assert!(ledger.get_bet(&alice(), 1).is_none());
        assert!(!ledger.get_bet(&alice(), 0).unwrap().claimed);

        // Index is reused after rollback
        assert_eq!(place(&mut ledger, alice(), 3), 1);
    }

    #[test]
    fn test_rollback_of_first_bet_clears_counter() {
        let mut ledger = BetLedger::new();
        let checkpoint = ledger.checkpoint();
        place(&mut ledger, alice(), 1);
        ledger.rollback(checkpoint);

        assert_eq!(ledger.bet_count(&alice()), 0);
        assert!(ledger.get_active_bets(&alice(), 10, 200, 0).is_empty());
    }
}

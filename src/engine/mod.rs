//! Settlement Engine
//!
//! [`WagerEngine`] is the single owned store: the bet ledger, the pool's
//! reserved liability and counters, treasury and authority state, and the
//! event buffer. It borrows nothing; the token and chain adapters are
//! owned too. The token adapter is only readable from outside: minting
//! and approvals happen on the token before it is handed to
//! [`WagerEngine::new`].
//!
//! Every entry point runs through [`WagerEngine::atomically`], which
//! rejects re-entry, checkpoints all four stores and restores them if the
//! operation fails or leaves the pool holding less than it has reserved.
//! Entry points live in the submodules:
//!
//! - `settlement`: commit, reveal, batch reveal, forfeit, fund
//! - `treasury`: delayed withdrawal and the pause switch
//! - `ownership`: two-step transfer and renouncement

pub mod events;
pub mod guard;
pub mod ownership;
pub mod settlement;
pub mod treasury;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::core::address::Address;
use crate::error::EngineError;
use crate::host::chain::ChainView;
use crate::host::token::TokenLedger;
use crate::ledger::bet::{Amount, BetView, Multiplier, RollCount, StakeTier};
use crate::ledger::book::BetLedger;

pub use events::{BurnSource, EngineEvent, EngineEventData};
pub use guard::PayoutPreview;
pub use settlement::RevealOutcome;
pub use treasury::{WithdrawalPhase, WithdrawalRequest, WithdrawalStatus};

/// Lifetime pool counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Bets admitted.
    pub bets_placed: u64,
    /// Bets settled by a winning reveal.
    pub bets_won: u64,
    /// Bets settled by forfeit.
    pub bets_forfeited: u64,
    /// Winning rolls across all reveals.
    pub rolls_won: u64,
    /// Net tokens sent to winners.
    pub tokens_paid_out: Amount,
    /// Tokens sent to the burn sink (stake and claim burns).
    pub tokens_burned: Amount,
    /// Tokens pulled in as stakes.
    pub tokens_staked: Amount,
}

/// Engine-owned mutable state other than the ledger. Small enough to
/// snapshot whole at every entry point.
#[derive(Clone, Debug, Default)]
struct PoolState {
    reserved: Amount,
    stats: PoolStats,
    paused: bool,
    withdrawal: Option<WithdrawalRequest>,
    owner: Option<Address>,
    pending_owner: Option<Address>,
}

/// The wagering engine.
pub struct WagerEngine<T: TokenLedger, C: ChainView> {
    address: Address,
    config: EngineConfig,
    token: T,
    chain: C,
    ledger: BetLedger,
    state: PoolState,
    events: Vec<EngineEvent>,
    entered: bool,
}

impl<T: TokenLedger, C: ChainView> WagerEngine<T, C> {
    /// Create an engine whose pool account is `address`.
    ///
    /// The pool starts empty, unpaused and owned by `owner`. Liquidity
    /// arrives through [`fund`](Self::fund).
    pub fn new(
        address: Address,
        owner: Address,
        token: T,
        chain: C,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        if address.is_zero() || address == Address::BURN_SINK || owner.is_zero() {
            return Err(EngineError::InvalidAddress);
        }

        info!(
            pool = %address,
            owner = %owner,
            cooldown_secs = config.withdraw_cooldown_secs,
            claim_burn = config.claim_burn_enabled,
            "Wager engine created"
        );

        Ok(Self {
            address,
            config,
            token,
            chain,
            ledger: BetLedger::new(),
            state: PoolState {
                owner: Some(owner),
                ..PoolState::default()
            },
            events: Vec::new(),
            entered: false,
        })
    }

    /// Run `op` as one atomic unit.
    ///
    /// On `Err` the pool state, bet ledger, token ledger and event buffer
    /// are restored to what they were before the call. An `Ok` that would
    /// leave the balance below the reserved liability is turned into
    /// [`EngineError::Insolvent`] and restored the same way.
    pub(crate) fn atomically<R>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<R, EngineError>,
    ) -> Result<R, EngineError> {
        if self.entered {
            return Err(EngineError::Reentrant);
        }
        self.entered = true;

        let state = self.state.clone();
        let ledger_mark = self.ledger.checkpoint();
        let token_mark = self.token.checkpoint();
        let events_len = self.events.len();

        let result = op(self).and_then(|value| {
            let balance = self.pool_balance();
            if balance < self.state.reserved {
                return Err(EngineError::Insolvent {
                    balance,
                    reserved: self.state.reserved,
                });
            }
            Ok(value)
        });

        match &result {
            Ok(_) => {
                self.ledger.commit();
                self.token.commit();
            }
            Err(err) => {
                self.state = state;
                self.ledger.rollback(ledger_mark);
                self.token.rollback(token_mark);
                self.events.truncate(events_len);
                debug!(error = %err, kind = ?err.kind(), "Operation rolled back");
            }
        }

        self.entered = false;
        result
    }

    fn emit(&mut self, event: EngineEvent) {
        debug!(event = event.name(), position = event.position, "Event");
        self.events.push(event);
    }

    // =========================================================================
    // VIEWS
    // =========================================================================

    /// Pool account on the token ledger.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Tokens currently held by the pool.
    pub fn pool_balance(&self) -> Amount {
        self.token.balance_of(&self.address)
    }

    /// Sum of worst-case payouts over unclaimed bets.
    pub fn reserved_liability(&self) -> Amount {
        self.state.reserved
    }

    /// Balance not backing any reservation.
    pub fn free_balance(&self) -> Amount {
        self.pool_balance().saturating_sub(self.state.reserved)
    }

    /// One bet with its derived status.
    pub fn get_bet(&self, owner: &Address, index: u64) -> Option<BetView> {
        self.ledger.view(owner, index, self.chain.position())
    }

    /// Up to `limit` unclaimed bets, most recent first, from a bounded scan.
    pub fn get_active_bets(&self, owner: &Address, limit: usize) -> Vec<BetView> {
        self.ledger.get_active_bets(
            owner,
            limit,
            self.config.active_scan_depth,
            self.chain.position(),
        )
    }

    /// Number of bets `owner` has placed.
    pub fn bet_count(&self, owner: &Address) -> u64 {
        self.ledger.bet_count(owner)
    }

    /// Payout figures for a prospective bet.
    pub fn preview_payout(
        &self,
        stake: Amount,
        multiplier: u32,
        roll_count: u8,
    ) -> Result<PayoutPreview, EngineError> {
        StakeTier::from_amount(stake).ok_or(EngineError::InvalidStake(stake))?;
        Multiplier::from_value(multiplier).ok_or(EngineError::InvalidMultiplier(multiplier))?;
        RollCount::new(roll_count).ok_or(EngineError::InvalidRollCount(roll_count))?;

        PayoutPreview::compute(stake, multiplier, roll_count, self.config.claim_burn_enabled)
    }

    /// Highest multiplier a commit of this stake and roll count would be
    /// admitted at right now, or `None` if even the lowest would be
    /// rejected.
    pub fn max_affordable_multiplier(
        &self,
        stake: Amount,
        roll_count: u8,
    ) -> Result<Option<u32>, EngineError> {
        StakeTier::from_amount(stake).ok_or(EngineError::InvalidStake(stake))?;
        RollCount::new(roll_count).ok_or(EngineError::InvalidRollCount(roll_count))?;

        let total = stake
            .checked_mul(roll_count as Amount)
            .ok_or(EngineError::Overflow)?;
        let post = self
            .pool_balance()
            .checked_add(total - guard::stake_burn(total))
            .ok_or(EngineError::Overflow)?;

        for multiplier in Multiplier::ALL.into_iter().rev() {
            let candidate = guard::worst_case_payout(stake, multiplier.value(), roll_count)?;
            if guard::admit(candidate, post, self.state.reserved).is_ok() {
                return Ok(Some(multiplier.value()));
            }
        }
        Ok(None)
    }

    /// Lifetime counters.
    pub fn pool_stats(&self) -> PoolStats {
        self.state.stats
    }

    /// Current owner, `None` once renounced.
    pub fn owner(&self) -> Option<Address> {
        self.state.owner
    }

    /// Proposed successor, if any.
    pub fn pending_owner(&self) -> Option<Address> {
        self.state.pending_owner
    }

    /// Are new bets paused?
    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Buffered events, oldest first.
    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    /// Take every buffered event.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Bet ledger, read-only.
    pub fn ledger(&self) -> &BetLedger {
        &self.ledger
    }

    /// Token adapter.
    pub fn token(&self) -> &T {
        &self.token
    }

    #[cfg(test)]
    pub(crate) fn token_mut(&mut self) -> &mut T {
        &mut self.token
    }

    /// Chain adapter.
    pub fn chain(&self) -> &C {
        &self.chain
    }

    /// Chain adapter, for advancing position and time.
    pub fn chain_mut(&mut self) -> &mut C {
        &mut self.chain
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::host::chain::SimulatedChain;
    use crate::host::token::InMemoryToken;

    #[test]
    fn test_new_rejects_bad_addresses_and_config() {
        let build = |pool: Address, owner: Address, config: EngineConfig| {
            WagerEngine::new(
                pool,
                owner,
                InMemoryToken::new(),
                SimulatedChain::new([0; 32], 0),
                config,
            )
        };

        assert!(matches!(
            build(Address::ZERO, OWNER, EngineConfig::default()),
            Err(EngineError::InvalidAddress)
        ));
        assert!(matches!(
            build(POOL, Address::ZERO, EngineConfig::default()),
            Err(EngineError::InvalidAddress)
        ));
        assert!(matches!(
            build(Address::BURN_SINK, OWNER, EngineConfig::default()),
            Err(EngineError::InvalidAddress)
        ));

        let mut config = EngineConfig::default();
        config.active_scan_depth = 0;
        assert!(matches!(build(POOL, OWNER, config), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_fresh_engine_views() {
        let engine = engine(1_000_000);

        assert_eq!(engine.pool_balance(), 1_000_000);
        assert_eq!(engine.reserved_liability(), 0);
        assert_eq!(engine.free_balance(), 1_000_000);
        assert_eq!(engine.owner(), Some(OWNER));
        assert_eq!(engine.pending_owner(), None);
        assert!(!engine.is_paused());
        assert_eq!(engine.bet_count(&ALICE), 0);
        assert!(engine.get_active_bets(&ALICE, 10).is_empty());
        assert_eq!(engine.pool_stats(), PoolStats::default());
    }

    #[test]
    fn test_reentrant_call_rejected_and_rolled_back() {
        let mut engine = engine(10_000_000);
        let balance = engine.pool_balance();

        let result = engine.atomically(|inner| {
            inner.state.reserved = 42;
            commit(inner, ALICE, 1, 1_000, 2, 1)
        });

        assert!(matches!(result, Err(EngineError::Reentrant)));
        assert_eq!(engine.reserved_liability(), 0);
        assert_eq!(engine.pool_balance(), balance);
        assert_eq!(engine.bet_count(&ALICE), 0);

        // Guard is released afterwards
        assert!(commit(&mut engine, ALICE, 1, 1_000, 2, 1).is_ok());
    }

    #[test]
    fn test_failed_call_leaves_no_events() {
        let mut engine = engine(10_000_000);
        let result = engine.atomically(|inner| {
            inner.emit(EngineEvent::new(0, EngineEventData::PauseToggled { paused: true }));
            Err::<(), _>(EngineError::Overflow)
        });

        assert!(result.is_err());
        assert!(engine.events().is_empty());
    }

    #[test]
    fn test_underfunded_result_is_rolled_back() {
        let mut engine = engine(10_000_000);
        commit(&mut engine, ALICE, 1, 1_000, 64, 5).unwrap();
        let balance = engine.pool_balance();
        let reserved = engine.reserved_liability();

        // An operation that would hand out reserved funds never lands
        let result = engine.atomically(|inner| {
            let pool = inner.address;
            inner.token.transfer(&pool, &BOB, balance)?;
            Ok(())
        });

        assert!(matches!(
            result,
            Err(EngineError::Insolvent { balance: 0, reserved: r }) if r == reserved
        ));
        assert_eq!(engine.pool_balance(), balance);
        assert_eq!(engine.reserved_liability(), reserved);
    }

    #[test]
    fn test_drained_pool_refuses_further_calls() {
        let mut engine = engine(10_000_000);
        commit(&mut engine, ALICE, 1, 1_000, 64, 5).unwrap();
        let reserved = engine.reserved_liability();

        // Funds leave the pool behind the engine's back
        let balance = engine.pool_balance();
        engine.token_mut().transfer(&POOL, &BOB, balance).unwrap();
        engine.token_mut().commit();
        engine.drain_events();

        assert!(matches!(engine.fund(OWNER, 1_000), Err(EngineError::Insolvent { .. })));
        assert_eq!(engine.pool_balance(), 0);
        assert!(engine.events().is_empty());

        // Topping the pool back up over the reservation restores service
        engine.fund(OWNER, reserved).unwrap();
        assert!(engine.pool_balance() >= engine.reserved_liability());
    }

    #[test]
    fn test_preview_payout_validates_domains() {
        let engine = engine(1_000_000);

        let preview = engine.preview_payout(10_000, 1024, 1).unwrap();
        assert_eq!(preview.worst_case, 10_035_200);

        assert!(matches!(engine.preview_payout(10_001, 2, 1), Err(EngineError::InvalidStake(_))));
        assert!(matches!(engine.preview_payout(100, 6, 1), Err(EngineError::InvalidMultiplier(6))));
        assert!(matches!(
            engine.preview_payout(100, 2, 21),
            Err(EngineError::InvalidRollCount(21))
        ));
    }

    #[test]
    fn test_max_affordable_multiplier() {
        // Pool of 1,000,000; stake 1,000 × 1 roll arrives (990 net):
        // post = 1,000,990, cap = post / 5 = 200,198.
        // 128x → 125,440 fits, 256x → 250,880 does not.
        let engine = engine(1_000_000);
        assert_eq!(engine.max_affordable_multiplier(1_000, 1).unwrap(), Some(128));

        let empty = super::testing::engine(0);
        assert_eq!(empty.max_affordable_multiplier(100_000, 20).unwrap(), None);
    }

    #[test]
    fn test_max_affordable_multiplier_agrees_with_commit() {
        let mut engine = engine(1_000_000);
        let best = engine.max_affordable_multiplier(1_000, 1).unwrap().unwrap();

        assert!(matches!(
            commit(&mut engine, ALICE, 1, 1_000, best * 2, 1),
            Err(EngineError::InsufficientCapacity { .. })
        ));
        assert!(commit(&mut engine, ALICE, 1, 1_000, best, 1).is_ok());
    }
}

#[cfg(test)]
mod solvency {
    //! Random operation sequences against the global invariants.

    use std::collections::BTreeMap;

    use super::testing::*;
    use super::*;
    use crate::ledger::bet::Bet;
    use proptest::prelude::*;

    #[derive(Clone, Debug)]
    enum Op {
        Commit { bettor: usize, stake: usize, multiplier: usize, rolls: u8 },
        Reveal { bettor: usize, pick: usize },
        Forfeit { bettor: usize, pick: usize },
        Advance(u64),
        Fund(Amount),
        RequestWithdraw,
        CancelWithdraw,
        ExecuteWithdraw,
        Unpause,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0..2usize, 0..7usize, 0..10usize, 1..=20u8).prop_map(
                |(bettor, stake, multiplier, rolls)| Op::Commit { bettor, stake, multiplier, rolls }
            ),
            3 => (0..2usize, 0..64usize).prop_map(|(bettor, pick)| Op::Reveal { bettor, pick }),
            1 => (0..2usize, 0..64usize).prop_map(|(bettor, pick)| Op::Forfeit { bettor, pick }),
            2 => (1..300u64).prop_map(Op::Advance),
            1 => (1..5_000_000u128).prop_map(Op::Fund),
            1 => Just(Op::RequestWithdraw),
            1 => Just(Op::CancelWithdraw),
            1 => Just(Op::ExecuteWithdraw),
            1 => Just(Op::Unpause),
        ]
    }

    fn worst_case(bet: &Bet) -> Amount {
        guard::worst_case_payout(bet.stake.amount(), bet.multiplier.value(), bet.roll_count.get())
            .unwrap()
    }

    fn outstanding(engine: &TestEngine, bettors: &[Address]) -> Amount {
        bettors
            .iter()
            .flat_map(|who| (0..engine.bet_count(who)).map(move |i| (who, i)))
            .filter_map(|(who, i)| engine.ledger().get_bet(who, i))
            .filter(|bet| !bet.claimed)
            .map(worst_case)
            .sum()
    }

    #[derive(Debug, PartialEq)]
    struct Snapshot {
        pool: Amount,
        reserved: Amount,
        supply: Amount,
        bets: Vec<u64>,
        paused: bool,
    }

    fn snapshot(engine: &TestEngine, bettors: &[Address]) -> Snapshot {
        Snapshot {
            pool: engine.pool_balance(),
            reserved: engine.reserved_liability(),
            supply: engine.token().sum_of_balances(),
            bets: bettors.iter().map(|who| engine.bet_count(who)).collect(),
            paused: engine.is_paused(),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_solvency_holds_for_any_sequence(
            ops in prop::collection::vec(op_strategy(), 1..60)
        ) {
            let bettors = [ALICE, BOB];
            let mut engine = engine(2_000_000);
            let mut next_tag = 0u8;
            let mut tags: BTreeMap<(Address, u64), u8> = BTreeMap::new();
            let supply = engine.token().total_supply();

            for op in ops {
                let before = snapshot(&engine, &bettors);
                let result = match op {
                    Op::Commit { bettor, stake, multiplier, rolls } => {
                        let who = bettors[bettor];
                        let tag = next_tag;
                        let r = commit(
                            &mut engine,
                            who,
                            tag,
                            StakeTier::ALL[stake].amount(),
                            Multiplier::ALL[multiplier].value(),
                            rolls,
                        );
                        if let Ok(index) = r {
                            tags.insert((who, index), tag);
                            next_tag = next_tag.wrapping_add(1);
                        }
                        r.map(|_| ())
                    }
                    Op::Reveal { bettor, pick } => {
                        let who = bettors[bettor];
                        let count = engine.bet_count(&who);
                        if count == 0 {
                            continue;
                        }
                        let index = pick as u64 % count;
                        let (secret, salt) = ticket(tags[&(who, index)]);
                        engine.reveal(who, index, &secret, &salt).map(|_| ())
                    }
                    Op::Forfeit { bettor, pick } => {
                        let who = bettors[bettor];
                        let count = engine.bet_count(&who);
                        if count == 0 {
                            continue;
                        }
                        engine.forfeit(who, pick as u64 % count).map(|_| ())
                    }
                    Op::Advance(n) => {
                        engine.chain_mut().advance(n);
                        engine.chain_mut().advance_time(n * 600);
                        Ok(())
                    }
                    Op::Fund(amount) => engine.fund(OWNER, amount),
                    Op::RequestWithdraw => engine.request_withdraw(OWNER, OWNER).map(|_| ()),
                    Op::CancelWithdraw => engine.cancel_withdraw(OWNER),
                    Op::ExecuteWithdraw => engine.execute_withdraw(OWNER).map(|_| ()),
                    Op::Unpause => engine.unpause(OWNER),
                };

                if result.is_err() {
                    prop_assert_eq!(snapshot(&engine, &bettors), before);
                }
                prop_assert!(engine.pool_balance() >= engine.reserved_liability());
                prop_assert_eq!(engine.reserved_liability(), outstanding(&engine, &bettors));
                prop_assert_eq!(engine.token().sum_of_balances(), supply);
            }
        }
    }
}

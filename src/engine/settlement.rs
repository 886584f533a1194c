//! Commit, reveal and forfeit.
//!
//! ```text
//! commit:  validate → pull stake → burn → admit → append → reserve
//! reveal:  lookup → window → hash → rolls → mark claimed → release → pay
//! forfeit: lookup → after commit → mark claimed → release
//! ```
//!
//! Outbound transfers (payouts, claim burns) are issued only after the
//! ledger and liability have been updated.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::events::{BurnSource, EngineEvent, EngineEventData};
use super::guard;
use super::WagerEngine;
use crate::core::address::Address;
use crate::core::hash::Digest32;
use crate::core::randomness::{check_win, Salt, Secret};
use crate::error::EngineError;
use crate::host::chain::ChainView;
use crate::host::token::TokenLedger;
use crate::ledger::bet::{Amount, Bet};
use crate::ledger::book::BetLedger;
use crate::ledger::commitment::{commitment_hash, RevealWindow};
use crate::MAX_BATCH_REVEAL;

/// Result of a winning reveal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealOutcome {
    /// Bet index.
    pub index: u64,
    /// Win flag per roll.
    pub outcomes: Vec<bool>,
    /// Winning rolls.
    pub wins: u8,
    /// Payout before the claim burn.
    pub gross_payout: Amount,
    /// Claim burn taken from the payout.
    pub burned: Amount,
    /// Tokens sent to the owner.
    pub net_payout: Amount,
}

impl<T: TokenLedger, C: ChainView> WagerEngine<T, C> {
    /// Stake on a commitment. Returns the new bet's index.
    ///
    /// Pulls `stake × roll_count` from `caller` (who must have approved
    /// the pool), burns the stake share, and admits the bet against the
    /// resulting balance.
    #[instrument(skip(self, commitment), fields(owner = %caller))]
    pub fn commit(
        &mut self,
        caller: Address,
        commitment: Digest32,
        stake: Amount,
        multiplier: u32,
        roll_count: u8,
    ) -> Result<u64, EngineError> {
        self.atomically(|engine| {
            engine.commit_inner(caller, commitment, stake, multiplier, roll_count)
        })
    }

    fn commit_inner(
        &mut self,
        caller: Address,
        commitment: Digest32,
        stake: Amount,
        multiplier: u32,
        roll_count: u8,
    ) -> Result<u64, EngineError> {
        if self.state.paused {
            return Err(EngineError::GamePaused);
        }
        if caller.is_zero() || caller == self.address {
            return Err(EngineError::InvalidAddress);
        }

        let position = self.chain.position();
        let bet = BetLedger::validate(caller, commitment, stake, multiplier, roll_count, position)?;
        let worst_case = guard::worst_case_payout(stake, multiplier, roll_count)?;
        let total_stake = bet.total_stake();
        let burn = guard::stake_burn(total_stake);

        let pool = self.address;
        self.token.transfer_from(&pool, &caller, &pool, total_stake)?;
        if burn > 0 {
            self.token.transfer(&pool, &Address::BURN_SINK, burn)?;
        }

        let post_balance = self.token.balance_of(&pool);
        if let Err(err) = guard::admit(worst_case, post_balance, self.state.reserved) {
            warn!(worst_case, post_balance, reserved = self.state.reserved, "Bet rejected");
            return Err(err);
        }

        let index = self
            .ledger
            .place_bet(caller, commitment, stake, multiplier, roll_count, position)?;

        self.state.reserved = self
            .state
            .reserved
            .checked_add(worst_case)
            .ok_or(EngineError::Overflow)?;
        let stats = &mut self.state.stats;
        stats.bets_placed += 1;
        stats.tokens_staked = stats
            .tokens_staked
            .checked_add(total_stake)
            .ok_or(EngineError::Overflow)?;
        stats.tokens_burned = stats.tokens_burned.checked_add(burn).ok_or(EngineError::Overflow)?;

        info!(
            index,
            stake,
            multiplier,
            roll_count,
            worst_case,
            reserved = self.state.reserved,
            "Bet placed"
        );

        self.emit(EngineEvent::bet_placed(
            position, caller, index, stake, multiplier, roll_count, worst_case,
        ));
        if burn > 0 {
            self.emit(EngineEvent::tokens_burned(position, BurnSource::Stake, burn));
        }

        Ok(index)
    }

    /// Reveal one bet and collect its winnings.
    ///
    /// Fails with `NoWinningRoll` when every roll lost; the bet then stays
    /// unclaimed and its reservation stays in place.
    #[instrument(skip(self, secret, salt), fields(owner = %caller))]
    pub fn reveal(
        &mut self,
        caller: Address,
        index: u64,
        secret: &Secret,
        salt: &Salt,
    ) -> Result<RevealOutcome, EngineError> {
        self.atomically(|engine| engine.reveal_inner(caller, index, secret, salt))
    }

    /// Reveal several bets in order as one unit. Any failure aborts the
    /// whole batch.
    #[instrument(skip(self, secrets, salts), fields(owner = %caller, len = indices.len()))]
    pub fn batch_reveal(
        &mut self,
        caller: Address,
        indices: &[u64],
        secrets: &[Secret],
        salts: &[Salt],
    ) -> Result<Vec<RevealOutcome>, EngineError> {
        if indices.len() != secrets.len() || indices.len() != salts.len() {
            return Err(EngineError::BatchLengthMismatch {
                indices: indices.len(),
                secrets: secrets.len(),
                salts: salts.len(),
            });
        }
        if indices.is_empty() {
            return Err(EngineError::EmptyBatch);
        }
        if indices.len() > MAX_BATCH_REVEAL {
            return Err(EngineError::BatchTooLarge {
                len: indices.len(),
                max: MAX_BATCH_REVEAL,
            });
        }

        self.atomically(|engine| {
            indices
                .iter()
                .zip(secrets)
                .zip(salts)
                .map(|((index, secret), salt)| engine.reveal_inner(caller, *index, secret, salt))
                .collect()
        })
    }

    /// Look up an unclaimed bet owned by `caller`.
    fn open_bet(&self, caller: &Address, index: u64) -> Result<Bet, EngineError> {
        let bet = self
            .ledger
            .get_bet(caller, index)
            .ok_or(EngineError::NoSuchBet { index })?;
        if bet.claimed {
            return Err(EngineError::AlreadyClaimed { index });
        }
        Ok(bet.clone())
    }

    fn release(&mut self, amount: Amount) -> Result<(), EngineError> {
        self.state.reserved = self
            .state
            .reserved
            .checked_sub(amount)
            .ok_or(EngineError::Overflow)?;
        Ok(())
    }

    fn reveal_inner(
        &mut self,
        caller: Address,
        index: u64,
        secret: &Secret,
        salt: &Salt,
    ) -> Result<RevealOutcome, EngineError> {
        let bet = self.open_bet(&caller, index)?;
        let position = self.chain.position();
        let window = RevealWindow::after_commit(bet.commit_position);
        window.check(position)?;

        if commitment_hash(secret, salt) != bet.commitment {
            return Err(EngineError::HashMismatch { index });
        }

        let entropy = self
            .chain
            .entropy_at(bet.commit_position)
            .ok_or(EngineError::Expired {
                deadline: window.closes_at,
                current: position,
            })?;

        let stake = bet.stake.amount();
        let multiplier = bet.multiplier.value();
        let roll_count = bet.roll_count.get();
        let report = check_win(secret, &entropy, multiplier, roll_count);

        #[cfg(feature = "debug-tracing")]
        tracing::debug!(index, entropy = %entropy, outcomes = ?report.outcomes, "Rolls evaluated");

        if !report.any_win() {
            return Err(EngineError::NoWinningRoll { index });
        }

        let gross = guard::payout_for_wins(stake, multiplier, report.wins)?;
        let worst_case = guard::worst_case_payout(stake, multiplier, roll_count)?;
        let burned = if self.config.claim_burn_enabled {
            guard::claim_burn(gross)
        } else {
            0
        };
        let net = gross - burned;

        // Effects
        self.ledger.mark_claimed(&caller, index)?;
        self.release(worst_case)?;
        let stats = &mut self.state.stats;
        stats.bets_won += 1;
        stats.rolls_won += report.wins as u64;
        stats.tokens_paid_out = stats
            .tokens_paid_out
            .checked_add(net)
            .ok_or(EngineError::Overflow)?;
        stats.tokens_burned = stats
            .tokens_burned
            .checked_add(burned)
            .ok_or(EngineError::Overflow)?;

        // Interactions
        let pool = self.address;
        if net > 0 {
            self.token.transfer(&pool, &caller, net)?;
        }
        if burned > 0 {
            self.token.transfer(&pool, &Address::BURN_SINK, burned)?;
        }

        info!(
            index,
            wins = report.wins,
            gross,
            net,
            reserved = self.state.reserved,
            "Bet resolved"
        );

        self.emit(EngineEvent::bet_resolved(position, caller, index, report.wins, gross, net));
        if burned > 0 {
            self.emit(EngineEvent::tokens_burned(position, BurnSource::Claim, burned));
        }

        Ok(RevealOutcome {
            index,
            outcomes: report.outcomes,
            wins: report.wins,
            gross_payout: gross,
            burned,
            net_payout: net,
        })
    }

    /// Abandon an unclaimed bet, releasing its reservation. Pays nothing.
    ///
    /// Allowed any time after the commit position, including after the
    /// reveal window has closed.
    #[instrument(skip(self), fields(owner = %caller))]
    pub fn forfeit(&mut self, caller: Address, index: u64) -> Result<Amount, EngineError> {
        self.atomically(|engine| {
            let bet = engine.open_bet(&caller, index)?;
            let position = engine.chain.position();
            if position <= bet.commit_position {
                return Err(EngineError::TooEarly {
                    opens_at: bet.reveal_opens_at(),
                    current: position,
                });
            }

            let released = guard::worst_case_payout(
                bet.stake.amount(),
                bet.multiplier.value(),
                bet.roll_count.get(),
            )?;
            engine.ledger.mark_claimed(&caller, index)?;
            engine.release(released)?;
            engine.state.stats.bets_forfeited += 1;

            info!(index, released, reserved = engine.state.reserved, "Bet forfeited");
            engine.emit(EngineEvent::bet_forfeited(position, caller, index, released));
            Ok(released)
        })
    }

    /// Add liquidity to the pool. Anyone may fund.
    #[instrument(skip(self), fields(from = %caller))]
    pub fn fund(&mut self, caller: Address, amount: Amount) -> Result<(), EngineError> {
        self.atomically(|engine| {
            if amount == 0 {
                return Err(EngineError::InvalidAmount);
            }
            let pool = engine.address;
            if caller == pool {
                return Err(EngineError::InvalidAddress);
            }
            engine.token.transfer_from(&pool, &caller, &pool, amount)?;

            info!(amount, balance = engine.pool_balance(), "Pool funded");
            let position = engine.chain.position();
            engine.emit(EngineEvent::new(
                position,
                EngineEventData::PoolFunded { from: caller, amount },
            ));
            Ok(())
        })
    }
}

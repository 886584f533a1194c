//! Treasury Control
//!
//! Two-phase withdrawal of the pool's free balance:
//!
//! ```text
//! Idle ──request──▶ Requested ──cooldown──▶ Ready ──execute──▶ Idle
//!   ▲                   │                                       (paused)
//!   └──────cancel───────┘
//! ```
//!
//! A request pauses new bets so the reserved total can only shrink while
//! the cooldown runs. Reveals and forfeits keep working throughout.
//! Execution sends `balance - reserved` and never touches a reservation.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::events::{EngineEvent, EngineEventData};
use super::WagerEngine;
use crate::core::address::Address;
use crate::error::EngineError;
use crate::host::chain::ChainView;
use crate::host::token::TokenLedger;
use crate::ledger::bet::Amount;

/// An outstanding withdrawal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    /// Receives the free balance.
    pub to: Address,
    /// Unix time of the request.
    pub requested_at: u64,
    /// Earliest unix time of execution.
    pub ready_at: u64,
}

/// Where the treasury state machine stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WithdrawalPhase {
    /// No request.
    Idle,
    /// Request recorded, cooldown running.
    Requested,
    /// Cooldown elapsed; executable.
    Ready,
}

/// Withdrawal view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalStatus {
    /// Current phase.
    pub phase: WithdrawalPhase,
    /// The request, if one is outstanding.
    pub request: Option<WithdrawalRequest>,
    /// What execution would transfer right now.
    pub withdrawable: Amount,
}

impl<T: TokenLedger, C: ChainView> WagerEngine<T, C> {
    pub(crate) fn ensure_owner(&self, caller: &Address) -> Result<(), EngineError> {
        match self.state.owner {
            Some(owner) if owner == *caller => Ok(()),
            _ => Err(EngineError::NotOwner),
        }
    }

    fn set_paused(&mut self, paused: bool) {
        if self.state.paused == paused {
            return;
        }
        self.state.paused = paused;
        info!(paused, "Pause toggled");
        let position = self.chain.position();
        self.emit(EngineEvent::new(position, EngineEventData::PauseToggled { paused }));
    }

    /// Start the cooldown for withdrawing the free balance to `to`.
    /// Pauses new bets. Returns the unix time execution becomes possible.
    #[instrument(skip(self), fields(owner = %caller))]
    pub fn request_withdraw(&mut self, caller: Address, to: Address) -> Result<u64, EngineError> {
        self.atomically(|engine| {
            engine.ensure_owner(&caller)?;
            if to.is_zero() || to == engine.address {
                return Err(EngineError::InvalidAddress);
            }
            if engine.state.withdrawal.is_some() {
                return Err(EngineError::WithdrawalPending);
            }

            let now = engine.chain.timestamp();
            let ready_at = now
                .checked_add(engine.config.withdraw_cooldown_secs)
                .ok_or(EngineError::Overflow)?;
            engine.state.withdrawal = Some(WithdrawalRequest {
                to,
                requested_at: now,
                ready_at,
            });
            engine.set_paused(true);

            info!(%to, ready_at, "Withdrawal requested");
            let position = engine.chain.position();
            engine.emit(EngineEvent::new(
                position,
                EngineEventData::WithdrawalRequested { to, ready_at },
            ));
            Ok(ready_at)
        })
    }

    /// Drop the outstanding request and resume new bets.
    #[instrument(skip(self), fields(owner = %caller))]
    pub fn cancel_withdraw(&mut self, caller: Address) -> Result<(), EngineError> {
        self.atomically(|engine| {
            engine.ensure_owner(&caller)?;
            let request = engine
                .state
                .withdrawal
                .take()
                .ok_or(EngineError::NoWithdrawalRequest)?;
            engine.set_paused(false);

            info!(to = %request.to, "Withdrawal cancelled");
            let position = engine.chain.position();
            engine.emit(EngineEvent::new(
                position,
                EngineEventData::WithdrawalCancelled { to: request.to },
            ));
            Ok(())
        })
    }

    /// Send `balance - reserved` to the requested destination once the
    /// cooldown has elapsed. New bets stay paused afterwards.
    #[instrument(skip(self), fields(owner = %caller))]
    pub fn execute_withdraw(&mut self, caller: Address) -> Result<Amount, EngineError> {
        self.atomically(|engine| {
            engine.ensure_owner(&caller)?;
            let request = engine.state.withdrawal.ok_or(EngineError::NoWithdrawalRequest)?;
            let now = engine.chain.timestamp();
            if now < request.ready_at {
                return Err(EngineError::DelayNotElapsed {
                    ready_at: request.ready_at,
                    now,
                });
            }

            let amount = engine.free_balance();
            engine.state.withdrawal = None;

            let pool = engine.address;
            if amount > 0 {
                engine.token.transfer(&pool, &request.to, amount)?;
            }

            let reserved = engine.state.reserved;
            info!(to = %request.to, amount, reserved, "Withdrawal executed");
            let position = engine.chain.position();
            engine.emit(EngineEvent::new(
                position,
                EngineEventData::WithdrawalExecuted { to: request.to, amount },
            ));
            Ok(amount)
        })
    }

    /// Stop accepting new bets.
    pub fn pause(&mut self, caller: Address) -> Result<(), EngineError> {
        self.atomically(|engine| {
            engine.ensure_owner(&caller)?;
            engine.set_paused(true);
            Ok(())
        })
    }

    /// Resume accepting new bets.
    pub fn unpause(&mut self, caller: Address) -> Result<(), EngineError> {
        self.atomically(|engine| {
            engine.ensure_owner(&caller)?;
            engine.set_paused(false);
            Ok(())
        })
    }

    /// Treasury phase and the amount execution would move now.
    pub fn withdrawal_status(&self) -> WithdrawalStatus {
        let request = self.state.withdrawal;
        let phase = match request {
            None => WithdrawalPhase::Idle,
            Some(r) if self.chain.timestamp() >= r.ready_at => WithdrawalPhase::Ready,
            Some(_) => WithdrawalPhase::Requested,
        };
        WithdrawalStatus {
            phase,
            request,
            withdrawable: self.free_balance(),
        }
    }
}

//! Ownership Control
//!
//! Two-step hand-over (propose, then accept by the successor) and an
//! irrevocable renounce. After renouncing, every owner-only entry point
//! fails with `NotOwner` for good.

use tracing::{info, instrument, warn};

use super::events::{EngineEvent, EngineEventData};
use super::WagerEngine;
use crate::core::address::Address;
use crate::error::EngineError;
use crate::host::chain::ChainView;
use crate::host::token::TokenLedger;

impl<T: TokenLedger, C: ChainView> WagerEngine<T, C> {
    /// Name a successor. Replaces any earlier proposal.
    #[instrument(skip(self), fields(owner = %caller))]
    pub fn propose_successor(
        &mut self,
        caller: Address,
        successor: Address,
    ) -> Result<(), EngineError> {
        self.atomically(|engine| {
            engine.ensure_owner(&caller)?;
            if successor.is_zero() || successor == caller {
                return Err(EngineError::InvalidAddress);
            }
            engine.state.pending_owner = Some(successor);

            info!(%successor, "Successor proposed");
            let position = engine.chain.position();
            engine.emit(EngineEvent::new(
                position,
                EngineEventData::OwnershipProposed { owner: caller, successor },
            ));
            Ok(())
        })
    }

    /// Take over as owner. Only the proposed successor may call this.
    #[instrument(skip(self))]
    pub fn accept_ownership(&mut self, caller: Address) -> Result<(), EngineError> {
        self.atomically(|engine| {
            if engine.state.pending_owner != Some(caller) {
                return Err(EngineError::NotPendingOwner);
            }
            let previous = engine.state.owner.ok_or(EngineError::NotOwner)?;
            engine.state.owner = Some(caller);
            engine.state.pending_owner = None;

            info!(%previous, "Ownership accepted");
            let position = engine.chain.position();
            engine.emit(EngineEvent::new(
                position,
                EngineEventData::OwnershipAccepted { previous, owner: caller },
            ));
            Ok(())
        })
    }

    /// Give up ownership permanently. Clears any pending successor.
    #[instrument(skip(self), fields(owner = %caller))]
    pub fn renounce(&mut self, caller: Address) -> Result<(), EngineError> {
        self.atomically(|engine| {
            engine.ensure_owner(&caller)?;
            engine.state.owner = None;
            engine.state.pending_owner = None;

            warn!(paused = engine.state.paused, "Ownership renounced");
            let position = engine.chain.position();
            engine.emit(EngineEvent::new(
                position,
                EngineEventData::OwnershipRenounced { previous: caller },
            ));
            Ok(())
        })
    }
}

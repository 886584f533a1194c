//! Engine Events
//!
//! Emitted by successful entry points and buffered until the host drains
//! them. A failed call leaves no events behind.

use serde::{Deserialize, Serialize};

use crate::core::address::Address;
use crate::ledger::bet::Amount;

/// What a burn was taken from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BurnSource {
    /// Share of the stake at commit.
    Stake,
    /// Share of a payout at reveal.
    Claim,
}

/// Event payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEventData {
    /// Bet admitted and liability reserved.
    BetPlaced {
        owner: Address,
        index: u64,
        stake: Amount,
        multiplier: u32,
        roll_count: u8,
        worst_case: Amount,
    },

    /// Winning reveal paid out.
    BetResolved {
        owner: Address,
        index: u64,
        wins: u8,
        gross_payout: Amount,
        net_payout: Amount,
    },

    /// Bet abandoned by its owner.
    BetForfeited {
        owner: Address,
        index: u64,
        released: Amount,
    },

    /// Tokens sent to the burn sink.
    TokensBurned {
        source: BurnSource,
        amount: Amount,
    },

    /// Liquidity added to the pool.
    PoolFunded {
        from: Address,
        amount: Amount,
    },

    /// Owner requested a withdrawal.
    WithdrawalRequested {
        to: Address,
        ready_at: u64,
    },

    /// Pending withdrawal cancelled.
    WithdrawalCancelled {
        to: Address,
    },

    /// Free balance sent to the destination.
    WithdrawalExecuted {
        to: Address,
        amount: Amount,
    },

    /// Pause switch changed.
    PauseToggled {
        paused: bool,
    },

    /// Successor proposed.
    OwnershipProposed {
        owner: Address,
        successor: Address,
    },

    /// Successor took over.
    OwnershipAccepted {
        previous: Address,
        owner: Address,
    },

    /// Ownership given up for good.
    OwnershipRenounced {
        previous: Address,
    },
}

/// An event stamped with the position it was emitted at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineEvent {
    /// Ledger position at emission.
    pub position: u64,

    /// Account the event concerns, when there is one.
    pub account: Option<Address>,

    /// Event data.
    pub data: EngineEventData,
}

impl EngineEvent {
    /// Create a new event.
    pub fn new(position: u64, data: EngineEventData) -> Self {
        let account = match &data {
            EngineEventData::BetPlaced { owner, .. }
            | EngineEventData::BetResolved { owner, .. }
            | EngineEventData::BetForfeited { owner, .. } => Some(*owner),
            EngineEventData::PoolFunded { from, .. } => Some(*from),
            EngineEventData::WithdrawalRequested { to, .. }
            | EngineEventData::WithdrawalCancelled { to }
            | EngineEventData::WithdrawalExecuted { to, .. } => Some(*to),
            EngineEventData::OwnershipProposed { successor, .. } => Some(*successor),
            EngineEventData::OwnershipAccepted { owner, .. } => Some(*owner),
            EngineEventData::OwnershipRenounced { previous } => Some(*previous),
            EngineEventData::TokensBurned { .. } | EngineEventData::PauseToggled { .. } => None,
        };

        Self {
            position,
            account,
            data,
        }
    }

    /// Short event name for log lines.
    pub fn name(&self) -> &'static str {
        match self.data {
            EngineEventData::BetPlaced { .. } => "BetPlaced",
            EngineEventData::BetResolved { .. } => "BetResolved",
            EngineEventData::BetForfeited { .. } => "BetForfeited",
            EngineEventData::TokensBurned { .. } => "TokensBurned",
            EngineEventData::PoolFunded { .. } => "PoolFunded",
            EngineEventData::WithdrawalRequested { .. } => "WithdrawalRequested",
            EngineEventData::WithdrawalCancelled { .. } => "WithdrawalCancelled",
            EngineEventData::WithdrawalExecuted { .. } => "WithdrawalExecuted",
            EngineEventData::PauseToggled { .. } => "PauseToggled",
            EngineEventData::OwnershipProposed { .. } => "OwnershipProposed",
            EngineEventData::OwnershipAccepted { .. } => "OwnershipAccepted",
            EngineEventData::OwnershipRenounced { .. } => "OwnershipRenounced",
        }
    }

    /// Create a bet-placed event.
    pub fn bet_placed(
        position: u64,
        owner: Address,
        index: u64,
        stake: Amount,
        multiplier: u32,
        roll_count: u8,
        worst_case: Amount,
    ) -> Self {
        Self::new(
            position,
            EngineEventData::BetPlaced {
                owner,
                index,
                stake,
                multiplier,
                roll_count,
                worst_case,
            },
        )
    }

    /// Create a bet-resolved event.
    pub fn bet_resolved(
        position: u64,
        owner: Address,
        index: u64,
        wins: u8,
        gross_payout: Amount,
        net_payout: Amount,
    ) -> Self {
        Self::new(
            position,
            EngineEventData::BetResolved {
                owner,
                index,
                wins,
                gross_payout,
                net_payout,
            },
        )
    }

    /// Create a bet-forfeited event.
    pub fn bet_forfeited(position: u64, owner: Address, index: u64, released: Amount) -> Self {
        Self::new(position, EngineEventData::BetForfeited { owner, index, released })
    }

    /// Create a tokens-burned event.
    pub fn tokens_burned(position: u64, source: BurnSource, amount: Amount) -> Self {
        Self::new(position, EngineEventData::TokensBurned { source, amount })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_derived_from_data() {
        let owner = Address::from_low_u8(1);

        let placed = EngineEvent::bet_placed(5, owner, 0, 1_000, 2, 1, 1_960);
        assert_eq!(placed.account, Some(owner));
        assert_eq!(placed.name(), "BetPlaced");

        let burned = EngineEvent::tokens_burned(5, BurnSource::Stake, 10);
        assert_eq!(burned.account, None);
    }

    #[test]
    fn test_event_json_shape() {
        let event = EngineEvent::new(7, EngineEventData::PauseToggled { paused: true });
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["position"], 7);
        assert_eq!(json["data"]["PauseToggled"]["paused"], true);

        let restored: EngineEvent = serde_json::from_value(json).unwrap();
        assert_eq!(restored, event);
    }
}

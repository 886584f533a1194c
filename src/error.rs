//! Engine Errors
//!
//! Every failure rolls the whole operation back; the variant tells the
//! caller why and whether resubmitting later could help.

use thiserror::Error;

use crate::config::ConfigError;
use crate::host::token::TokenError;
use crate::ledger::bet::Amount;

/// Failure category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input. Never succeeds as submitted.
    Validation,
    /// Pool cannot cover the worst case.
    Capacity,
    /// Too early or too late. May succeed at another position/time.
    Timing,
    /// Caller lacks the required role.
    Authorization,
    /// Call arrived while another engine call was unwinding.
    Reentrancy,
    /// Bet already settled.
    AlreadySettled,
    /// Engine is paused or otherwise not accepting the call.
    State,
    /// Well-formed call whose result was a loss. The bet stays open and
    /// can still be forfeited.
    Outcome,
    /// External token failure or arithmetic overflow.
    Host,
}

/// Engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Commitment hash is the zero value.
    #[error("invalid commitment: zero hash")]
    InvalidCommitment,

    /// Stake is not one of the enumerated tiers.
    #[error("invalid stake: {0}")]
    InvalidStake(Amount),

    /// Multiplier is not one of the enumerated odds.
    #[error("invalid multiplier: {0}")]
    InvalidMultiplier(u32),

    /// Roll count outside `[1, MAX_ROLLS]`.
    #[error("invalid roll count: {0}")]
    InvalidRollCount(u8),

    /// Pool cannot reserve the bet's worst-case payout.
    #[error("insufficient capacity: required {required}, available {available}")]
    InsufficientCapacity {
        /// Worst-case payout of the candidate bet.
        required: Amount,
        /// Largest payout admission would have allowed.
        available: Amount,
    },

    /// New bets are paused.
    #[error("game paused")]
    GamePaused,

    /// No bet at this index for the caller.
    #[error("no such bet: index {index}")]
    NoSuchBet {
        /// Requested index.
        index: u64,
    },

    /// Bet was already revealed or forfeited.
    #[error("bet {index} already claimed")]
    AlreadyClaimed {
        /// Bet index.
        index: u64,
    },

    /// Entropy for the commit position does not exist yet.
    #[error("too early: reveal opens at position {opens_at}, current {current}")]
    TooEarly {
        /// First valid position.
        opens_at: u64,
        /// Current position.
        current: u64,
    },

    /// Entropy for the commit position is no longer available.
    #[error("reveal window expired at position {deadline}, current {current}")]
    Expired {
        /// Last valid position.
        deadline: u64,
        /// Current position.
        current: u64,
    },

    /// Revealed secret and salt do not match the stored commitment.
    #[error("commitment mismatch for bet {index}")]
    HashMismatch {
        /// Bet index.
        index: u64,
    },

    /// Every roll lost; the bet stays unclaimed.
    #[error("no winning roll for bet {index}")]
    NoWinningRoll {
        /// Bet index.
        index: u64,
    },

    /// Batch exceeds `MAX_BATCH_REVEAL`.
    #[error("batch too large: {len} > {max}")]
    BatchTooLarge {
        /// Submitted length.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// Batch arrays differ in length.
    #[error("batch length mismatch: {indices} indices, {secrets} secrets, {salts} salts")]
    BatchLengthMismatch {
        /// Index count.
        indices: usize,
        /// Secret count.
        secrets: usize,
        /// Salt count.
        salts: usize,
    },

    /// Batch has no items.
    #[error("empty batch")]
    EmptyBatch,

    /// Withdrawal cooldown has not elapsed.
    #[error("withdrawal delay not elapsed: ready at {ready_at}, now {now}")]
    DelayNotElapsed {
        /// Unix time the request becomes executable.
        ready_at: u64,
        /// Current unix time.
        now: u64,
    },

    /// A withdrawal request is already outstanding.
    #[error("withdrawal already pending")]
    WithdrawalPending,

    /// No withdrawal request to cancel or execute.
    #[error("no withdrawal request")]
    NoWithdrawalRequest,

    /// Caller is not the owner (or ownership was renounced).
    #[error("caller is not the owner")]
    NotOwner,

    /// Caller is not the proposed successor.
    #[error("caller is not the pending owner")]
    NotPendingOwner,

    /// Zero (or otherwise unusable) address supplied.
    #[error("invalid address")]
    InvalidAddress,

    /// Zero amount where a positive amount is required.
    #[error("invalid amount")]
    InvalidAmount,

    /// Call re-entered the engine.
    #[error("reentrant call")]
    Reentrant,

    /// Pool balance would end below the reserved liability.
    #[error("pool insolvent: balance {balance}, reserved {reserved}")]
    Insolvent {
        /// Pool balance after the operation.
        balance: Amount,
        /// Reserved liability after the operation.
        reserved: Amount,
    },

    /// Checked arithmetic overflowed.
    #[error("arithmetic overflow")]
    Overflow,

    /// External token failure.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Engine constructed with an unusable configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Classify into the failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCommitment
            | Self::InvalidStake(_)
            | Self::InvalidMultiplier(_)
            | Self::InvalidRollCount(_)
            | Self::NoSuchBet { .. }
            | Self::HashMismatch { .. }
            | Self::BatchTooLarge { .. }
            | Self::BatchLengthMismatch { .. }
            | Self::EmptyBatch
            | Self::InvalidAddress
            | Self::InvalidAmount
            | Self::Config(_) => ErrorKind::Validation,
            Self::InsufficientCapacity { .. } => ErrorKind::Capacity,
            Self::TooEarly { .. } | Self::Expired { .. } | Self::DelayNotElapsed { .. } => {
                ErrorKind::Timing
            }
            Self::NotOwner | Self::NotPendingOwner => ErrorKind::Authorization,
            Self::Reentrant => ErrorKind::Reentrancy,
            Self::AlreadyClaimed { .. } => ErrorKind::AlreadySettled,
            Self::NoWinningRoll { .. } => ErrorKind::Outcome,
            Self::GamePaused
            | Self::WithdrawalPending
            | Self::NoWithdrawalRequest
            | Self::Insolvent { .. } => ErrorKind::State,
            Self::Overflow | Self::Token(_) => ErrorKind::Host,
        }
    }
}

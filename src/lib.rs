//! # Wager Engine
//!
//! Commit-reveal wagering with reserved-liability solvency accounting.
//!
//! A bettor stakes against fixed power-of-two odds by committing to a
//! hidden secret. The outcome is derived from that secret and an entropy
//! value that only comes into existence after the commit, so neither the
//! bettor nor whoever orders calls can predict it at stake time. The pool
//! reserves each bet's worst-case payout at admission and never promises
//! more than it holds.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       WAGER ENGINE                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/             - Pure primitives                         │
//! │  ├── hash.rs       - SHA-256 digests                         │
//! │  ├── address.rs    - 20-byte account ids                     │
//! │  └── randomness.rs - Per-roll outcome rule                   │
//! │                                                              │
//! │  ledger/           - Bet records                             │
//! │  ├── bet.rs        - Bet, stake tiers, multipliers           │
//! │  ├── commitment.rs - Commitments and reveal window           │
//! │  └── book.rs       - Append-only per-owner arena             │
//! │                                                              │
//! │  engine/           - State machine (owns everything)         │
//! │  ├── guard.rs      - Worst-case pricing and admission        │
//! │  ├── settlement.rs - Commit / reveal / forfeit / fund        │
//! │  ├── treasury.rs   - Delayed withdrawal, pause switch        │
//! │  ├── ownership.rs  - Two-step transfer, renounce             │
//! │  └── events.rs     - Event log                               │
//! │                                                              │
//! │  host/             - What the engine consumes                │
//! │  ├── token.rs      - Fungible token + in-memory ledger       │
//! │  └── chain.rs      - Position, clock, delayed entropy        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//!
//! After every entry point, successful or not:
//! - `pool_balance >= reserved_liability`
//! - `reserved_liability` equals the summed worst case of unclaimed bets
//! - a bet's `claimed` flag only ever goes from false to true
//!
//! A failed call changes nothing: ledger, pool state, token balances and
//! the event log are rolled back together.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod host;
pub mod ledger;

// Re-export commonly used types
pub use crate::core::address::Address;
pub use crate::core::hash::Digest32;
pub use crate::core::randomness::{check_win, RollReport, Salt, Secret};
pub use config::EngineConfig;
pub use engine::{EngineEvent, EngineEventData, PoolStats, RevealOutcome, WagerEngine};
pub use error::{EngineError, ErrorKind};
pub use host::{ChainView, InMemoryToken, SimulatedChain, TokenError, TokenLedger};
pub use ledger::{
    commitment_hash, Amount, Bet, BetStatus, BetTicket, BetView, Multiplier, StakeTier,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// House edge, percent of the fair payout.
pub const HOUSE_EDGE_PERCENT: Amount = 2;

/// Share of the total stake burned at commit, percent.
pub const STAKE_BURN_PERCENT: Amount = 1;

/// Share of each payout burned at reveal when enabled, percent.
pub const CLAIM_BURN_PERCENT: Amount = 1;

/// Positions after the commit during which the entropy value is retrievable.
pub const REVEAL_WINDOW: u64 = 256;

/// Most rolls in a single bet.
pub const MAX_ROLLS: u8 = 20;

/// A single bet's worst case may not exceed `pool / MAX_PAYOUT_DIVISOR`.
pub const MAX_PAYOUT_DIVISOR: Amount = 5;

/// Most bets in one batch reveal.
pub const MAX_BATCH_REVEAL: usize = 20;

/// Default withdrawal cooldown (24 hours).
pub const DEFAULT_WITHDRAW_COOLDOWN_SECS: u64 = 86_400;

/// Default number of recent bets the active-bet scan examines.
pub const ACTIVE_SCAN_DEPTH: usize = 200;

//! Bet Ledger Module
//!
//! - `bet`: stored bet record and its value domains
//! - `commitment`: commitment hashing, reveal window, client tickets
//! - `book`: append-only per-owner arena with journaled rollback

pub mod bet;
pub mod book;
pub mod commitment;

// Re-export key types
pub use bet::{Amount, Bet, BetStatus, BetView, Multiplier, RollCount, StakeTier};
pub use book::BetLedger;
pub use commitment::{commitment_hash, BetReceipt, BetTicket, RevealWindow};

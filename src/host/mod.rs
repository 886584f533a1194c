//! Host capabilities the engine consumes.
//!
//! - `token`: the external fungible token
//! - `chain`: ledger position, clock and delayed entropy

pub mod chain;
pub mod token;

pub use chain::{ChainView, SimulatedChain};
pub use token::{InMemoryToken, TokenError, TokenLedger, TransferRecord};

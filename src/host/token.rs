//! Fungible Token Ledger
//!
//! The engine does not implement a token; it consumes one through
//! [`TokenLedger`]. The trait also carries the host's revert capability
//! (checkpoint / rollback) so a failed engine call leaves no partial token
//! movement behind.
//!
//! [`InMemoryToken`] is a complete reference implementation with
//! balances, allowances and a journal for rollback.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::address::Address;
use crate::ledger::bet::Amount;

/// Token failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Sender balance too low.
    #[error("insufficient balance for {account}: needed {needed}, available {available}")]
    InsufficientBalance {
        /// Debited account.
        account: Address,
        /// Amount requested.
        needed: Amount,
        /// Amount held.
        available: Amount,
    },

    /// Spender allowance too low.
    #[error(
        "insufficient allowance from {owner} to {spender}: needed {needed}, available {available}"
    )]
    InsufficientAllowance {
        /// Token holder.
        owner: Address,
        /// Approved spender.
        spender: Address,
        /// Amount requested.
        needed: Amount,
        /// Amount approved.
        available: Amount,
    },

    /// Transfer to the zero address.
    #[error("invalid recipient")]
    InvalidRecipient,

    /// Balance or supply overflow.
    #[error("token arithmetic overflow")]
    Overflow,
}

/// External fungible-token capability consumed by the engine.
pub trait TokenLedger {
    /// Opaque rollback marker.
    type Checkpoint: Copy;

    /// Balance held by `account`.
    fn balance_of(&self, account: &Address) -> Amount;

    /// Move `amount` from `from` to `to`, authorised by `from` itself.
    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), TokenError>;

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance.
    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError>;

    /// Mark the current state.
    fn checkpoint(&self) -> Self::Checkpoint;

    /// Undo every change since `checkpoint`.
    fn rollback(&mut self, checkpoint: Self::Checkpoint);

    /// Make every change since the last commit permanent.
    fn commit(&mut self);
}

#[derive(Clone, Copy, Debug)]
enum TokenJournal {
    Balance { account: Address, previous: Amount },
    Allowance { owner: Address, spender: Address, previous: Amount },
    Supply { previous: Amount },
}

/// Journal position for [`InMemoryToken`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenCheckpoint(usize);

/// Record of one completed transfer, kept for inspection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Debited account.
    pub from: Address,
    /// Credited account.
    pub to: Address,
    /// Amount moved.
    pub amount: Amount,
}

/// In-memory token with allowances and journaled rollback.
#[derive(Debug, Default)]
pub struct InMemoryToken {
    balances: BTreeMap<Address, Amount>,
    allowances: BTreeMap<(Address, Address), Amount>,
    total_supply: Amount,
    journal: Vec<TokenJournal>,
    transfers: Vec<TransferRecord>,
}

impl InMemoryToken {
    /// Create an empty token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create tokens out of nothing (host-side setup only).
    pub fn mint(&mut self, to: &Address, amount: Amount) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::InvalidRecipient);
        }
        let supply = self.total_supply.checked_add(amount).ok_or(TokenError::Overflow)?;
        let balance = self.balance_of(to).checked_add(amount).ok_or(TokenError::Overflow)?;
        self.set_supply(supply);
        self.set_balance(*to, balance);
        Ok(())
    }

    /// Approve `spender` to move up to `amount` of `owner`'s tokens.
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) {
        self.set_allowance(*owner, *spender, amount);
    }

    /// Remaining allowance.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Total tokens in existence (burned tokens sit in the sink and still
    /// count).
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Sum of all balances. Equals `total_supply` unless something is broken.
    pub fn sum_of_balances(&self) -> Amount {
        self.balances.values().sum()
    }

    /// Transfers completed so far, oldest first.
    pub fn transfers(&self) -> &[TransferRecord] {
        &self.transfers
    }

    fn set_balance(&mut self, account: Address, amount: Amount) {
        let previous = self.balance_of(&account);
        self.journal.push(TokenJournal::Balance { account, previous });
        self.balances.insert(account, amount);
    }

    fn set_allowance(&mut self, owner: Address, spender: Address, amount: Amount) {
        let previous = self.allowance(&owner, &spender);
        self.journal.push(TokenJournal::Allowance { owner, spender, previous });
        self.allowances.insert((owner, spender), amount);
    }

    fn set_supply(&mut self, amount: Amount) {
        self.journal.push(TokenJournal::Supply { previous: self.total_supply });
        self.total_supply = amount;
    }

    fn move_balance(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::InvalidRecipient);
        }
        let available = self.balance_of(from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                account: *from,
                needed: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self.balance_of(to).checked_add(amount).ok_or(TokenError::Overflow)?;
        self.set_balance(*from, available - amount);
        self.set_balance(*to, credited);
        self.transfers.push(TransferRecord { from: *from, to: *to, amount });
        Ok(())
    }
}

impl TokenLedger for InMemoryToken {
    type Checkpoint = (TokenCheckpoint, usize);

    fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), TokenError> {
        self.move_balance(from, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance {
                owner: *from,
                spender: *spender,
                needed: amount,
                available: allowed,
            });
        }
        self.move_balance(from, to, amount)?;
        self.set_allowance(*from, *spender, allowed - amount);
        Ok(())
    }

    fn checkpoint(&self) -> Self::Checkpoint {
        (TokenCheckpoint(self.journal.len()), self.transfers.len())
    }

    fn rollback(&mut self, checkpoint: Self::Checkpoint) {
        let (TokenCheckpoint(mark), transfers) = checkpoint;
        while self.journal.len() > mark {
            let Some(entry) = self.journal.pop() else { break };
            match entry {
                TokenJournal::Balance { account, previous } => {
                    self.balances.insert(account, previous);
                }
                TokenJournal::Allowance { owner, spender, previous } => {
                    self.allowances.insert((owner, spender), previous);
                }
                TokenJournal::Supply { previous } => {
                    self.total_supply = previous;
                }
            }
        }
        self.transfers.truncate(transfers);
    }

    fn commit(&mut self) {
        self.journal.clear();
    }
}

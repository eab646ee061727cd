//! Value custody
//!
//! The ledger only accounts for amounts. Moving actual value in and out of
//! escrow is delegated to a [`Custody`] implementation.

use crate::amount::Amount;
use crate::identity::Identity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CustodyError {
    #[error("Insufficient funds: needed {needed}, available {available}")]
    InsufficientFunds { needed: Amount, available: Amount },

    #[error("Escrow shortfall: needed {needed}, held {held}")]
    EscrowShortfall { needed: Amount, held: Amount },

    #[error("Amount overflow")]
    Overflow,

    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

/// Escrow primitive capable of holding and releasing the native value unit.
///
/// Both operations are all-or-nothing: on `Err` no balance has moved.
pub trait Custody {
    /// Accept `amount` from `from` into escrow
    fn receive(&mut self, from: Identity, amount: Amount) -> Result<(), CustodyError>;

    /// Release `amount` from escrow to `to`
    fn release(&mut self, to: Identity, amount: Amount) -> Result<(), CustodyError>;

    /// Value currently held in escrow
    fn held(&self) -> Amount;
}

/// In-process account-model custody.
///
/// Tracks the external balance of every known identity plus the value held
/// in escrow. Value only moves between the two; `credit` is the sole way to
/// bring new value into the system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    /// External account balances (zero balances are not stored)
    #[serde(default)]
    accounts: BTreeMap<Identity, Amount>,
    /// Value held in escrow
    #[serde(default)]
    held: Amount,
}

impl Vault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an external account with fresh value (genesis funding)
    pub fn credit(&mut self, identity: Identity, amount: Amount) -> Result<(), CustodyError> {
        let current = self.balance_of(&identity);
        let updated = current.checked_add(amount).ok_or(CustodyError::Overflow)?;
        self.set_balance(identity, updated);
        Ok(())
    }

    /// External balance of an identity (zero if unknown)
    pub fn balance_of(&self, identity: &Identity) -> Amount {
        self.accounts.get(identity).copied().unwrap_or_default()
    }

    /// Total value in the system: all external balances plus escrow
    pub fn total_supply(&self) -> Amount {
        let external: Amount = self.accounts.values().copied().sum();
        external
            .checked_add(self.held)
            .unwrap_or(Amount::from_units(u64::MAX))
    }

    fn set_balance(&mut self, identity: Identity, amount: Amount) {
        if amount.is_zero() {
            self.accounts.remove(&identity);
        } else {
            self.accounts.insert(identity, amount);
        }
    }
}

impl Custody for Vault {
    fn receive(&mut self, from: Identity, amount: Amount) -> Result<(), CustodyError> {
        let available = self.balance_of(&from);
        let remaining = available
            .checked_sub(amount)
            .ok_or(CustodyError::InsufficientFunds {
                needed: amount,
                available,
            })?;
        let held = self.held.checked_add(amount).ok_or(CustodyError::Overflow)?;

        self.set_balance(from, remaining);
        self.held = held;
        Ok(())
    }

    fn release(&mut self, to: Identity, amount: Amount) -> Result<(), CustodyError> {
        let held = self
            .held
            .checked_sub(amount)
            .ok_or(CustodyError::EscrowShortfall {
                needed: amount,
                held: self.held,
            })?;
        let credited = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or(CustodyError::Overflow)?;

        self.held = held;
        self.set_balance(to, credited);
        Ok(())
    }

    fn held(&self) -> Amount {
        self.held
    }
}

//! Persistent ledger state
//!
//! The data owned by the ledger, kept apart from custody and notification so
//! it can be snapshotted to disk and restored across restarts.

use crate::amount::Amount;
use crate::identity::Identity;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Errors from state operations
#[derive(Error, Debug)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt ledger state: {0}")]
    Corrupt(String),
}

/// Lifecycle phase of the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Commitments allowed
    Open,
    /// Withdrawals allowed (terminal)
    Closed,
}

/// Everything the ledger owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Party allowed to commit funds. Never changes.
    pub owner: Identity,
    /// Party allowed to end the period
    pub doctor: Identity,
    /// Legacy balance per beneficiary (absent == zero)
    #[serde(default)]
    pub legacy_of: BTreeMap<Identity, Amount>,
    /// One-way phase flag
    #[serde(default)]
    pub is_contract_over: bool,
}

impl LedgerState {
    /// Fresh, open state with no legacies
    pub fn new(owner: Identity, doctor: Identity) -> Self {
        Self {
            owner,
            doctor,
            legacy_of: BTreeMap::new(),
            is_contract_over: false,
        }
    }

    /// Legacy balance of an identity (zero if absent)
    pub fn legacy_of(&self, identity: &Identity) -> Amount {
        self.legacy_of.get(identity).copied().unwrap_or_default()
    }

    /// Set a legacy balance, dropping the entry when it reaches zero
    pub fn set_legacy(&mut self, identity: Identity, amount: Amount) {
        if amount.is_zero() {
            self.legacy_of.remove(&identity);
        } else {
            self.legacy_of.insert(identity, amount);
        }
    }

    /// Sum of all legacy balances
    pub fn total_legacy(&self) -> Amount {
        self.legacy_of.values().copied().sum()
    }

    pub fn phase(&self) -> Phase {
        if self.is_contract_over {
            Phase::Closed
        } else {
            Phase::Open
        }
    }

    /// Check the structural invariants of a loaded state
    pub fn validate(&self) -> Result<(), StateError> {
        if self.owner == self.doctor {
            return Err(StateError::Corrupt(format!(
                "owner and doctor are both {}",
                self.owner
            )));
        }
        if self.legacy_of.contains_key(&Identity::ZERO) {
            return Err(StateError::Corrupt(
                "null identity holds a legacy".to_string(),
            ));
        }
        if let Some((identity, _)) = self.legacy_of.iter().find(|(_, a)| a.is_zero()) {
            return Err(StateError::Corrupt(format!(
                "zero legacy stored for {}",
                identity
            )));
        }
        Ok(())
    }

    /// Load state from a JSON file
    pub fn load(path: &Path) -> Result<Self, StateError> {
        let state: LedgerState = read_json(path)?;
        state.validate()?;
        Ok(state)
    }

    /// Save state to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        write_json(path, self)
    }
}

/// Read a pretty-printed JSON document
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StateError> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Write a JSON document, replacing `path` only once the write succeeded
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StateError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_json::to_string_pretty(value)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

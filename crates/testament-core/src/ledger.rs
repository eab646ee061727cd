//! The ledger state machine
//!
//! Every operation checks its preconditions first and only then mutates
//! state. A rejected call leaves state, custody and the event sink untouched.

use crate::amount::Amount;
use crate::custody::{Custody, CustodyError};
use crate::events::{EventSink, LedgerEvent};
use crate::identity::Identity;
use crate::state::{LedgerState, Phase};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{0}")]
    InvalidRoleAssignment(RoleConflict),

    #[error("You are not allowed to use this function")]
    Unauthorized,

    #[error("You cannot bequeath to zero address")]
    InvalidBeneficiary,

    #[error("You cannot bequeath a zero amount")]
    InvalidAmount,

    #[error("The contract is already over")]
    AlreadyEnded,

    #[error("The contract has not yet over")]
    PeriodNotEnded,

    #[error("You do not have any legacy on this contract")]
    NoLegacy,

    #[error("Legacy balance would overflow")]
    AmountOverflow,

    #[error("Value transfer failed: {0}")]
    TransferFailed(#[from] CustodyError),

    #[error("Inconsistent ledger state: {0}")]
    InconsistentState(String),
}

/// Which call tried to give the owner the doctor role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleConflict {
    Creation,
    Succession,
}

impl fmt::Display for RoleConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleConflict::Creation => {
                f.write_str("You cannot define the owner and the doctor as the same person")
            }
            RoleConflict::Succession => f.write_str("You cannot be set as doctor"),
        }
    }
}

/// Custodial bequest ledger
///
/// Owns the [`LedgerState`], the custody primitive holding committed value,
/// and the sink that receives notifications.
#[derive(Debug)]
pub struct Ledger<C, S> {
    state: LedgerState,
    custody: C,
    sink: S,
}

impl<C: Custody, S: EventSink> Ledger<C, S> {
    /// Deploy a new ledger and announce the initial doctor
    pub fn create(
        owner: Identity,
        doctor: Identity,
        custody: C,
        mut sink: S,
    ) -> Result<Self, LedgerError> {
        if owner == doctor {
            return Err(reject(
                "create",
                LedgerError::InvalidRoleAssignment(RoleConflict::Creation),
            ));
        }

        sink.emit(LedgerEvent::DoctorChanged { doctor });
        log::info!("Ledger created: owner {}, doctor {}", owner, doctor);

        Ok(Self {
            state: LedgerState::new(owner, doctor),
            custody,
            sink,
        })
    }

    /// Rebuild a ledger from a persisted state. Emits nothing.
    pub fn restore(state: LedgerState, custody: C, sink: S) -> Result<Self, LedgerError> {
        state
            .validate()
            .map_err(|e| LedgerError::InconsistentState(e.to_string()))?;

        // Custody must cover every outstanding legacy
        let owed = state.total_legacy();
        if custody.held() < owed {
            return Err(LedgerError::InconsistentState(format!(
                "custody holds {} but legacies total {}",
                custody.held(),
                owed
            )));
        }

        Ok(Self {
            state,
            custody,
            sink,
        })
    }

    /// Commit `amount` to `beneficiary`, taking the value from the owner.
    ///
    /// Returns the beneficiary's new legacy balance.
    pub fn bequeath(
        &mut self,
        caller: Identity,
        beneficiary: Identity,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        if caller != self.state.owner {
            return Err(reject("bequeath", LedgerError::Unauthorized));
        }
        if self.state.is_contract_over {
            return Err(reject("bequeath", LedgerError::AlreadyEnded));
        }
        if beneficiary.is_zero() {
            return Err(reject("bequeath", LedgerError::InvalidBeneficiary));
        }
        if amount.is_zero() {
            return Err(reject("bequeath", LedgerError::InvalidAmount));
        }

        let updated = self
            .state
            .legacy_of(&beneficiary)
            .checked_add(amount)
            .ok_or_else(|| reject("bequeath", LedgerError::AmountOverflow))?;

        // Value receipt and accounting commit together
        if let Err(e) = self.custody.receive(caller, amount) {
            log::warn!(
                "Bequeath to {} failed to receive {}: {}",
                beneficiary,
                amount,
                e
            );
            return Err(LedgerError::TransferFailed(e));
        }
        self.state.set_legacy(beneficiary, updated);

        self.sink.emit(LedgerEvent::Bequeath {
            beneficiary,
            amount,
        });
        log::info!(
            "Bequeathed {} to {} (balance now {})",
            amount,
            beneficiary,
            updated
        );
        Ok(updated)
    }

    /// Appoint a new doctor. Allowed in either phase; re-appointing the
    /// current doctor is legal and re-announces it.
    pub fn set_doctor(
        &mut self,
        caller: Identity,
        new_doctor: Identity,
    ) -> Result<(), LedgerError> {
        if caller != self.state.owner {
            return Err(reject("set_doctor", LedgerError::Unauthorized));
        }
        if new_doctor == self.state.owner {
            return Err(reject(
                "set_doctor",
                LedgerError::InvalidRoleAssignment(RoleConflict::Succession),
            ));
        }

        let previous = std::mem::replace(&mut self.state.doctor, new_doctor);

        self.sink.emit(LedgerEvent::DoctorChanged { doctor: new_doctor });
        log::info!("Doctor changed: {} -> {}", previous, new_doctor);
        Ok(())
    }

    /// Close the commitment period. Irreversible.
    pub fn end_period(&mut self, caller: Identity) -> Result<(), LedgerError> {
        if caller != self.state.doctor {
            return Err(reject("end_period", LedgerError::Unauthorized));
        }
        if self.state.is_contract_over {
            return Err(reject("end_period", LedgerError::AlreadyEnded));
        }

        self.state.is_contract_over = true;

        self.sink.emit(LedgerEvent::ContractEnded { doctor: caller });
        log::info!("Contract ended by doctor {}", caller);
        Ok(())
    }

    /// Release the caller's whole legacy to them.
    ///
    /// The balance is zeroed before value leaves custody, so a release that
    /// re-enters the ledger finds nothing left to withdraw. If the release
    /// fails the balance is put back.
    pub fn withdraw(&mut self, caller: Identity) -> Result<Amount, LedgerError> {
        if !self.state.is_contract_over {
            return Err(reject("withdraw", LedgerError::PeriodNotEnded));
        }
        let amount = self.state.legacy_of(&caller);
        if amount.is_zero() {
            return Err(reject("withdraw", LedgerError::NoLegacy));
        }

        self.state.set_legacy(caller, Amount::ZERO);
        if let Err(e) = self.custody.release(caller, amount) {
            self.state.set_legacy(caller, amount);
            log::warn!("Withdrawal of {} to {} failed: {}", amount, caller, e);
            return Err(LedgerError::TransferFailed(e));
        }

        self.sink.emit(LedgerEvent::LegacyWithdrew {
            beneficiary: caller,
            amount,
        });
        log::info!("{} withdrew {}", caller, amount);
        Ok(amount)
    }

    pub fn owner(&self) -> Identity {
        self.state.owner
    }

    pub fn doctor(&self) -> Identity {
        self.state.doctor
    }

    pub fn is_contract_over(&self) -> bool {
        self.state.is_contract_over
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Legacy balance of any identity (zero if it never received one)
    pub fn legacy_of(&self, identity: &Identity) -> Amount {
        self.state.legacy_of(identity)
    }

    /// Sum of all outstanding legacies
    pub fn total_legacy(&self) -> Amount {
        self.state.total_legacy()
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn custody(&self) -> &C {
        &self.custody
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Split the ledger back into its parts, e.g. for persistence
    pub fn into_parts(self) -> (LedgerState, C, S) {
        (self.state, self.custody, self.sink)
    }
}

fn reject(operation: &str, err: LedgerError) -> LedgerError {
    log::debug!("{} rejected: {}", operation, err);
    err
}

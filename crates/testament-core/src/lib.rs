//! Testament Core
//!
//! A custodial bequest ledger driven by three roles.
//!
//! # Concepts
//!
//! - **Owner**: commits value to named beneficiaries while the period is open
//! - **Doctor**: ends the period, exactly once; the owner may appoint a successor
//! - **Beneficiary**: withdraws their whole legacy balance once the period is closed
//!
//! # Lifecycle
//!
//! ```text
//! Open --[end_period by doctor]--> Closed
//!   bequeath  : Open only
//!   withdraw  : Closed only
//!   set_doctor: either phase
//! ```
//!
//! # Example
//!
//! ```ignore
//! use testament_core::{Amount, EventLog, Ledger, Vault};
//!
//! let mut vault = Vault::new();
//! vault.credit(owner, Amount::from_units(10))?;
//!
//! let mut ledger = Ledger::create(owner, doctor, vault, EventLog::new())?;
//! ledger.bequeath(owner, heir, Amount::from_units(5))?;
//! ledger.end_period(doctor)?;
//! let paid = ledger.withdraw(heir)?;
//! ```

pub mod amount;
pub mod custody;
pub mod events;
pub mod identity;
pub mod ledger;
pub mod state;

#[cfg(test)]
pub(crate) mod test_utils;

pub use amount::Amount;
pub use custody::{Custody, CustodyError, Vault};
pub use events::{EventLog, EventSink, LedgerEvent, LogSink};
pub use identity::{Identity, IdentityError};
pub use ledger::{Ledger, LedgerError, RoleConflict};
pub use state::{LedgerState, Phase, StateError};

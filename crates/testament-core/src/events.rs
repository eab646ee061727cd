//! Notification facts emitted by the ledger

use crate::amount::Amount;
use crate::identity::Identity;
use serde::{Deserialize, Serialize};

/// Facts emitted by the Ledger after an operation commits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LedgerEvent {
    /// A doctor was assigned, at creation or by succession
    DoctorChanged {
        /// The doctor now in charge
        doctor: Identity,
    },

    /// The owner committed value to a beneficiary
    Bequeath {
        beneficiary: Identity,
        /// Amount added by this commitment (not the running balance)
        amount: Amount,
    },

    /// The doctor closed the commitment period
    ContractEnded {
        /// The doctor that ended it
        doctor: Identity,
    },

    /// A beneficiary withdrew their whole legacy
    LegacyWithdrew {
        beneficiary: Identity,
        amount: Amount,
    },
}

impl LedgerEvent {
    /// Stable event name, as seen by observers
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerEvent::DoctorChanged { .. } => "DoctorChanged",
            LedgerEvent::Bequeath { .. } => "Bequeath",
            LedgerEvent::ContractEnded { .. } => "ContractEnded",
            LedgerEvent::LegacyWithdrew { .. } => "LegacyWithdrew",
        }
    }

    /// Get the beneficiary if this event is associated with one
    pub fn beneficiary(&self) -> Option<&Identity> {
        match self {
            LedgerEvent::Bequeath { beneficiary, .. } => Some(beneficiary),
            LedgerEvent::LegacyWithdrew { beneficiary, .. } => Some(beneficiary),
            LedgerEvent::DoctorChanged { .. } | LedgerEvent::ContractEnded { .. } => None,
        }
    }
}

/// In-memory record of emitted events, in emission order
pub type EventLog = Vec<LedgerEvent>;

/// Consumer of ledger notifications. No acknowledgment is expected.
pub trait EventSink {
    fn emit(&mut self, event: LedgerEvent);
}

/// Records events in emission order
impl EventSink for Vec<LedgerEvent> {
    fn emit(&mut self, event: LedgerEvent) {
        self.push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: LedgerEvent) {
        (**self).emit(event);
    }
}

/// Writes every event through the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&mut self, event: LedgerEvent) {
        match &event {
            LedgerEvent::DoctorChanged { doctor } => {
                log::info!("DoctorChanged: doctor is now {}", doctor);
            }
            LedgerEvent::Bequeath {
                beneficiary,
                amount,
            } => {
                log::info!("Bequeath: {} committed to {}", amount, beneficiary);
            }
            LedgerEvent::ContractEnded { doctor } => {
                log::info!("ContractEnded: period closed by {}", doctor);
            }
            LedgerEvent::LegacyWithdrew {
                beneficiary,
                amount,
            } => {
                log::info!("LegacyWithdrew: {} released to {}", amount, beneficiary);
            }
        }
    }
}

//! Shared test utilities for testament-core tests.
//!
//! Provides deterministic identities and funded ledgers used across test
//! modules.

use crate::amount::Amount;
use crate::custody::Vault;
use crate::events::EventLog;
use crate::identity::Identity;
use crate::ledger::Ledger;

/// Generate a deterministic identity from a seed byte.
///
/// The bytes are `[0x01, 0x00, ..., 0x00, seed]`, so every seed gives a
/// distinct, non-null identity.
pub fn test_identity(seed_byte: u8) -> Identity {
    let mut bytes = [0u8; 20];
    bytes[0] = 0x01;
    bytes[19] = seed_byte;
    Identity::from_bytes(bytes)
}

pub fn owner() -> Identity {
    test_identity(1)
}

pub fn doctor() -> Identity {
    test_identity(2)
}

pub fn heir() -> Identity {
    test_identity(3)
}

/// Starting balance of the owner's external account
pub const OWNER_FUNDS: Amount = Amount::from_units(1_000);

/// A ledger deployed with owner=1, doctor=2 and an owner account holding
/// [`OWNER_FUNDS`]. The creation event is left in the sink.
pub fn make_test_ledger() -> Ledger<Vault, EventLog> {
    let mut vault = Vault::new();
    vault.credit(owner(), OWNER_FUNDS).unwrap();
    Ledger::create(owner(), doctor(), vault, EventLog::new()).unwrap()
}

//! Security-specific tests for audit preparation.
//!
//! These tests verify:
//! 1. A withdrawal zeroes the balance before value leaves custody
//! 2. Failed value transfers roll back completely
//! 3. Tampered snapshots are refused on restore
//! 4. Malformed inputs don't panic

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use testament_core::{
    Amount, Custody, CustodyError, EventLog, Identity, Ledger, LedgerError, LedgerState, Vault,
};

fn test_identity(seed: u8) -> Identity {
    let mut bytes = [0u8; 20];
    bytes[0] = 0x01;
    bytes[19] = seed;
    Identity::from_bytes(bytes)
}

fn owner() -> Identity {
    test_identity(1)
}

fn doctor() -> Identity {
    test_identity(2)
}

fn heir() -> Identity {
    test_identity(3)
}

fn units(n: u64) -> Amount {
    Amount::from_units(n)
}

/// Custody wrapper with switchable failure modes and a call log
#[derive(Debug, Default)]
struct HostileCustody {
    inner: Vault,
    reject_receive: bool,
    reject_release: bool,
    panic_on_release: bool,
    releases: Vec<(Identity, Amount)>,
}

impl Custody for HostileCustody {
    fn receive(&mut self, from: Identity, amount: Amount) -> Result<(), CustodyError> {
        if self.reject_receive {
            return Err(CustodyError::Rejected("receive disabled".into()));
        }
        self.inner.receive(from, amount)
    }

    fn release(&mut self, to: Identity, amount: Amount) -> Result<(), CustodyError> {
        if self.panic_on_release {
            panic!("recipient aborted during release");
        }
        if self.reject_release {
            return Err(CustodyError::Rejected("recipient refused value".into()));
        }
        self.releases.push((to, amount));
        self.inner.release(to, amount)
    }

    fn held(&self) -> Amount {
        self.inner.held()
    }
}

fn closed_ledger_with_legacy(
    custody: HostileCustody,
) -> Ledger<HostileCustody, EventLog> {
    let mut custody = custody;
    custody.inner.credit(owner(), units(100)).unwrap();

    let mut ledger = Ledger::create(owner(), doctor(), custody, EventLog::new()).unwrap();
    ledger.bequeath(owner(), heir(), units(5)).unwrap();
    ledger.end_period(doctor()).unwrap();
    ledger
}

// ============================================================================
// 1. Write-before-release ordering
// ============================================================================

#[test]
fn test_balance_is_zeroed_before_release() {
    let mut ledger = closed_ledger_with_legacy(HostileCustody {
        panic_on_release: true,
        ..Default::default()
    });

    // Silence the expected panic message
    let hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| ledger.withdraw(heir())));
    panic::set_hook(hook);

    assert!(outcome.is_err(), "release should have aborted");
    // Control left the ledger mid-release: the balance must already be gone
    assert_eq!(ledger.legacy_of(&heir()), Amount::ZERO);
}

#[test]
fn test_withdraw_releases_exactly_once() {
    let mut ledger = closed_ledger_with_legacy(HostileCustody::default());

    ledger.withdraw(heir()).unwrap();
    assert_eq!(ledger.withdraw(heir()), Err(LedgerError::NoLegacy));

    assert_eq!(ledger.custody().releases, vec![(heir(), units(5))]);
}

// ============================================================================
// 2. Rollback on failed transfers
// ============================================================================

#[test]
fn test_refused_release_restores_legacy() {
    let mut ledger = closed_ledger_with_legacy(HostileCustody {
        reject_release: true,
        ..Default::default()
    });
    let events_before = ledger.sink().len();

    let result = ledger.withdraw(heir());

    assert!(matches!(
        result,
        Err(LedgerError::TransferFailed(CustodyError::Rejected(_)))
    ));
    assert_eq!(ledger.legacy_of(&heir()), units(5));
    assert_eq!(ledger.custody().held(), units(5));
    assert_eq!(ledger.sink().len(), events_before);
}

#[test]
fn test_withdraw_retry_after_refusal() {
    let mut ledger = closed_ledger_with_legacy(HostileCustody {
        reject_release: true,
        ..Default::default()
    });
    assert!(ledger.withdraw(heir()).is_err());

    let (state, mut custody, sink) = ledger.into_parts();
    custody.reject_release = false;
    let mut ledger = Ledger::restore(state, custody, sink).unwrap();

    assert_eq!(ledger.withdraw(heir()).unwrap(), units(5));
    assert_eq!(ledger.custody().inner.balance_of(&heir()), units(5));
}

#[test]
fn test_refused_receive_commits_nothing() {
    let mut custody = HostileCustody {
        reject_receive: true,
        ..Default::default()
    };
    custody.inner.credit(owner(), units(100)).unwrap();
    let mut ledger = Ledger::create(owner(), doctor(), custody, EventLog::new()).unwrap();

    let result = ledger.bequeath(owner(), heir(), units(5));

    assert!(matches!(result, Err(LedgerError::TransferFailed(_))));
    assert_eq!(ledger.legacy_of(&heir()), Amount::ZERO);
    assert_eq!(ledger.custody().inner.balance_of(&owner()), units(100));
    assert_eq!(ledger.sink().len(), 1);
}

// ============================================================================
// 3. Tampered snapshots
// ============================================================================

#[test]
fn test_restore_refuses_inflated_legacy() {
    let mut vault = Vault::new();
    vault.credit(owner(), units(100)).unwrap();
    let mut ledger = Ledger::create(owner(), doctor(), vault, EventLog::new()).unwrap();
    ledger.bequeath(owner(), heir(), units(5)).unwrap();
    let (mut state, vault, _) = ledger.into_parts();

    // Claim more than custody actually holds
    state.set_legacy(heir(), units(50));

    let result = Ledger::restore(state, vault, EventLog::new());
    assert!(matches!(result, Err(LedgerError::InconsistentState(_))));
}

#[test]
fn test_restore_refuses_null_beneficiary() {
    let mut state = LedgerState::new(owner(), doctor());
    state.legacy_of.insert(Identity::ZERO, units(5));

    let mut vault = Vault::new();
    vault.credit(owner(), units(5)).unwrap();
    vault.receive(owner(), units(5)).unwrap();

    let result = Ledger::restore(state, vault, EventLog::new());
    assert!(matches!(result, Err(LedgerError::InconsistentState(_))));
}

// ============================================================================
// 4. Malformed input handling
// ============================================================================

#[test]
fn test_random_identity_strings_dont_panic() {
    let mut rng = StdRng::seed_from_u64(42);
    let alphabet = b"0123456789abcdefABCDEFxX_ g";

    for _ in 0..1000 {
        let len = rng.gen_range(0..50);
        let s: String = (0..len)
            .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
            .collect();
        let _ = Identity::from_str(&s);
        let _ = Identity::from_str(&format!("0x{}", s));
    }
}

#[test]
fn test_random_snapshot_bytes_dont_panic() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let len = rng.gen_range(0..200);
        let bytes: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        let _ = serde_json::from_slice::<LedgerState>(&bytes);
    }
}

#[test]
fn test_snapshot_with_bad_identity_rejected() {
    let json = r#"{
        "owner": "0x0100000000000000000000000000000000000001",
        "doctor": "not-an-identity",
        "legacy_of": {},
        "is_contract_over": false
    }"#;
    assert!(serde_json::from_str::<LedgerState>(json).is_err());
}

#[test]
fn test_snapshot_load_rejects_tampered_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");

    let json = format!(
        r#"{{"owner": "{o}", "doctor": "{o}", "legacy_of": {{}}, "is_contract_over": false}}"#,
        o = owner()
    );
    std::fs::write(&path, json).unwrap();

    assert!(LedgerState::load(&path).is_err());
}

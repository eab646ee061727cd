#![no_main]

use libfuzzer_sys::fuzz_target;
use testament_core::{EventLog, Ledger, LedgerState, Vault};

fuzz_target!(|data: &[u8]| {
    // Decoding and restoring an arbitrary snapshot must never panic.
    if let Ok(state) = serde_json::from_slice::<LedgerState>(data) {
        let _ = state.validate();
        let _ = Ledger::restore(state, Vault::new(), EventLog::new());
    }
});

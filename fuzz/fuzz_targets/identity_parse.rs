#![no_main]

use libfuzzer_sys::fuzz_target;
use std::str::FromStr;
use testament_core::Identity;

fuzz_target!(|data: &[u8]| {
    // Identity::from_str must never panic — it should always return Ok or Err.
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(id) = Identity::from_str(s) {
            // Anything that parses must display back to a parsable form
            let again = Identity::from_str(&id.to_string()).unwrap();
            assert_eq!(again, id);
        }

        // Also try with the "0x" prefix prepended to exercise the hex decoder
        let prefixed = format!("0x{}", s);
        let _ = Identity::from_str(&prefixed);
    }
});

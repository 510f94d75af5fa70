//! Fuzz target for gate artifact parsing (Istanbul, Stryker, contract results).
//!
//! Goal: The parsers should **never panic** on any input.
//! Malformed reports must surface as errors.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_report_parsers
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = trustgate_repo::fuzz::parse_coverage(text);
        let _ = trustgate_repo::fuzz::parse_mutation(text);
        let _ = trustgate_repo::fuzz::parse_contracts(text);
    }
});

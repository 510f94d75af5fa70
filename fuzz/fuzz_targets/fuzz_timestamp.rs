//! Fuzz target for timestamp parsing (RFC 3339 and bare dates).
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_timestamp
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = trustgate_settings::parse_timestamp(text);
    }
});

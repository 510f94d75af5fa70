//! Fuzz target for waiver file parsing.
//!
//! Goal: Invalid records become `InvalidWaiver` entries or an error, never a panic.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_waivers
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data)
        && text.len() <= 64 * 1024
    {
        let _ = trustgate_settings::parse_waivers(text);
    }
});

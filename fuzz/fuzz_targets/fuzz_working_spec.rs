//! Fuzz target for working spec YAML and provenance JSON parsing.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_working_spec
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = trustgate_settings::parse_working_spec_yaml(text);
        let _ = trustgate_settings::parse_provenance_json(text);
    }
});

//! Fuzz target for `trustgate.toml` parsing and resolution.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_config_toml
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use trustgate_settings::Overrides;

#[derive(Arbitrary, Debug)]
struct ConfigInput {
    toml: String,
    tier: Option<u8>,
    now: Option<String>,
}

fuzz_target!(|input: ConfigInput| {
    if input.toml.len() > 16 * 1024 {
        return;
    }
    let Ok(cfg) = trustgate_settings::parse_config_toml(&input.toml) else {
        return;
    };
    let overrides = Overrides {
        tier: input.tier,
        now: input.now,
        ..Overrides::default()
    };
    let _ = trustgate_settings::resolve_config(cfg, overrides);
});

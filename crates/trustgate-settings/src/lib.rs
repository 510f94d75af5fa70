//! Config parsing and input document validation.
//!
//! This crate is IO-free: it parses configuration, working specs, waiver files, and provenance
//! provided as strings, and turns them into the typed records the domain engine consumes.

#![forbid(unsafe_code)]

mod dates;
mod model;
mod provenance;
mod resolve;
mod waiver_file;
mod working_spec;

pub use dates::parse_timestamp;
pub use model::{ArtifactConfig, ContextConfig, SCHEMA_CONFIG_V1, TrustgateConfigV1};
pub use resolve::{
    ArtifactLocation, DEFAULT_PROVENANCE_PATH, DEFAULT_WAIVERS_PATH, DEFAULT_WORKING_SPEC_PATH,
    Overrides, ResolvedConfig, default_artifact,
};
pub use waiver_file::{InvalidWaiver, ParsedWaivers};

use trustgate_domain::model::{Provenance, WorkingSpec};

/// Parse `trustgate.toml` into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<TrustgateConfigV1> {
    let cfg: TrustgateConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective config (file values + CLI overrides + defaults).
pub fn resolve_config(
    cfg: TrustgateConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}

/// Parse and validate a working spec (YAML).
pub fn parse_working_spec_yaml(input: &str) -> anyhow::Result<WorkingSpec> {
    working_spec::parse(input)
}

/// Parse a waivers file (YAML or JSON). Malformed records are set aside individually.
pub fn parse_waivers(input: &str) -> anyhow::Result<ParsedWaivers> {
    waiver_file::parse(input)
}

/// Parse a provenance document (JSON).
pub fn parse_provenance_json(input: &str) -> anyhow::Result<Provenance> {
    provenance::parse(input)
}

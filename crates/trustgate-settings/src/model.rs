use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SCHEMA_CONFIG_V1: &str = "trustgate.config.v1";

/// `trustgate.toml` schema v1.
///
/// This is a *user-facing* config model: every key is optional so forward-compat is easy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrustgateConfigV1 {
    /// Optional schema string for tooling (`trustgate.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Working spec YAML, relative to the repo root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_spec: Option<String>,

    /// Waivers file (YAML or JSON), relative to the repo root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waivers: Option<String>,

    /// Provenance JSON with a11y/perf results, relative to the repo root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<String>,

    /// Monorepo workspace globs searched for artifacts after the repo root.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<String>,

    /// Map of gate name -> artifact location.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub artifacts: BTreeMap<String, ArtifactConfig>,

    #[serde(default)]
    pub context: ContextConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ArtifactConfig {
    /// Report path relative to the repo root (and to each workspace).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Command that regenerates the report; shown when it is missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContextConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

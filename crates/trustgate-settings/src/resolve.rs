use crate::dates::parse_timestamp;
use crate::model::{SCHEMA_CONFIG_V1, TrustgateConfigV1};
use anyhow::Context;
use globset::Glob;
use std::collections::BTreeMap;
use time::OffsetDateTime;
use trustgate_types::GateKind;

pub const DEFAULT_WORKING_SPEC_PATH: &str = ".trustgate/working-spec.yaml";
pub const DEFAULT_WAIVERS_PATH: &str = ".trustgate/waivers.yaml";
pub const DEFAULT_PROVENANCE_PATH: &str = ".trustgate/provenance.json";

/// Command-line values that win over the config file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub tier: Option<u8>,
    pub branch: Option<String>,
    pub environment: Option<String>,
    pub changed_files: Vec<String>,
    /// RFC 3339 evaluation instant; the wall clock is used when absent.
    pub now: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactLocation {
    pub path: String,
    pub command: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedConfig {
    pub working_spec: String,
    pub waivers: String,
    pub provenance: String,
    pub workspaces: Vec<String>,
    pub artifacts: BTreeMap<GateKind, ArtifactLocation>,
    pub tier: Option<u8>,
    pub branch: Option<String>,
    pub environment: Option<String>,
    pub changed_files: Vec<String>,
    pub now: Option<OffsetDateTime>,
}

/// Default report location and regenerating command for a gate.
pub fn default_artifact(gate: GateKind) -> ArtifactLocation {
    let (path, command) = match gate {
        GateKind::Coverage => ("coverage/coverage-final.json", "npm run test:coverage"),
        GateKind::Mutation => ("reports/mutation/mutation.json", "npx stryker run"),
        GateKind::Contracts => ("test-results/contract-results.json", "npm run test:contract"),
    };
    ArtifactLocation {
        path: path.to_string(),
        command: Some(command.to_string()),
    }
}

pub fn resolve_config(
    cfg: TrustgateConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    if let Some(schema) = cfg.schema.as_deref()
        && schema != SCHEMA_CONFIG_V1
    {
        anyhow::bail!("unsupported config schema: {schema} (expected {SCHEMA_CONFIG_V1})");
    }

    let mut artifacts: BTreeMap<GateKind, ArtifactLocation> = GateKind::ALL
        .iter()
        .map(|&gate| (gate, default_artifact(gate)))
        .collect();

    for (name, ac) in &cfg.artifacts {
        let gate: GateKind = name
            .parse()
            .with_context(|| format!("invalid [artifacts.{name}] section"))?;
        let entry = artifacts.entry(gate).or_insert_with(|| default_artifact(gate));
        if let Some(path) = ac.path.as_deref() {
            if path.trim().is_empty() {
                anyhow::bail!("artifact path for {gate} must not be empty");
            }
            entry.path = path.to_string();
        }
        if let Some(command) = ac.command.as_deref() {
            entry.command = Some(command.to_string()).filter(|c| !c.trim().is_empty());
        }
    }

    for pattern in &cfg.workspaces {
        Glob::new(pattern).with_context(|| format!("invalid workspace glob: {pattern}"))?;
    }

    let now = overrides
        .now
        .as_deref()
        .map(parse_timestamp)
        .transpose()
        .context("invalid --now value")?;

    Ok(ResolvedConfig {
        working_spec: cfg
            .working_spec
            .unwrap_or_else(|| DEFAULT_WORKING_SPEC_PATH.to_string()),
        waivers: cfg
            .waivers
            .unwrap_or_else(|| DEFAULT_WAIVERS_PATH.to_string()),
        provenance: cfg
            .provenance
            .unwrap_or_else(|| DEFAULT_PROVENANCE_PATH.to_string()),
        workspaces: cfg.workspaces,
        artifacts,
        tier: overrides.tier,
        branch: overrides.branch.or(cfg.context.branch),
        environment: overrides.environment.or(cfg.context.environment),
        changed_files: overrides.changed_files,
        now,
    })
}

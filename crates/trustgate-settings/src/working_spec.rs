use crate::dates::parse_timestamp;
use anyhow::Context;
use serde::Deserialize;
use trustgate_domain::model::{
    ExperimentMode, HumanOverride, NonFunctional, PerfBudgets, WorkingSpec,
};

#[derive(Debug, Deserialize)]
struct RawWorkingSpec {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, alias = "riskTier")]
    risk_tier: Option<u8>,
    #[serde(default, alias = "experimentMode")]
    experiment_mode: Option<RawExperimentMode>,
    #[serde(default, alias = "humanOverride")]
    human_override: Option<RawHumanOverride>,
    #[serde(default, alias = "nonFunctional")]
    non_functional: RawNonFunctional,
}

/// `experiment_mode: true` or a block. A block without `enabled` is enabled.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawExperimentMode {
    Flag(bool),
    Block {
        #[serde(default)]
        enabled: Option<bool>,
        #[serde(default)]
        expires_at: Option<String>,
        #[serde(default)]
        reduced_coverage_threshold: Option<f64>,
    },
}

#[derive(Debug, Deserialize)]
struct RawHumanOverride {
    #[serde(default)]
    approved_by: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    waived_requirements: Vec<String>,
    #[serde(default)]
    expires_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawNonFunctional {
    #[serde(default)]
    perf: Option<RawPerf>,
    #[serde(default)]
    a11y: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawPerf {
    #[serde(default)]
    api_p95_ms: Option<f64>,
    #[serde(default)]
    lcp_ms: Option<f64>,
}

pub fn parse(input: &str) -> anyhow::Result<WorkingSpec> {
    let raw: RawWorkingSpec =
        serde_yaml::from_str(input).context("working spec is not valid YAML")?;

    let risk_tier = raw
        .risk_tier
        .context("working spec is missing risk_tier")?;

    let experiment_mode = raw
        .experiment_mode
        .map(experiment_mode)
        .transpose()
        .context("invalid experiment_mode")?;

    let human_override = raw
        .human_override
        .map(human_override)
        .transpose()
        .context("invalid human_override")?;

    let perf = raw.non_functional.perf.map(|p| PerfBudgets {
        api_p95_ms: p.api_p95_ms,
        lcp_ms: p.lcp_ms,
    });
    for budget in perf.iter().flat_map(|p| [p.api_p95_ms, p.lcp_ms]).flatten() {
        if !budget.is_finite() || budget <= 0.0 {
            anyhow::bail!("perf budgets must be positive (got {budget})");
        }
    }

    Ok(WorkingSpec {
        id: raw.id,
        risk_tier,
        experiment_mode,
        human_override,
        non_functional: NonFunctional {
            perf,
            a11y: raw.non_functional.a11y,
        },
    })
}

fn experiment_mode(raw: RawExperimentMode) -> anyhow::Result<ExperimentMode> {
    match raw {
        RawExperimentMode::Flag(enabled) => Ok(ExperimentMode {
            enabled,
            ..ExperimentMode::default()
        }),
        RawExperimentMode::Block {
            enabled,
            expires_at,
            reduced_coverage_threshold,
        } => {
            if let Some(t) = reduced_coverage_threshold
                && !(0.0..=1.0).contains(&t)
            {
                anyhow::bail!("reduced_coverage_threshold must be within [0, 1] (got {t})");
            }
            Ok(ExperimentMode {
                enabled: enabled.unwrap_or(true),
                expires_at: expires_at.as_deref().map(parse_timestamp).transpose()?,
                reduced_coverage_threshold,
            })
        }
    }
}

fn human_override(raw: RawHumanOverride) -> anyhow::Result<HumanOverride> {
    Ok(HumanOverride {
        approved_by: raw.approved_by,
        reason: raw.reason,
        waived_requirements: raw
            .waived_requirements
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect(),
        expires_at: raw.expires_at.as_deref().map(parse_timestamp).transpose()?,
    })
}

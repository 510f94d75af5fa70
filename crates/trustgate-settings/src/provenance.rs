use anyhow::Context;
use serde::Deserialize;
use trustgate_domain::model::{
    A11yReport, A11yResults, A11yViolation, PerfBaseline, PerfResults, Provenance,
};

#[derive(Debug, Deserialize)]
struct RawProvenance {
    #[serde(default)]
    results: Option<RawResults>,
}

#[derive(Debug, Default, Deserialize)]
struct RawResults {
    #[serde(default)]
    a11y: Option<RawA11y>,
    #[serde(default)]
    perf: Option<RawPerf>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawA11y {
    Status(String),
    Report {
        #[serde(default)]
        violations: Vec<RawViolation>,
        #[serde(default)]
        incomplete: Vec<RawRuleRef>,
        #[serde(default)]
        passes: Vec<RawRuleRef>,
    },
}

/// axe-core emits `nodes` as the list of offending elements; summaries carry a count.
#[derive(Debug, Deserialize)]
struct RawViolation {
    id: String,
    #[serde(default)]
    impact: Option<String>,
    #[serde(default)]
    nodes: Option<RawNodes>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNodes {
    Count(u32),
    List(Vec<serde_json::Value>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRuleRef {
    Id(String),
    Rule { id: String },
}

impl RawRuleRef {
    fn into_id(self) -> String {
        match self {
            RawRuleRef::Id(id) | RawRuleRef::Rule { id } => id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPerf {
    #[serde(default)]
    api_p95_ms: Option<f64>,
    #[serde(default)]
    lcp_ms: Option<f64>,
    #[serde(default)]
    error_rate: Option<f64>,
    #[serde(default)]
    baseline: Option<RawBaseline>,
}

#[derive(Debug, Deserialize)]
struct RawBaseline {
    #[serde(default)]
    api_p95_ms: Option<f64>,
    #[serde(default)]
    lcp_ms: Option<f64>,
}

pub fn parse(input: &str) -> anyhow::Result<Provenance> {
    let raw: RawProvenance =
        serde_json::from_str(input).context("provenance is not valid JSON")?;
    let results = raw.results.unwrap_or_default();

    let a11y = results.a11y.map(a11y).transpose()?;
    let perf = results.perf.map(|p| PerfResults {
        api_p95_ms: p.api_p95_ms,
        lcp_ms: p.lcp_ms,
        error_rate: p.error_rate,
        baseline: p.baseline.map(|b| PerfBaseline {
            api_p95_ms: b.api_p95_ms,
            lcp_ms: b.lcp_ms,
        }),
    });

    Ok(Provenance { a11y, perf })
}

fn a11y(raw: RawA11y) -> anyhow::Result<A11yResults> {
    match raw {
        RawA11y::Status(status) if status.eq_ignore_ascii_case("pass") => Ok(A11yResults::Pass),
        RawA11y::Status(other) => {
            anyhow::bail!("unknown a11y status '{other}' (expected \"pass\" or a results object)")
        }
        RawA11y::Report {
            violations,
            incomplete,
            passes,
        } => Ok(A11yResults::Report(A11yReport {
            violations: violations
                .into_iter()
                .map(|v| A11yViolation {
                    id: v.id,
                    impact: v.impact,
                    nodes: match v.nodes {
                        None => 1,
                        Some(RawNodes::Count(n)) => n,
                        Some(RawNodes::List(list)) => {
                            u32::try_from(list.len()).unwrap_or(u32::MAX)
                        }
                    },
                })
                .collect(),
            incomplete: incomplete.into_iter().map(RawRuleRef::into_id).collect(),
            passes: passes.into_iter().map(RawRuleRef::into_id).collect(),
        })),
    }
}

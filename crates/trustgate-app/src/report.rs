use anyhow::Context;
use serde_json::Value;
use time::OffsetDateTime;
use trustgate_domain::TrustWeights;
use trustgate_render::{
    RenderableComponent, RenderableGate, RenderableReport, RenderableTrust,
    RenderableVerdictStatus,
};
use trustgate_types::{
    GateResult, ReportEnvelope, SCHEMA_REPORT_V1, TrustBreakdown, TrustComponent, TrustScore,
    TrustgateReport, Verdict, ids,
};

use crate::evaluate::tool_meta;

pub fn parse_report_json(text: &str) -> anyhow::Result<TrustgateReport> {
    let value: Value = serde_json::from_str(text).context("parse report json")?;

    let schema = value
        .get("schema")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    if schema != SCHEMA_REPORT_V1 {
        anyhow::bail!("unknown report schema: {schema:?} (expected {SCHEMA_REPORT_V1})");
    }

    serde_json::from_value(value).context("parse trustgate report")
}

pub fn serialize_report(report: &TrustgateReport) -> anyhow::Result<Vec<u8>> {
    serde_json::to_vec_pretty(report).context("serialize report")
}

pub fn to_renderable(report: &TrustgateReport) -> RenderableReport {
    let trust = &report.trust;

    let mut notes = report.errors.clone();
    for audit in &report.waivers {
        for rejected in &audit.rejected {
            notes.push(format!(
                "waiver '{}' not applied to {}: {}",
                rejected.id, audit.gate, rejected.reason
            ));
        }
        for conflict in &audit.conflicts {
            notes.push(format!(
                "waiver conflict on {} between '{}' and '{}': {}",
                audit.gate, conflict.first, conflict.second, conflict.detail
            ));
        }
    }

    RenderableReport {
        verdict: match report.verdict {
            Verdict::Pass => RenderableVerdictStatus::Pass,
            Verdict::Fail => RenderableVerdictStatus::Fail,
        },
        experiment_mode: report.experiment_mode,
        trust: RenderableTrust {
            score: trust.score,
            threshold: trust.threshold,
            tier: trust.tier,
            penalty_applied: trust.contracts_penalty_applied,
            components: trust
                .breakdown
                .components()
                .into_iter()
                .map(|(name, c)| RenderableComponent {
                    name: name.to_string(),
                    score: c.score,
                    weight: c.weight,
                })
                .collect(),
        },
        gates: report.gates.iter().map(renderable_gate).collect(),
        notes,
    }
}

fn renderable_gate(g: &GateResult) -> RenderableGate {
    RenderableGate {
        name: g.gate.as_str().to_string(),
        check_id: g.gate.check_id().to_string(),
        passed: g.passed,
        score: g.score,
        code: detail_str(g, "code").map(str::to_string),
        disposition: disposition(g),
        errors: g.errors.clone(),
    }
}

fn detail_str<'a>(g: &'a GateResult, key: &str) -> Option<&'a str> {
    g.details.get(key).and_then(Value::as_str)
}

/// How the gate passed without a measured score, if it did.
fn disposition(g: &GateResult) -> Option<String> {
    if g.detail_flag(ids::DETAIL_WAIVED) {
        let id = detail_str(g, ids::DETAIL_WAIVER_ID).unwrap_or("?");
        return Some(format!("waived by `{id}`"));
    }
    if g.detail_flag(ids::DETAIL_OVERRIDDEN) {
        let by = detail_str(g, ids::DETAIL_APPROVED_BY).unwrap_or("?");
        return Some(format!("overridden by {by}"));
    }
    if g.detail_flag(ids::DETAIL_SKIPPED) {
        return Some("skipped (experiment mode)".to_string());
    }
    if g.details.get(ids::DETAIL_REQUIRED).and_then(Value::as_bool) == Some(false) && g.passed {
        return Some(match g.details.get(ids::DETAIL_TIER).and_then(Value::as_u64) {
            Some(tier) => format!("not required for tier {tier}"),
            None => "not required".to_string(),
        });
    }
    None
}

/// Report written when the run could not evaluate at all (bad config, missing working spec).
pub fn runtime_error_report(message: &str) -> TrustgateReport {
    let now = OffsetDateTime::now_utc();
    let weights = TrustWeights::default();
    let zero = |weight: f64| TrustComponent { score: 0.0, weight };

    ReportEnvelope {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: tool_meta(),
        started_at: now,
        finished_at: now,
        evaluated_at: now,
        verdict: Verdict::Fail,
        experiment_mode: false,
        trust: TrustScore {
            passed: false,
            score: 0.0,
            tier: 0,
            threshold: trustgate_domain::trust::TRUST_THRESHOLD,
            breakdown: TrustBreakdown {
                coverage: zero(weights.coverage),
                mutation: zero(weights.mutation),
                contracts: zero(weights.contracts),
                a11y: zero(weights.a11y),
                perf: zero(weights.perf),
            },
            contracts_penalty_applied: false,
        },
        gates: Vec::new(),
        waivers: Vec::new(),
        errors: vec![format!(
            "[{}:{}] {}",
            ids::CHECK_TOOL_RUNTIME,
            ids::CODE_RUNTIME_ERROR,
            message
        )],
    }
}

//! The `evaluate` and `gate` use cases: load inputs, run the engine, produce a report.

use anyhow::Context;
use camino::Utf8Path;
use time::OffsetDateTime;
use trustgate_domain::model::{EvaluationContext, Provenance, Waiver, WorkingSpec};
use trustgate_domain::{
    GateInputs, OverrideResolver, PolicyStore, WaiverRegistry, evaluate_gate, evaluate_trust,
};
use trustgate_repo::FsArtifactSource;
use trustgate_settings::{Overrides, ResolvedConfig, TrustgateConfigV1};
use trustgate_types::{
    GateKind, GateResult, ReportEnvelope, SCHEMA_REPORT_V1, ToolMeta, TrustgateReport, Verdict,
    WaiverAudit,
};

/// Input for the evaluate and gate use cases.
#[derive(Clone, Debug)]
pub struct EvaluateInput<'a> {
    /// Repository root path.
    pub repo_root: &'a Utf8Path,
    /// Config file contents (empty string if not found).
    pub config_text: &'a str,
    /// CLI overrides.
    pub overrides: Overrides,
}

#[derive(Clone, Debug)]
pub struct EvaluateOutput {
    pub report: TrustgateReport,
    pub resolved_config: ResolvedConfig,
}

/// Result of evaluating one gate in isolation.
#[derive(Clone, Debug)]
pub struct GateOutput {
    pub result: GateResult,
    pub waivers: WaiverAudit,
    /// Run-level problems (ignored declarations, invalid waiver records).
    pub errors: Vec<String>,
}

/// Everything loaded from disk before the engine runs. The engine itself never reads files.
struct Prepared {
    resolved: ResolvedConfig,
    spec: WorkingSpec,
    waivers: Vec<Waiver>,
    provenance: Provenance,
    context: EvaluationContext,
    source: FsArtifactSource,
    errors: Vec<String>,
}

fn prepare(input: &EvaluateInput<'_>) -> anyhow::Result<Prepared> {
    let cfg = if input.config_text.trim().is_empty() {
        TrustgateConfigV1::default()
    } else {
        trustgate_settings::parse_config_toml(input.config_text).context("parse config")?
    };
    let resolved = trustgate_settings::resolve_config(cfg, input.overrides.clone())
        .context("resolve config")?;

    let root = input.repo_root;
    let mut errors = Vec::new();

    let spec_text = trustgate_repo::read_optional(root, &resolved.working_spec)?
        .with_context(|| {
            format!("working spec not found: {}", root.join(&resolved.working_spec))
        })?;
    let mut spec = trustgate_settings::parse_working_spec_yaml(&spec_text)
        .with_context(|| format!("parse {}", resolved.working_spec))?;
    if let Some(tier) = resolved.tier {
        spec.risk_tier = tier;
    }

    let waivers_text = read_supplementary(root, &resolved.waivers, "waivers file", &mut errors);
    let waivers = match waivers_text {
        None => Vec::new(),
        Some(text) => match trustgate_settings::parse_waivers(&text) {
            Ok(parsed) => {
                for invalid in parsed.invalid {
                    tracing::warn!(
                        waiver = %invalid.id,
                        reason = %invalid.reason,
                        "invalid waiver record"
                    );
                    errors.push(format!("waiver '{}' ignored: {}", invalid.id, invalid.reason));
                }
                parsed.waivers
            }
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "waivers file unusable");
                errors.push(format!("waivers file {} ignored: {err:#}", resolved.waivers));
                Vec::new()
            }
        },
    };

    let provenance_text = read_supplementary(root, &resolved.provenance, "provenance", &mut errors);
    let provenance = match provenance_text {
        None => Provenance::default(),
        Some(text) => trustgate_settings::parse_provenance_json(&text).unwrap_or_else(|err| {
            errors.push(format!("provenance {} ignored: {err:#}", resolved.provenance));
            Provenance::default()
        }),
    };

    let context = EvaluationContext {
        now: resolved.now.unwrap_or_else(OffsetDateTime::now_utc),
        branch: resolved.branch.clone(),
        environment: resolved.environment.clone(),
        changed_files: resolved.changed_files.clone(),
    };

    let source =
        trustgate_repo::artifact_source(root, &resolved).context("build artifact source")?;

    Ok(Prepared {
        resolved,
        spec,
        waivers,
        provenance,
        context,
        source,
        errors,
    })
}

/// Optional input document. Read failures are recorded in `errors` and treated as absent.
fn read_supplementary(
    root: &Utf8Path,
    rel: &str,
    label: &str,
    errors: &mut Vec<String>,
) -> Option<String> {
    match trustgate_repo::read_optional(root, rel) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "{label} unreadable");
            errors.push(format!("{label} {rel} ignored: {err:#}"));
            None
        }
    }
}

/// Run the evaluate use case: load inputs, evaluate every gate, compute trust, build the report.
pub fn run_evaluate(input: EvaluateInput<'_>) -> anyhow::Result<EvaluateOutput> {
    let started_at = OffsetDateTime::now_utc();
    let prepared = prepare(&input)?;

    let evaluation = evaluate_trust(
        &prepared.spec,
        &prepared.waivers,
        &prepared.provenance,
        &prepared.context,
        &prepared.source,
    );

    let mut errors = evaluation.notes;
    errors.extend(prepared.errors);

    let report = ReportEnvelope {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: tool_meta(),
        started_at,
        finished_at: OffsetDateTime::now_utc(),
        evaluated_at: prepared.context.now,
        verdict: Verdict::from_passed(evaluation.trust.passed),
        experiment_mode: evaluation.experiment_mode,
        trust: evaluation.trust,
        gates: evaluation.gates,
        waivers: evaluation
            .waivers
            .iter()
            .map(|r| r.to_audit())
            .filter(|a| a.winner.is_some() || !a.rejected.is_empty() || !a.conflicts.is_empty())
            .collect(),
        errors,
    };

    Ok(EvaluateOutput {
        report,
        resolved_config: prepared.resolved,
    })
}

/// Run a single gate with the same inputs `evaluate` would use.
pub fn run_gate(input: EvaluateInput<'_>, gate: GateKind) -> anyhow::Result<GateOutput> {
    let prepared = prepare(&input)?;
    let directives = OverrideResolver::new().resolve(&prepared.spec, prepared.context.now);

    let inputs = GateInputs {
        tier: prepared.spec.risk_tier,
        directives: &directives,
        waivers: &prepared.waivers,
        context: &prepared.context,
        store: PolicyStore::new(),
        registry: WaiverRegistry::new(),
    };
    let outcome = evaluate_gate(gate, &inputs, &prepared.source);

    let mut errors = directives.notes.clone();
    errors.extend(prepared.errors);

    Ok(GateOutput {
        result: outcome.result,
        waivers: outcome.waivers.to_audit(),
        errors,
    })
}

pub(crate) fn tool_meta() -> ToolMeta {
    ToolMeta {
        name: "trustgate".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// Map verdict to exit code: 0 = pass, 1 = fail.
pub fn verdict_exit_code(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Pass => 0,
        Verdict::Fail => 1,
    }
}

pub fn gate_exit_code(result: &GateResult) -> i32 {
    verdict_exit_code(Verdict::from_passed(result.passed))
}

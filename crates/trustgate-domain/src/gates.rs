//! Per-gate evaluation.
//!
//! The order is fixed and short-circuiting: waiver, human override, experiment mode, then the
//! measured score against the tier threshold. Every failure along the way becomes a failing
//! [`GateResult`]; nothing escapes to the caller.

use crate::artifact::{ArtifactError, ArtifactSource};
use crate::model::{
    ContractMetrics, CoverageMetrics, EvaluationContext, MeasurementReport, MutationMetrics,
    Waiver,
};
use crate::overrides::PolicyDirectives;
use crate::policy::{PolicyStore, TierPolicy};
use crate::waivers::{WaiverRegistry, WaiverResolution};
use std::panic::{AssertUnwindSafe, catch_unwind};
use trustgate_types::explain::expected_format;
use trustgate_types::{GateKind, GateResult, ids};

/// Read-only snapshot shared by the gate evaluations of one run.
#[derive(Clone, Copy, Debug)]
pub struct GateInputs<'a> {
    pub tier: u8,
    pub directives: &'a PolicyDirectives,
    pub waivers: &'a [Waiver],
    pub context: &'a EvaluationContext,
    pub store: PolicyStore,
    pub registry: WaiverRegistry,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GateOutcome {
    pub result: GateResult,
    pub waivers: WaiverResolution,
}

pub fn evaluate_gate(
    gate: GateKind,
    inputs: &GateInputs<'_>,
    source: &dyn ArtifactSource,
) -> GateOutcome {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let waivers = inputs
            .registry
            .resolve(inputs.waivers, gate, inputs.context);
        let result = decide(gate, inputs, &waivers, source);
        GateOutcome { result, waivers }
    }));

    let outcome = outcome.unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        GateOutcome {
            result: GateResult::fail(gate, 0.0)
                .with_error(format!("{gate} gate evaluation aborted: {message}")),
            waivers: WaiverResolution {
                gate,
                winner: None,
                applicable: Vec::new(),
                rejected: Vec::new(),
                conflicts: Vec::new(),
            },
        }
    });

    tracing::info!(
        gate = %gate,
        passed = outcome.result.passed,
        score = outcome.result.score,
        "gate evaluated"
    );
    outcome
}

fn decide(
    gate: GateKind,
    inputs: &GateInputs<'_>,
    waivers: &WaiverResolution,
    source: &dyn ArtifactSource,
) -> GateResult {
    if let Some(winner) = &waivers.winner {
        let mut result = GateResult::pass(gate, 1.0)
            .with_detail(ids::DETAIL_WAIVED, true)
            .with_detail(ids::DETAIL_WAIVER_ID, winner.id.clone())
            .with_detail(ids::DETAIL_APPROVED_BY, winner.approved_by.clone());
        if !waivers.conflicts.is_empty() {
            result = result.with_detail("waiver_conflicts", waivers.conflicts.len());
        }
        return result;
    }

    if let Some(human) = inputs.directives.override_for(gate) {
        return GateResult::pass(gate, 1.0)
            .with_detail(ids::DETAIL_OVERRIDDEN, true)
            .with_detail(ids::DETAIL_APPROVED_BY, human.approved_by.clone())
            .with_detail(ids::DETAIL_REASON, human.reason.clone());
    }

    if let Some(adjustment) = &inputs.directives.experiment {
        let skipped = match gate {
            GateKind::Mutation => adjustment.skip_mutation,
            GateKind::Contracts => adjustment.skip_contracts,
            GateKind::Coverage => false,
        };
        if skipped {
            return GateResult::pass(gate, 1.0)
                .with_detail(ids::DETAIL_EXPERIMENT_MODE, true)
                .with_detail(ids::DETAIL_SKIPPED, true);
        }
        if gate == GateKind::Coverage {
            let policy = inputs.store.experiment_policy(adjustment);
            return measure(gate, &policy, source).with_detail(ids::DETAIL_EXPERIMENT_MODE, true);
        }
    }

    let Some(policy) = inputs.store.get_tier_policy(inputs.tier) else {
        return GateResult::fail(gate, 0.0)
            .with_detail("code", ids::CODE_UNKNOWN_TIER)
            .with_detail(ids::DETAIL_TIER, inputs.tier)
            .with_error(format!(
                "unknown risk tier {} (expected 1, 2 or 3)",
                inputs.tier
            ));
    };

    measure(gate, &policy, source)
}

fn measure(gate: GateKind, policy: &TierPolicy, source: &dyn ArtifactSource) -> GateResult {
    let report = match source.load(gate) {
        Ok(report) => report,
        Err(ArtifactError::Missing { .. })
            if gate == GateKind::Contracts && !policy.requires_contracts =>
        {
            return GateResult::pass(gate, 1.0)
                .with_detail(ids::DETAIL_REQUIRED, false)
                .with_detail(ids::DETAIL_TIER, policy.tier);
        }
        Err(err) => return artifact_failure(gate, err),
    };

    match (gate, report) {
        (GateKind::Coverage, MeasurementReport::Coverage(m)) => check_coverage(&m, policy),
        (GateKind::Mutation, MeasurementReport::Mutation(m)) => check_mutation(&m, policy),
        (GateKind::Contracts, MeasurementReport::Contracts(m)) => check_contracts(&m, policy),
        (gate, other) => GateResult::fail(gate, 0.0)
            .with_detail("code", ids::CODE_PARSE_ERROR)
            .with_error(format!(
                "expected a {gate} report but the source returned a {} report",
                other.kind()
            )),
    }
}

fn artifact_failure(gate: GateKind, err: ArtifactError) -> GateResult {
    let message = err.to_string();
    match err {
        ArtifactError::Missing {
            searched, command, ..
        } => {
            let mut result = GateResult::fail(gate, 0.0)
                .with_detail("code", ids::CODE_MISSING_ARTIFACT)
                .with_detail(ids::DETAIL_SEARCHED, searched)
                .with_detail(ids::DETAIL_EXPECTED_FORMAT, expected_format(gate))
                .with_error(message);
            if let Some(command) = command {
                result = result
                    .with_error(format!("run `{command}` to generate the {gate} report"))
                    .with_detail(ids::DETAIL_COMMAND, command);
            }
            result
        }
        ArtifactError::Parse { path, .. } => GateResult::fail(gate, 0.0)
            .with_detail("code", ids::CODE_PARSE_ERROR)
            .with_detail(ids::DETAIL_SOURCE, path)
            .with_detail(ids::DETAIL_EXPECTED_FORMAT, expected_format(gate))
            .with_error(message),
        ArtifactError::Io { path, .. } => GateResult::fail(gate, 0.0)
            .with_detail("code", ids::CODE_MISSING_ARTIFACT)
            .with_detail(ids::DETAIL_SOURCE, path)
            .with_error(message),
    }
}

fn ratio(covered: u64, total: u64) -> Option<f64> {
    (total > 0).then(|| covered as f64 / total as f64)
}

/// Branch coverage against `policy.min_branch`. A report without branches fails.
pub fn check_coverage(m: &CoverageMetrics, policy: &TierPolicy) -> GateResult {
    let Some(score) = ratio(m.branches_covered, m.branches_total) else {
        return GateResult::fail(GateKind::Coverage, 0.0)
            .with_detail("code", ids::CODE_BELOW_THRESHOLD)
            .with_detail(ids::DETAIL_THRESHOLD, policy.min_branch)
            .with_detail(ids::DETAIL_TIER, policy.tier)
            .with_detail("statements_covered", m.statements_covered)
            .with_detail("statements_total", m.statements_total)
            .with_error("coverage report contains no branches");
    };

    let passed = score >= policy.min_branch;
    let mut result = if passed {
        GateResult::pass(GateKind::Coverage, score)
    } else {
        GateResult::fail(GateKind::Coverage, score).with_error(format!(
            "branch coverage {score:.2} is below the tier {} minimum {:.2}",
            policy.tier, policy.min_branch
        ))
    };

    result = result
        .with_detail(ids::DETAIL_THRESHOLD, policy.min_branch)
        .with_detail(ids::DETAIL_TIER, policy.tier)
        .with_detail("branches_covered", m.branches_covered)
        .with_detail("branches_total", m.branches_total)
        .with_detail("statements_covered", m.statements_covered)
        .with_detail("statements_total", m.statements_total)
        .with_detail("functions_covered", m.functions_covered)
        .with_detail("functions_total", m.functions_total);
    if !passed {
        result = result.with_detail("code", ids::CODE_BELOW_THRESHOLD);
    }
    result
}

/// Mutation score `killed / max(total_detected, 1)` against `policy.min_mutation`.
pub fn check_mutation(m: &MutationMetrics, policy: &TierPolicy) -> GateResult {
    let score = m.killed as f64 / m.total_detected.max(1) as f64;
    let passed = score >= policy.min_mutation;

    let mut result = if passed {
        GateResult::pass(GateKind::Mutation, score)
    } else {
        GateResult::fail(GateKind::Mutation, score)
            .with_detail("code", ids::CODE_BELOW_THRESHOLD)
            .with_error(format!(
                "mutation score {score:.2} is below the tier {} minimum {:.2}",
                policy.tier, policy.min_mutation
            ))
    };
    result = result
        .with_detail(ids::DETAIL_THRESHOLD, policy.min_mutation)
        .with_detail(ids::DETAIL_TIER, policy.tier)
        .with_detail("killed", m.killed)
        .with_detail("survived", m.survived)
        .with_detail("total_detected", m.total_detected);
    result
}

/// All contract tests passed and at least one ran.
pub fn check_contracts(m: &ContractMetrics, policy: &TierPolicy) -> GateResult {
    let passed = m.num_total > 0 && m.num_passed == m.num_total;

    let result = if passed {
        GateResult::pass(GateKind::Contracts, 1.0)
    } else if m.num_total == 0 {
        GateResult::fail(GateKind::Contracts, 0.0)
            .with_detail("code", ids::CODE_CONTRACTS_FAILING)
            .with_error("no contract tests ran")
    } else {
        GateResult::fail(GateKind::Contracts, 0.0)
            .with_detail("code", ids::CODE_CONTRACTS_FAILING)
            .with_error(format!(
                "{} of {} contract tests passed",
                m.num_passed, m.num_total
            ))
    };

    result
        .with_detail(ids::DETAIL_REQUIRED, policy.requires_contracts)
        .with_detail(ids::DETAIL_TIER, policy.tier)
        .with_detail("num_passed", m.num_passed)
        .with_detail("num_total", m.num_total)
        .with_detail("consumer", m.consumer)
        .with_detail("provider", m.provider)
}

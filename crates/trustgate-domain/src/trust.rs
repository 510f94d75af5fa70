//! Trust score aggregation.
//!
//! Fans the three gates out over rayon, then folds the gate scores together with the
//! accessibility and performance sub-scores into one weighted [`TrustScore`].

use crate::artifact::ArtifactSource;
use crate::gates::{GateInputs, evaluate_gate};
use crate::model::{
    A11yReport, A11yResults, EvaluationContext, PerfBudgets, PerfResults, Provenance, Waiver,
    WorkingSpec,
};
use crate::overrides::OverrideResolver;
use crate::policy::{EXPERIMENT_TIER, PolicyStore};
use crate::waivers::{WaiverRegistry, WaiverResolution};
use rayon::prelude::*;
use trustgate_types::{GateKind, GateResult, TrustBreakdown, TrustComponent, TrustScore};

pub const TRUST_THRESHOLD: f64 = 0.8;

/// Multiplier applied when contracts fail on a tier that requires them.
pub const CONTRACTS_PENALTY: f64 = 0.8;

/// Highest tier that is penalized for failing contracts.
const CONTRACTS_PENALTY_MAX_TIER: u8 = 2;

/// Perf sub-score when the working spec declares no budgets to measure against.
pub const NEUTRAL_PERF_SCORE: f64 = 0.5;

const MAX_OVERRUN_PENALTY: f64 = 0.5;
const OVERRUN_FACTOR: f64 = 0.3;
const REGRESSION_TOLERANCE: f64 = 1.05;
const REGRESSION_PENALTY: f64 = 0.1;
const ERROR_RATE_LIMIT: f64 = 0.01;
const ERROR_RATE_PENALTY: f64 = 0.2;

const A11Y_BASE: f64 = 0.8;
const A11Y_PENALTY_STEP: f64 = 0.1;
const A11Y_INCOMPLETE_PENALTY: f64 = 0.2;
const A11Y_UNMET_REQUIREMENT_PENALTY: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrustWeights {
    pub coverage: f64,
    pub mutation: f64,
    pub contracts: f64,
    pub a11y: f64,
    pub perf: f64,
}

impl Default for TrustWeights {
    fn default() -> Self {
        Self {
            coverage: 0.3,
            mutation: 0.3,
            contracts: 0.2,
            a11y: 0.1,
            perf: 0.1,
        }
    }
}

impl TrustWeights {
    pub fn total(&self) -> f64 {
        self.coverage + self.mutation + self.contracts + self.a11y + self.perf
    }

    fn for_gate(&self, gate: GateKind) -> f64 {
        match gate {
            GateKind::Coverage => self.coverage,
            GateKind::Mutation => self.mutation,
            GateKind::Contracts => self.contracts,
        }
    }
}

/// Everything one aggregation produced.
#[derive(Clone, Debug, PartialEq)]
pub struct TrustEvaluation {
    pub trust: TrustScore,
    /// In [`GateKind::ALL`] order.
    pub gates: Vec<GateResult>,
    pub waivers: Vec<WaiverResolution>,
    pub experiment_mode: bool,
    /// Declarations that were ignored (expired override, expired experiment).
    pub notes: Vec<String>,
}

/// Evaluate all gates for one change and compute its trust score.
///
/// Never fails: artifact problems, unknown tiers, and panics inside a gate all surface as
/// failing gate results.
pub fn evaluate_trust(
    spec: &WorkingSpec,
    waivers: &[Waiver],
    provenance: &Provenance,
    ctx: &EvaluationContext,
    source: &dyn ArtifactSource,
) -> TrustEvaluation {
    let directives = OverrideResolver::new().resolve(spec, ctx.now);
    let experiment_mode = directives.experiment_active();
    let effective_tier = if experiment_mode {
        EXPERIMENT_TIER
    } else {
        spec.risk_tier
    };

    let inputs = GateInputs {
        tier: spec.risk_tier,
        directives: &directives,
        waivers,
        context: ctx,
        store: PolicyStore::new(),
        registry: WaiverRegistry::new(),
    };

    let outcomes: Vec<_> = GateKind::ALL
        .par_iter()
        .map(|&gate| evaluate_gate(gate, &inputs, source))
        .collect();

    let (gates, resolutions): (Vec<_>, Vec<_>) =
        outcomes.into_iter().map(|o| (o.result, o.waivers)).unzip();

    let a11y = a11y_score(provenance.a11y.as_ref(), &spec.non_functional.a11y);
    let perf = perf_score(spec.non_functional.perf.as_ref(), provenance.perf.as_ref());
    let trust = aggregate(&gates, a11y, perf, effective_tier, &TrustWeights::default());

    tracing::info!(
        score = trust.score,
        passed = trust.passed,
        tier = trust.tier,
        penalty = trust.contracts_penalty_applied,
        "trust score computed"
    );

    TrustEvaluation {
        trust,
        gates,
        waivers: resolutions,
        experiment_mode,
        notes: directives.notes,
    }
}

/// Weighted mean of the sub-scores, with the contracts penalty for tiers 1 and 2.
pub fn aggregate(
    gates: &[GateResult],
    a11y: f64,
    perf: f64,
    tier: u8,
    weights: &TrustWeights,
) -> TrustScore {
    let component = |gate: GateKind| TrustComponent {
        score: gates
            .iter()
            .find(|g| g.gate == gate)
            .map_or(0.0, |g| g.score),
        weight: weights.for_gate(gate),
    };

    let breakdown = TrustBreakdown {
        coverage: component(GateKind::Coverage),
        mutation: component(GateKind::Mutation),
        contracts: component(GateKind::Contracts),
        a11y: TrustComponent {
            score: a11y,
            weight: weights.a11y,
        },
        perf: TrustComponent {
            score: perf,
            weight: weights.perf,
        },
    };

    let total_weight = breakdown.total_weight();
    let mut score = if total_weight > 0.0 {
        breakdown
            .components()
            .iter()
            .map(|(_, c)| c.score * c.weight)
            .sum::<f64>()
            / total_weight
    } else {
        0.0
    };

    let contracts_failed = gates
        .iter()
        .find(|g| g.gate == GateKind::Contracts)
        .is_none_or(|g| !g.passed);
    let contracts_penalty_applied = tier <= CONTRACTS_PENALTY_MAX_TIER && contracts_failed;
    if contracts_penalty_applied {
        score *= CONTRACTS_PENALTY;
    }

    TrustScore {
        passed: score >= TRUST_THRESHOLD,
        score,
        tier,
        threshold: TRUST_THRESHOLD,
        breakdown,
        contracts_penalty_applied,
    }
}

fn severity_weight(impact: Option<&str>) -> f64 {
    match impact.map(str::to_ascii_lowercase).as_deref() {
        Some("critical") => 1.0,
        Some("serious") => 0.8,
        Some("moderate") => 0.6,
        _ => 0.3,
    }
}

/// Accessibility sub-score in `[0, 1]`.
pub fn a11y_score(results: Option<&A11yResults>, requirements: &[String]) -> f64 {
    let report = match results {
        None | Some(A11yResults::Pass) => return 1.0,
        Some(A11yResults::Report(report)) => report,
    };

    let penalty = a11y_penalty(report, requirements);
    if penalty == 0.0 {
        return 1.0;
    }
    (A11Y_BASE - A11Y_PENALTY_STEP * penalty).max(0.0)
}

fn a11y_penalty(report: &A11yReport, requirements: &[String]) -> f64 {
    let violations: f64 = report
        .violations
        .iter()
        .map(|v| severity_weight(v.impact.as_deref()) * f64::from(v.nodes))
        .sum();
    let incomplete = A11Y_INCOMPLETE_PENALTY * report.incomplete.len() as f64;
    let unmet = requirements
        .iter()
        .filter(|req| !report.passes.iter().any(|p| p.eq_ignore_ascii_case(req)))
        .count();

    violations + incomplete + A11Y_UNMET_REQUIREMENT_PENALTY * unmet as f64
}

/// Performance sub-score in `[0, 1]`. Neutral when there is nothing to measure against.
pub fn perf_score(budgets: Option<&PerfBudgets>, results: Option<&PerfResults>) -> f64 {
    let Some(budgets) = budgets.filter(|b| !b.is_empty()) else {
        return NEUTRAL_PERF_SCORE;
    };
    let Some(results) = results else {
        return NEUTRAL_PERF_SCORE;
    };

    let mut score = 1.0;
    for (budget, actual) in [
        (budgets.api_p95_ms, results.api_p95_ms),
        (budgets.lcp_ms, results.lcp_ms),
    ] {
        if let (Some(budget), Some(actual)) = (budget, actual)
            && budget > 0.0
            && actual > budget
        {
            let overrun = (actual - budget) / budget;
            score -= (overrun * OVERRUN_FACTOR).min(MAX_OVERRUN_PENALTY);
        }
    }

    if let Some(baseline) = &results.baseline {
        for (base, actual) in [
            (baseline.api_p95_ms, results.api_p95_ms),
            (baseline.lcp_ms, results.lcp_ms),
        ] {
            if let (Some(base), Some(actual)) = (base, actual)
                && actual > base * REGRESSION_TOLERANCE
            {
                score -= REGRESSION_PENALTY;
            }
        }
    }

    if results.error_rate.is_some_and(|rate| rate > ERROR_RATE_LIMIT) {
        score -= ERROR_RATE_PENALTY;
    }

    f64::max(score, 0.0)
}

//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - Threshold comparisons for every base tier
//! - Score arithmetic on degenerate reports
//! - Waiver resolution determinism and expiry

use crate::gates::{check_contracts, check_coverage, check_mutation};
use crate::model::{ContractMetrics, CoverageMetrics, ImpactLevel, MutationMetrics, Waiver};
use crate::policy::PolicyStore;
use crate::test_support::{ctx_at, day, waiver};
use crate::trust::{TrustWeights, aggregate};
use crate::waivers::WaiverRegistry;
use proptest::prelude::*;
use trustgate_types::{GateKind, GateResult};

// ============================================================================
// Strategies
// ============================================================================

fn arb_tier() -> impl Strategy<Value = u8> {
    1u8..=3
}

/// (covered, total) with covered <= total and total > 0.
fn arb_ratio() -> impl Strategy<Value = (u64, u64)> {
    (1u64..10_000).prop_flat_map(|total| (0..=total, Just(total)))
}

fn arb_impact() -> impl Strategy<Value = ImpactLevel> {
    prop_oneof![
        Just(ImpactLevel::Low),
        Just(ImpactLevel::Medium),
        Just(ImpactLevel::High),
        Just(ImpactLevel::Critical),
    ]
}

fn approver_for(impact: ImpactLevel) -> &'static str {
    match impact {
        ImpactLevel::Low => "developer",
        ImpactLevel::Medium => "tech-lead",
        ImpactLevel::High => "engineering-manager",
        ImpactLevel::Critical => "ciso",
    }
}

/// Distinct-id coverage waivers created within the last few days of `day(20)`.
fn arb_waivers() -> impl Strategy<Value = Vec<Waiver>> {
    prop::collection::vec((15i64..=20, arb_impact()), 1..8).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (created, impact))| {
                let mut w = waiver(&format!("W-{i:02}"), day(created));
                w.impact_level = impact;
                w.approved_by = approver_for(impact).to_string();
                w
            })
            .collect()
    })
}

// ============================================================================
// Gate arithmetic
// ============================================================================

proptest! {
    /// Coverage passes exactly when the branch ratio meets the tier minimum.
    #[test]
    fn coverage_threshold_property(tier in arb_tier(), (covered, total) in arb_ratio()) {
        let policy = PolicyStore::new().get_tier_policy(tier).unwrap();
        let metrics = CoverageMetrics {
            branches_covered: covered,
            branches_total: total,
            ..CoverageMetrics::default()
        };
        let ratio = covered as f64 / total as f64;
        let result = check_coverage(&metrics, &policy);
        prop_assert_eq!(result.passed, ratio >= policy.min_branch);
        prop_assert!((result.score - ratio).abs() < 1e-12);
    }

    /// Mutation scoring never divides by zero and stays in [0, 1].
    #[test]
    fn mutation_score_is_bounded(
        tier in arb_tier(),
        killed in 0u64..1_000,
        survived in 0u64..1_000,
        extra in 0u64..10,
    ) {
        let policy = PolicyStore::new().get_tier_policy(tier).unwrap();
        let metrics = MutationMetrics { killed, survived, total_detected: killed + survived + extra };
        let result = check_mutation(&metrics, &policy);
        prop_assert!(result.score.is_finite());
        prop_assert!((0.0..=1.0).contains(&result.score));
        prop_assert_eq!(result.passed, result.score >= policy.min_mutation);
    }

    /// Contracts pass only when every test passed and at least one ran.
    #[test]
    fn contract_boundary(tier in arb_tier(), passed in 0u64..50, total in 0u64..50) {
        let policy = PolicyStore::new().get_tier_policy(tier).unwrap();
        let metrics = ContractMetrics { num_passed: passed, num_total: total, consumer: true, provider: true };
        let result = check_contracts(&metrics, &policy);
        prop_assert_eq!(result.passed, total > 0 && passed == total);
        prop_assert_eq!(result.score, if result.passed { 1.0 } else { 0.0 });
    }

    /// Trust stays within [0, 1] for any in-range sub-scores.
    #[test]
    fn trust_score_is_bounded(
        scores in prop::array::uniform5(0.0f64..=1.0),
        passed in prop::array::uniform3(any::<bool>()),
        tier in 1u8..=4,
    ) {
        let gates: Vec<GateResult> = GateKind::ALL
            .iter()
            .zip(scores.iter().zip(passed.iter()))
            .map(|(&gate, (&score, &ok))| {
                if ok { GateResult::pass(gate, score) } else { GateResult::fail(gate, score) }
            })
            .collect();
        let trust = aggregate(&gates, scores[3], scores[4], tier, &TrustWeights::default());
        prop_assert!((0.0..=1.0 + 1e-12).contains(&trust.score));
        prop_assert_eq!(trust.passed, trust.score >= trust.threshold);
    }
}

// ============================================================================
// Waiver resolution
// ============================================================================

proptest! {
    /// The winner does not depend on the order the waivers were loaded in.
    #[test]
    fn waiver_resolution_is_order_independent(
        (original, shuffled) in arb_waivers()
            .prop_flat_map(|ws| (Just(ws.clone()), Just(ws).prop_shuffle())),
    ) {
        let registry = WaiverRegistry::new();
        let ctx = ctx_at(day(20));
        let a = registry.resolve(&original, GateKind::Coverage, &ctx);
        let b = registry.resolve(&shuffled, GateKind::Coverage, &ctx);
        prop_assert_eq!(a.winner.map(|w| w.id), b.winner.map(|w| w.id));
        prop_assert_eq!(a.applicable, b.applicable);
    }

    /// A waiver past its expiry never applies, whatever else is true about it.
    #[test]
    fn expired_waivers_never_apply(
        impact in arb_impact(),
        created in 0i64..30,
        lifetime in 0i64..30,
        after in 1i64..60,
    ) {
        let mut w = waiver("W-exp", day(created));
        w.impact_level = impact;
        w.approved_by = approver_for(impact).to_string();
        w.expires_at = day(created + lifetime);
        let ctx = ctx_at(day(created + lifetime + after));
        let (applicable, _) =
            WaiverRegistry::new().find_applicable_waivers(&[w], GateKind::Coverage, &ctx);
        prop_assert!(applicable.is_empty());
    }
}

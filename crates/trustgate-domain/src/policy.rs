//! Risk-tier policies.
//!
//! The base tier table is a set of constants. The experiment tier is a value computed per
//! evaluation by [`build_effective_policy`] and is never stored in the table.

/// Tier id reported when experiment mode synthesized the policy.
pub const EXPERIMENT_TIER: u8 = 4;

/// Tier the experiment policy is derived from.
pub const EXPERIMENT_BASE_TIER: u8 = 2;

/// Default relaxed threshold when an experiment does not name one.
pub const DEFAULT_REDUCED_COVERAGE_THRESHOLD: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TierPolicy {
    pub tier: u8,
    pub min_branch: f64,
    pub min_mutation: f64,
    pub min_coverage: f64,
    pub requires_contracts: bool,
    pub requires_manual_review: bool,
}

const TIER_1: TierPolicy = TierPolicy {
    tier: 1,
    min_branch: 0.9,
    min_mutation: 0.7,
    min_coverage: 0.9,
    requires_contracts: true,
    requires_manual_review: true,
};

const TIER_2: TierPolicy = TierPolicy {
    tier: 2,
    min_branch: 0.8,
    min_mutation: 0.5,
    min_coverage: 0.8,
    requires_contracts: true,
    requires_manual_review: false,
};

const TIER_3: TierPolicy = TierPolicy {
    tier: 3,
    min_branch: 0.7,
    min_mutation: 0.3,
    min_coverage: 0.7,
    requires_contracts: false,
    requires_manual_review: false,
};

/// Relaxations applied while a change runs in experiment mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExperimentAdjustment {
    pub skip_mutation: bool,
    pub skip_contracts: bool,
    pub reduced_coverage_threshold: f64,
    pub skip_manual_review: bool,
}

impl Default for ExperimentAdjustment {
    fn default() -> Self {
        Self {
            skip_mutation: true,
            skip_contracts: true,
            reduced_coverage_threshold: DEFAULT_REDUCED_COVERAGE_THRESHOLD,
            skip_manual_review: true,
        }
    }
}

/// Read-only view over the base tier table.
#[derive(Clone, Copy, Debug, Default)]
pub struct PolicyStore;

impl PolicyStore {
    pub fn new() -> Self {
        PolicyStore
    }

    /// Base policy for tiers 1..=3. Any other tier, including the transient experiment tier,
    /// is unknown to the store.
    pub fn get_tier_policy(&self, tier: u8) -> Option<TierPolicy> {
        match tier {
            1 => Some(TIER_1),
            2 => Some(TIER_2),
            3 => Some(TIER_3),
            _ => None,
        }
    }

    /// Policy for an experiment-mode evaluation, derived from the experiment base tier.
    pub fn experiment_policy(&self, adjustment: &ExperimentAdjustment) -> TierPolicy {
        build_effective_policy(TIER_2, adjustment)
    }
}

/// Synthesize the experiment tier from `base`. Returns a fresh value; `base` is untouched.
pub fn build_effective_policy(base: TierPolicy, adjustment: &ExperimentAdjustment) -> TierPolicy {
    let threshold = adjustment.reduced_coverage_threshold.clamp(0.0, 1.0);
    let mut policy = base;
    policy.tier = EXPERIMENT_TIER;
    policy.min_branch = threshold;
    policy.min_coverage = threshold;
    policy.min_mutation = 0.0;
    policy.requires_contracts = false;
    policy.requires_manual_review = false;
    policy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_tiers_are_ordered_by_strictness() {
        let store = PolicyStore::new();
        let t1 = store.get_tier_policy(1).expect("tier 1");
        let t2 = store.get_tier_policy(2).expect("tier 2");
        let t3 = store.get_tier_policy(3).expect("tier 3");

        assert!(t1.min_branch > t2.min_branch && t2.min_branch > t3.min_branch);
        assert!(t1.min_mutation > t2.min_mutation && t2.min_mutation > t3.min_mutation);
        assert!(t1.requires_manual_review);
        assert!(t2.requires_contracts);
        assert!(!t3.requires_contracts);
    }

    #[test]
    fn unknown_tiers_have_no_policy() {
        let store = PolicyStore::new();
        assert!(store.get_tier_policy(0).is_none());
        assert!(store.get_tier_policy(EXPERIMENT_TIER).is_none());
        assert!(store.get_tier_policy(9).is_none());
    }

    #[test]
    fn experiment_policy_relaxes_tier_two() {
        let store = PolicyStore::new();
        let adjustment = ExperimentAdjustment {
            reduced_coverage_threshold: 0.55,
            ..ExperimentAdjustment::default()
        };

        let policy = store.experiment_policy(&adjustment);
        assert_eq!(policy.tier, EXPERIMENT_TIER);
        assert_eq!(policy.min_branch, 0.55);
        assert_eq!(policy.min_coverage, 0.55);
        assert_eq!(policy.min_mutation, 0.0);
        assert!(!policy.requires_contracts);
        assert!(!policy.requires_manual_review);

        // The table is unaffected.
        assert_eq!(store.get_tier_policy(2), Some(TIER_2));
        assert!(store.get_tier_policy(EXPERIMENT_TIER).is_none());
    }

    #[test]
    fn reduced_threshold_is_clamped() {
        let adjustment = ExperimentAdjustment {
            reduced_coverage_threshold: 1.4,
            ..ExperimentAdjustment::default()
        };
        assert_eq!(build_effective_policy(TIER_3, &adjustment).min_branch, 1.0);
    }
}

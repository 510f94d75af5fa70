//! Human-override and experiment-mode declarations on the working spec.
//!
//! The resolver turns the declarations into directives the gate evaluator consumes before it
//! falls back to the tier policy.

use crate::model::{HumanOverride, WorkingSpec};
use crate::policy::{DEFAULT_REDUCED_COVERAGE_THRESHOLD, ExperimentAdjustment};
use time::OffsetDateTime;
use trustgate_types::GateKind;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolicyDirectives {
    pub human_override: Option<HumanOverride>,
    pub experiment: Option<ExperimentAdjustment>,
    /// Why a declaration was ignored (expired, unapproved). Surfaced in the report.
    pub notes: Vec<String>,
}

impl PolicyDirectives {
    pub fn override_for(&self, gate: GateKind) -> Option<&HumanOverride> {
        self.human_override.as_ref().filter(|o| o.waives(gate))
    }

    pub fn experiment_active(&self) -> bool {
        self.experiment.is_some()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct OverrideResolver;

impl OverrideResolver {
    pub fn new() -> Self {
        OverrideResolver
    }

    pub fn resolve(&self, spec: &WorkingSpec, now: OffsetDateTime) -> PolicyDirectives {
        let mut directives = PolicyDirectives::default();

        if let Some(human) = &spec.human_override {
            if human.approved_by.trim().is_empty() {
                directives
                    .notes
                    .push("human override ignored: missing approved_by".to_string());
            } else if human.expires_at.is_some_and(|at| now > at) {
                directives
                    .notes
                    .push("human override ignored: expired".to_string());
            } else {
                tracing::info!(
                    approved_by = %human.approved_by,
                    reason = %human.reason,
                    "human override in effect"
                );
                directives.human_override = Some(human.clone());
            }
        }

        if let Some(experiment) = spec.experiment_mode.as_ref().filter(|e| e.enabled) {
            if experiment.expires_at.is_some_and(|at| now > at) {
                directives
                    .notes
                    .push("experiment mode ignored: expired".to_string());
            } else {
                directives.experiment = Some(ExperimentAdjustment {
                    reduced_coverage_threshold: experiment
                        .reduced_coverage_threshold
                        .unwrap_or(DEFAULT_REDUCED_COVERAGE_THRESHOLD),
                    ..ExperimentAdjustment::default()
                });
            }
        }

        directives
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExperimentMode;
    use crate::test_support::{day, human_override};

    #[test]
    fn no_declarations_yield_no_directives() {
        let directives = OverrideResolver::new().resolve(&WorkingSpec::default(), day(0));
        assert_eq!(directives, PolicyDirectives::default());
    }

    #[test]
    fn override_applies_only_to_waived_requirements() {
        let spec = WorkingSpec {
            human_override: Some(human_override(&["mutation_testing"], None)),
            ..WorkingSpec::default()
        };
        let directives = OverrideResolver::new().resolve(&spec, day(0));
        assert!(directives.override_for(GateKind::Mutation).is_some());
        assert!(directives.override_for(GateKind::Coverage).is_none());
        assert!(directives.override_for(GateKind::Contracts).is_none());
    }

    #[test]
    fn expired_override_is_ignored_with_note() {
        let spec = WorkingSpec {
            human_override: Some(human_override(&["coverage"], Some(day(5)))),
            ..WorkingSpec::default()
        };
        let directives = OverrideResolver::new().resolve(&spec, day(6));
        assert!(directives.human_override.is_none());
        assert_eq!(directives.notes, vec!["human override ignored: expired"]);
    }

    #[test]
    fn unapproved_override_is_ignored() {
        let mut human = human_override(&["coverage"], None);
        human.approved_by = "  ".to_string();
        let spec = WorkingSpec {
            human_override: Some(human),
            ..WorkingSpec::default()
        };
        let directives = OverrideResolver::new().resolve(&spec, day(0));
        assert!(directives.human_override.is_none());
        assert_eq!(directives.notes.len(), 1);
    }

    #[test]
    fn experiment_mode_uses_declared_threshold() {
        let spec = WorkingSpec {
            experiment_mode: Some(ExperimentMode {
                enabled: true,
                expires_at: Some(day(10)),
                reduced_coverage_threshold: Some(0.6),
            }),
            ..WorkingSpec::default()
        };
        let directives = OverrideResolver::new().resolve(&spec, day(1));
        let adjustment = directives.experiment.expect("experiment active");
        assert_eq!(adjustment.reduced_coverage_threshold, 0.6);
        assert!(adjustment.skip_mutation);
        assert!(adjustment.skip_contracts);
        assert!(adjustment.skip_manual_review);
    }

    #[test]
    fn disabled_or_expired_experiment_is_inactive() {
        let disabled = WorkingSpec {
            experiment_mode: Some(ExperimentMode::default()),
            ..WorkingSpec::default()
        };
        assert!(
            !OverrideResolver::new()
                .resolve(&disabled, day(0))
                .experiment_active()
        );

        let expired = WorkingSpec {
            experiment_mode: Some(ExperimentMode {
                enabled: true,
                expires_at: Some(day(1)),
                reduced_coverage_threshold: None,
            }),
            ..WorkingSpec::default()
        };
        let directives = OverrideResolver::new().resolve(&expired, day(2));
        assert!(!directives.experiment_active());
        assert_eq!(directives.notes, vec!["experiment mode ignored: expired"]);
    }
}

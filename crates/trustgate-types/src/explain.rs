//! Explain registry for gates and codes.
//!
//! Maps gate check IDs and codes to human-readable explanations with remediation guidance.
//! The artifact format strings double as the diagnostic hint attached to missing-artifact
//! failures.

use crate::{GateKind, ids};

/// Explanation entry for a gate or code.
#[derive(Debug, Clone)]
pub struct Explanation {
    /// Short description of the gate/code.
    pub title: &'static str,
    /// What the gate measures and how it decides.
    pub description: &'static str,
    /// How to fix failures.
    pub remediation: &'static str,
    /// Shape of the report artifact the gate consumes, if any.
    pub artifact_format: Option<&'static str>,
}

/// Shape of the artifact each gate reads, as shown in missing-artifact hints.
pub fn expected_format(gate: GateKind) -> &'static str {
    match gate {
        GateKind::Coverage => {
            r#"Istanbul coverage-final.json: {"<file>": {"s": {"<id>": <count>}, "b": {"<id>": [<count>, ...]}, "f": {"<id>": <count>}}}"#
        }
        GateKind::Mutation => {
            r#"Stryker mutation report: {"metrics": {"killed": <n>, "survived": <n>, "totalDetected": <n>}}"#
        }
        GateKind::Contracts => {
            r#"contract results: {"numPassed": <n>, "numTotal": <n>, "consumer": <bool>, "provider": <bool>}"#
        }
    }
}

/// Look up an explanation by gate name, check_id, or code.
///
/// Returns `None` if the identifier is not recognized.
pub fn lookup_explanation(identifier: &str) -> Option<Explanation> {
    match identifier {
        ids::CHECK_GATE_COVERAGE | "coverage" => Some(explain_coverage()),
        ids::CHECK_GATE_MUTATION | "mutation" => Some(explain_mutation()),
        ids::CHECK_GATE_CONTRACTS | "contracts" => Some(explain_contracts()),

        ids::CODE_BELOW_THRESHOLD => Some(Explanation {
            title: "Score below tier threshold",
            description: "The measured score is lower than the minimum the risk tier requires. \
Tier 1 is the strictest, tier 3 the most lenient.",
            remediation: "Add tests for the uncovered branches or surviving mutants, or lower the \
risk tier in the working spec if the change was mis-classified.",
            artifact_format: None,
        }),
        ids::CODE_CONTRACTS_FAILING => Some(Explanation {
            title: "Contract tests failing",
            description: "Not every contract test passed, or no contract tests ran at all.",
            remediation: "Fix the failing consumer/provider contracts. A run with zero contract \
tests never passes.",
            artifact_format: Some(expected_format(GateKind::Contracts)),
        }),
        ids::CODE_MISSING_ARTIFACT => Some(Explanation {
            title: "Missing report artifact",
            description: "The gate could not find its report file in the working directory or in \
any monorepo workspace directory.",
            remediation: "Run the command listed in the gate details before evaluating, or point \
`[artifacts.<gate>] path` in trustgate.toml at the report.",
            artifact_format: None,
        }),
        ids::CODE_PARSE_ERROR => Some(Explanation {
            title: "Malformed report artifact",
            description: "The report file exists but is not valid JSON of the expected shape.",
            remediation: "Regenerate the report with the producing tool; do not hand-edit it.",
            artifact_format: None,
        }),
        ids::CODE_UNKNOWN_TIER => Some(Explanation {
            title: "Unknown risk tier",
            description: "The working spec names a `risk_tier` outside 1..=3. The gate fails \
instead of silently falling back to a default tier.",
            remediation: "Set `risk_tier` to 1, 2 or 3 in the working spec.",
            artifact_format: None,
        }),
        ids::CODE_WAIVER_CONFLICT => Some(Explanation {
            title: "Conflicting waivers",
            description: "Several applicable waivers cover the same gate with different \
mitigation plans or overlapping file scopes. The newest, highest-impact, most specific \
waiver wins; the conflict is reported for escalation.",
            remediation: "Revoke the superseded waiver or align the mitigation plans.",
            artifact_format: None,
        }),
        _ => None,
    }
}

/// List all known check IDs.
pub fn all_check_ids() -> &'static [&'static str] {
    &[
        ids::CHECK_GATE_COVERAGE,
        ids::CHECK_GATE_MUTATION,
        ids::CHECK_GATE_CONTRACTS,
    ]
}

/// List all known codes.
pub fn all_codes() -> &'static [&'static str] {
    &[
        ids::CODE_BELOW_THRESHOLD,
        ids::CODE_CONTRACTS_FAILING,
        ids::CODE_MISSING_ARTIFACT,
        ids::CODE_PARSE_ERROR,
        ids::CODE_UNKNOWN_TIER,
        ids::CODE_WAIVER_CONFLICT,
    ]
}

fn explain_coverage() -> Explanation {
    Explanation {
        title: "Branch coverage gate",
        description: "Scores the change by branches covered / branches total from the coverage \
report and compares it with the tier's minimum branch coverage \
(tier 1: 0.90, tier 2: 0.80, tier 3: 0.70).",
        remediation: "Cover the missing branches. In experiment mode the threshold is relaxed to \
the experiment's reduced coverage threshold.",
        artifact_format: Some(expected_format(GateKind::Coverage)),
    }
}

fn explain_mutation() -> Explanation {
    Explanation {
        title: "Mutation score gate",
        description: "Scores the change by killed / detected mutants and compares it with the \
tier's minimum mutation score (tier 1: 0.70, tier 2: 0.50, tier 3: 0.30). A report with zero \
detected mutants scores as if one was detected.",
        remediation: "Strengthen assertions so surviving mutants are killed.",
        artifact_format: Some(expected_format(GateKind::Mutation)),
    }
}

fn explain_contracts() -> Explanation {
    Explanation {
        title: "Contract test gate",
        description: "Passes only when every contract test passed and at least one ran. Tiers 1 \
and 2 require contracts; a failed contracts gate there also costs 20% of the trust score.",
        remediation: "Fix or add consumer/provider contract tests.",
        artifact_format: Some(expected_format(GateKind::Contracts)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_gate_name_and_check_id() {
        for gate in GateKind::ALL {
            assert!(lookup_explanation(gate.as_str()).is_some());
            assert!(lookup_explanation(gate.check_id()).is_some());
        }
    }

    #[test]
    fn lookup_unknown_returns_none() {
        assert!(lookup_explanation("gate.a11y").is_none());
        assert!(lookup_explanation("unknown_code").is_none());
    }

    #[test]
    fn all_codes_are_valid() {
        for code in all_codes() {
            assert!(
                lookup_explanation(code).is_some(),
                "code {} should be in registry",
                code
            );
        }
    }
}

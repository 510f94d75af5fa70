//! The `explain` use case: look up gate/code documentation.

use trustgate_domain::PolicyStore;
use trustgate_types::GateKind;
use trustgate_types::explain::{self, Explanation};

/// Output from the explain use case.
#[derive(Clone, Debug)]
pub enum ExplainOutput {
    /// Found an explanation. `gate` is set when the identifier names a gate.
    Found {
        explanation: Explanation,
        gate: Option<GateKind>,
    },
    /// Unknown identifier; includes available check_ids and codes.
    NotFound {
        identifier: String,
        available_check_ids: &'static [&'static str],
        available_codes: &'static [&'static str],
    },
}

/// Look up an explanation for a gate name, check_id, or code.
pub fn run_explain(identifier: &str) -> ExplainOutput {
    match explain::lookup_explanation(identifier) {
        Some(explanation) => ExplainOutput::Found {
            explanation,
            gate: gate_for(identifier),
        },
        None => ExplainOutput::NotFound {
            identifier: identifier.to_string(),
            available_check_ids: explain::all_check_ids(),
            available_codes: explain::all_codes(),
        },
    }
}

fn gate_for(identifier: &str) -> Option<GateKind> {
    GateKind::ALL
        .into_iter()
        .find(|g| g.as_str() == identifier || g.check_id() == identifier)
}

/// Format an explanation for terminal display.
pub fn format_explanation(exp: &Explanation, gate: Option<GateKind>) -> String {
    let mut out = String::new();

    out.push_str(exp.title);
    out.push('\n');
    out.push_str(&"=".repeat(exp.title.len()));
    out.push_str("\n\n");
    out.push_str(exp.description);
    out.push_str("\n\n");
    out.push_str("Remediation\n");
    out.push_str("-----------\n");
    out.push_str(exp.remediation);
    out.push('\n');

    if let Some(gate) = gate {
        out.push_str("\nThresholds\n");
        out.push_str("----------\n");
        let store = PolicyStore::new();
        for tier in 1..=3u8 {
            let Some(policy) = store.get_tier_policy(tier) else {
                continue;
            };
            let line = match gate {
                GateKind::Coverage => {
                    format!("  tier {tier}: branch coverage >= {:.2}\n", policy.min_branch)
                }
                GateKind::Mutation => {
                    format!("  tier {tier}: mutation score >= {:.2}\n", policy.min_mutation)
                }
                GateKind::Contracts if policy.requires_contracts => {
                    format!("  tier {tier}: all contract tests must pass\n")
                }
                GateKind::Contracts => format!("  tier {tier}: not required\n"),
            };
            out.push_str(&line);
        }

        let location = trustgate_settings::default_artifact(gate);
        out.push_str("\nArtifact\n");
        out.push_str("--------\n");
        out.push_str(&format!("  default path: {}\n", location.path));
        if let Some(command) = &location.command {
            out.push_str(&format!("  generate with: {command}\n"));
        }
    }

    if let Some(format) = exp.artifact_format {
        out.push_str("\nExpected format\n");
        out.push_str("---------------\n");
        out.push_str(format);
        out.push('\n');
    }

    out
}

/// Format the "not found" error message for terminal display.
pub fn format_not_found(
    identifier: &str,
    check_ids: &[&'static str],
    codes: &[&'static str],
) -> String {
    let mut out = String::new();

    out.push_str(&format!("Unknown gate, check_id or code: {identifier}\n\n"));
    out.push_str("Available check_ids:\n");
    for id in check_ids {
        out.push_str(&format!("  - {id}\n"));
    }
    out.push_str("\nAvailable codes:\n");
    for code in codes {
        out.push_str(&format!("  - {code}\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unwrap_found(output: ExplainOutput) -> (Explanation, Option<GateKind>) {
        match output {
            ExplainOutput::Found { explanation, gate } => (explanation, gate),
            _ => panic!("expected Found"),
        }
    }

    #[test]
    fn gate_names_and_check_ids_resolve_to_the_gate() {
        let (_, gate) = unwrap_found(run_explain("mutation"));
        assert_eq!(gate, Some(GateKind::Mutation));
        let (_, gate) = unwrap_found(run_explain("gate.contracts"));
        assert_eq!(gate, Some(GateKind::Contracts));
    }

    #[test]
    fn codes_have_no_gate() {
        let (_, gate) = unwrap_found(run_explain("missing_artifact"));
        assert_eq!(gate, None);
    }

    #[test]
    fn unknown_identifier_lists_alternatives() {
        match run_explain("not_a_real_thing") {
            ExplainOutput::NotFound {
                identifier,
                available_check_ids,
                available_codes,
            } => {
                assert_eq!(identifier, "not_a_real_thing");
                assert!(available_check_ids.contains(&"gate.coverage"));
                assert!(available_codes.contains(&"below_threshold"));
            }
            _ => panic!("expected NotFound"),
        }
    }

    #[test]
    fn gate_explanation_includes_tier_table_and_artifact() {
        let (exp, gate) = unwrap_found(run_explain("coverage"));
        let formatted = format_explanation(&exp, gate);
        assert!(formatted.contains("Remediation"));
        assert!(formatted.contains("tier 1: branch coverage >= 0.90"));
        assert!(formatted.contains("tier 3: branch coverage >= 0.70"));
        assert!(formatted.contains("default path: coverage/coverage-final.json"));
        assert!(formatted.contains("Expected format"));
    }

    #[test]
    fn contracts_table_marks_tier_three_optional() {
        let (exp, gate) = unwrap_found(run_explain("contracts"));
        let formatted = format_explanation(&exp, gate);
        assert!(formatted.contains("tier 2: all contract tests must pass"));
        assert!(formatted.contains("tier 3: not required"));
    }

    #[test]
    fn format_not_found_output() {
        let formatted = format_not_found("missing", &["check.one", "check.two"], &["code.one"]);
        assert!(formatted.contains("Unknown gate, check_id or code: missing"));
        assert!(formatted.contains("  - check.two"));
        assert!(formatted.contains("  - code.one"));
    }
}

use crate::ids;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The closed set of quality gates.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum GateKind {
    Coverage,
    Mutation,
    Contracts,
}

impl GateKind {
    pub const ALL: [GateKind; 3] = [GateKind::Coverage, GateKind::Mutation, GateKind::Contracts];

    pub fn as_str(self) -> &'static str {
        match self {
            GateKind::Coverage => "coverage",
            GateKind::Mutation => "mutation",
            GateKind::Contracts => "contracts",
        }
    }

    pub fn check_id(self) -> &'static str {
        match self {
            GateKind::Coverage => ids::CHECK_GATE_COVERAGE,
            GateKind::Mutation => ids::CHECK_GATE_MUTATION,
            GateKind::Contracts => ids::CHECK_GATE_CONTRACTS,
        }
    }

    /// Requirement names a human override may list to waive this gate.
    pub fn requirement_names(self) -> &'static [&'static str] {
        match self {
            GateKind::Coverage => &["coverage", "coverage_threshold", "branch_coverage"],
            GateKind::Mutation => &["mutation", "mutation_testing", "mutation_threshold"],
            GateKind::Contracts => &["contracts", "contract_tests"],
        }
    }

    pub fn is_waived_by(self, requirement: &str) -> bool {
        let requirement = requirement.trim();
        self.requirement_names()
            .iter()
            .any(|name| name.eq_ignore_ascii_case(requirement))
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseGateKindError(pub String);

impl fmt::Display for ParseGateKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown gate: {} (expected coverage|mutation|contracts)",
            self.0
        )
    }
}

impl std::error::Error for ParseGateKindError {}

impl FromStr for GateKind {
    type Err = ParseGateKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coverage" | "branch_coverage" => Ok(GateKind::Coverage),
            "mutation" | "mutation_testing" => Ok(GateKind::Mutation),
            "contracts" | "contract" | "contract_tests" => Ok(GateKind::Contracts),
            _ => Err(ParseGateKindError(s.to_string())),
        }
    }
}

/// Verdict for a single gate.
///
/// `score` is always clamped into `[0, 1]`. `details` is an open-ended map kept in key order so
/// serialized reports are byte-stable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GateResult {
    pub gate: GateKind,
    pub passed: bool,
    pub score: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, JsonValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl GateResult {
    pub fn pass(gate: GateKind, score: f64) -> Self {
        Self::new(gate, true, score)
    }

    pub fn fail(gate: GateKind, score: f64) -> Self {
        Self::new(gate, false, score)
    }

    fn new(gate: GateKind, passed: bool, score: f64) -> Self {
        let score = if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            gate,
            passed,
            score,
            details: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.errors.push(message.into());
        self
    }

    pub fn detail_flag(&self, key: &str) -> bool {
        self.details
            .get(key)
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }
}

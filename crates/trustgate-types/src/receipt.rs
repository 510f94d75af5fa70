use crate::{GateKind, GateResult, TrustScore};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Stable schema identifier for trustgate reports.
pub const SCHEMA_REPORT_V1: &str = "trustgate.report.v1";

/// Overall verdict. Maps one-to-one onto the CLI exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn from_passed(passed: bool) -> Self {
        if passed { Verdict::Pass } else { Verdict::Fail }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RejectedWaiver {
    pub id: String,
    pub reason: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WaiverConflictKind {
    MitigationPlan,
    FileScope,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WaiverConflict {
    pub kind: WaiverConflictKind,
    pub first: String,
    pub second: String,
    pub detail: String,
}

/// Audit trail of waiver resolution for one gate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WaiverAudit {
    pub gate: GateKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    #[serde(default)]
    pub applicable: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedWaiver>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<WaiverConflict>,
}

/// The report envelope written for CI consumption.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportEnvelope {
    /// Versioned schema identifier for the envelope shape.
    pub schema: String,
    pub tool: ToolMeta,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
    /// Instant the policy was evaluated against (waiver expiry, override expiry).
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub evaluated_at: OffsetDateTime,
    pub verdict: Verdict,
    pub experiment_mode: bool,
    pub trust: TrustScore,
    pub gates: Vec<GateResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub waivers: Vec<WaiverAudit>,
    /// Errors that did not belong to a single gate (unreadable waiver file, bad provenance).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

pub type TrustgateReport = ReportEnvelope;

impl ReportEnvelope {
    pub fn gate(&self, kind: GateKind) -> Option<&GateResult> {
        self.gates.iter().find(|g| g.gate == kind)
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use time::OffsetDateTime;
use trustgate_types::GateKind;

/// A normalized measurement artifact.
#[derive(Clone, Debug, PartialEq)]
pub enum MeasurementReport {
    Coverage(CoverageMetrics),
    Mutation(MutationMetrics),
    Contracts(ContractMetrics),
}

impl MeasurementReport {
    pub fn kind(&self) -> GateKind {
        match self {
            MeasurementReport::Coverage(_) => GateKind::Coverage,
            MeasurementReport::Mutation(_) => GateKind::Mutation,
            MeasurementReport::Contracts(_) => GateKind::Contracts,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoverageMetrics {
    pub statements_total: u64,
    pub statements_covered: u64,
    pub branches_total: u64,
    pub branches_covered: u64,
    pub functions_total: u64,
    pub functions_covered: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MutationMetrics {
    pub killed: u64,
    pub survived: u64,
    pub total_detected: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContractMetrics {
    pub num_passed: u64,
    pub num_total: u64,
    pub consumer: bool,
    pub provider: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateSelector {
    All,
    Only(BTreeSet<GateKind>),
}

impl GateSelector {
    pub fn covers(&self, gate: GateKind) -> bool {
        match self {
            GateSelector::All => true,
            GateSelector::Only(gates) => gates.contains(&gate),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaiverStatus {
    Active,
    Revoked,
    Expired,
}

/// Ordered from least to most severe, so `Ord` ranks precedence directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ImpactLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ImpactLevel::Low => "low",
            ImpactLevel::Medium => "medium",
            ImpactLevel::High => "high",
            ImpactLevel::Critical => "critical",
        }
    }
}

/// Scope restriction. `None` dimensions do not constrain the waiver.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WaiverScope {
    pub files: Option<Vec<String>>,
    pub branches: Option<Vec<String>>,
    pub environments: Option<Vec<String>>,
}

impl WaiverScope {
    pub fn dimensions(&self) -> [(&'static str, Option<&[String]>); 3] {
        [
            ("files", self.files.as_deref()),
            ("branches", self.branches.as_deref()),
            ("environments", self.environments.as_deref()),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Waiver {
    pub id: String,
    pub gates: GateSelector,
    pub scope: Option<WaiverScope>,
    pub status: WaiverStatus,
    pub approved_by: String,
    pub approved_at: Option<OffsetDateTime>,
    pub impact_level: ImpactLevel,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    pub mitigation_plan: Option<String>,
    pub reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HumanOverride {
    pub approved_by: String,
    pub reason: String,
    pub waived_requirements: BTreeSet<String>,
    pub expires_at: Option<OffsetDateTime>,
}

impl HumanOverride {
    pub fn waives(&self, gate: GateKind) -> bool {
        self.waived_requirements
            .iter()
            .any(|requirement| gate.is_waived_by(requirement))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExperimentMode {
    pub enabled: bool,
    pub expires_at: Option<OffsetDateTime>,
    pub reduced_coverage_threshold: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PerfBudgets {
    pub api_p95_ms: Option<f64>,
    pub lcp_ms: Option<f64>,
}

impl PerfBudgets {
    pub fn is_empty(&self) -> bool {
        self.api_p95_ms.is_none() && self.lcp_ms.is_none()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NonFunctional {
    pub perf: Option<PerfBudgets>,
    pub a11y: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WorkingSpec {
    pub id: Option<String>,
    pub risk_tier: u8,
    pub experiment_mode: Option<ExperimentMode>,
    pub human_override: Option<HumanOverride>,
    pub non_functional: NonFunctional,
}

impl Default for WorkingSpec {
    fn default() -> Self {
        Self {
            id: None,
            risk_tier: 2,
            experiment_mode: None,
            human_override: None,
            non_functional: NonFunctional::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct A11yViolation {
    pub id: String,
    pub impact: Option<String>,
    pub nodes: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct A11yReport {
    pub violations: Vec<A11yViolation>,
    pub incomplete: Vec<String>,
    pub passes: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum A11yResults {
    Pass,
    Report(A11yReport),
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PerfBaseline {
    pub api_p95_ms: Option<f64>,
    pub lcp_ms: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PerfResults {
    pub api_p95_ms: Option<f64>,
    pub lcp_ms: Option<f64>,
    pub error_rate: Option<f64>,
    pub baseline: Option<PerfBaseline>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Provenance {
    pub a11y: Option<A11yResults>,
    pub perf: Option<PerfResults>,
}

/// Everything about "where and when" an evaluation runs. Scope matching reads from here.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationContext {
    pub now: OffsetDateTime,
    pub branch: Option<String>,
    pub environment: Option<String>,
    pub changed_files: Vec<String>,
}

impl EvaluationContext {
    pub fn at(now: OffsetDateTime) -> Self {
        Self {
            now,
            branch: None,
            environment: None,
            changed_files: Vec::new(),
        }
    }
}

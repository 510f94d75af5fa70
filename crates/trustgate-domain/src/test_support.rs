use crate::artifact::{ArtifactError, ArtifactSource};
use crate::model::{
    ContractMetrics, CoverageMetrics, EvaluationContext, GateSelector, HumanOverride,
    ImpactLevel, MeasurementReport, MutationMetrics, Waiver, WaiverStatus,
};
use std::collections::{BTreeMap, BTreeSet};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};
use trustgate_types::GateKind;

pub fn day(n: i64) -> OffsetDateTime {
    datetime!(2026-01-01 00:00 UTC) + Duration::days(n)
}

pub fn ctx_at(now: OffsetDateTime) -> EvaluationContext {
    EvaluationContext::at(now)
}

/// Active low-impact coverage waiver approved by a tech lead at creation, valid for 30 days.
pub fn waiver(id: &str, created: OffsetDateTime) -> Waiver {
    Waiver {
        id: id.to_string(),
        gates: GateSelector::Only(BTreeSet::from([GateKind::Coverage])),
        scope: None,
        status: WaiverStatus::Active,
        approved_by: "tech-lead".to_string(),
        approved_at: Some(created),
        impact_level: ImpactLevel::Low,
        created_at: created,
        expires_at: created + Duration::days(30),
        mitigation_plan: None,
        reason: None,
    }
}

pub fn human_override(requirements: &[&str], expires_at: Option<OffsetDateTime>) -> HumanOverride {
    HumanOverride {
        approved_by: "eng-director".to_string(),
        reason: "hotfix for production incident".to_string(),
        waived_requirements: requirements.iter().map(|r| r.to_string()).collect(),
        expires_at,
    }
}

pub fn coverage(covered: u64, total: u64) -> MeasurementReport {
    MeasurementReport::Coverage(CoverageMetrics {
        statements_total: total,
        statements_covered: covered,
        branches_total: total,
        branches_covered: covered,
        functions_total: 0,
        functions_covered: 0,
    })
}

pub fn mutation(killed: u64, survived: u64, total_detected: u64) -> MeasurementReport {
    MeasurementReport::Mutation(MutationMetrics {
        killed,
        survived,
        total_detected,
    })
}

pub fn contracts(passed: u64, total: u64) -> MeasurementReport {
    MeasurementReport::Contracts(ContractMetrics {
        num_passed: passed,
        num_total: total,
        consumer: true,
        provider: true,
    })
}

/// Artifact source backed by a map. Gates with no entry report a missing artifact.
#[derive(Clone, Debug, Default)]
pub struct InMemorySource {
    entries: BTreeMap<GateKind, Result<MeasurementReport, ArtifactError>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, report: MeasurementReport) -> Self {
        self.entries.insert(report.kind(), Ok(report));
        self
    }

    pub fn failing(mut self, gate: GateKind, err: ArtifactError) -> Self {
        self.entries.insert(gate, Err(err));
        self
    }

    pub fn missing(self, gate: GateKind, searched: Vec<String>, command: Option<&str>) -> Self {
        self.failing(
            gate,
            ArtifactError::Missing {
                gate,
                searched,
                command: command.map(str::to_string),
            },
        )
    }
}

impl ArtifactSource for InMemorySource {
    fn load(&self, gate: GateKind) -> Result<MeasurementReport, ArtifactError> {
        self.entries.get(&gate).cloned().unwrap_or_else(|| {
            Err(ArtifactError::Missing {
                gate,
                searched: Vec::new(),
                command: None,
            })
        })
    }
}

//! The seam between the pure engine and whatever reads report files.

use crate::model::MeasurementReport;
use thiserror::Error;
use trustgate_types::GateKind;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ArtifactError {
    #[error("{gate} report not found (searched: {})", .searched.join(", "))]
    Missing {
        gate: GateKind,
        searched: Vec<String>,
        command: Option<String>,
    },
    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },
    #[error("failed to read {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Loads the measurement report backing a gate.
///
/// Implementations must be shareable across threads: the aggregator evaluates gates
/// concurrently against one source.
pub trait ArtifactSource: Send + Sync {
    fn load(&self, gate: GateKind) -> Result<MeasurementReport, ArtifactError>;
}

impl<T: ArtifactSource + ?Sized> ArtifactSource for &T {
    fn load(&self, gate: GateKind) -> Result<MeasurementReport, ArtifactError> {
        (**self).load(gate)
    }
}

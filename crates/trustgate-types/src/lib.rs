//! Stable DTOs and IDs used across the trustgate workspace.
//!
//! This crate is intentionally boring:
//! - gate kinds and per-gate results
//! - the trust score and its breakdown
//! - the emitted report envelope
//! - stable string IDs and codes
//! - explain registry for remediation guidance

#![forbid(unsafe_code)]

pub mod explain;
pub mod gate;
pub mod ids;
pub mod receipt;
pub mod trust;

pub use explain::{Explanation, lookup_explanation};
pub use gate::{GateKind, GateResult, ParseGateKindError};
pub use receipt::{
    RejectedWaiver, ReportEnvelope, SCHEMA_REPORT_V1, ToolMeta, TrustgateReport, Verdict,
    WaiverAudit, WaiverConflict, WaiverConflictKind,
};
pub use trust::{TrustBreakdown, TrustComponent, TrustScore};

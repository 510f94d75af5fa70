//! Pure policy evaluation (no IO).
//!
//! Input: measurement artifacts behind an [`ArtifactSource`], a validated working spec, the
//! waiver snapshot, and the evaluation context.
//! Output: per-gate verdicts, the waiver audit trail, and the weighted trust score.

#![forbid(unsafe_code)]

pub mod artifact;
pub mod gates;
pub mod model;
pub mod overrides;
pub mod policy;
pub mod trust;
pub mod waivers;

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;

pub use artifact::{ArtifactError, ArtifactSource};
pub use gates::{GateInputs, GateOutcome, evaluate_gate};
pub use overrides::{OverrideResolver, PolicyDirectives};
pub use policy::{PolicyStore, TierPolicy, build_effective_policy};
pub use trust::{TrustEvaluation, TrustWeights, evaluate_trust};
pub use waivers::{WaiverRegistry, WaiverRejection, WaiverResolution};

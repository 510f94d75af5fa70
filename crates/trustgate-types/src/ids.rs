//! Stable identifiers for gates, detail keys, and error codes.
//!
//! `check_id` is a dotted namespace. `code` is a short snake_case discriminator.

// Gates
pub const CHECK_GATE_COVERAGE: &str = "gate.coverage";
pub const CHECK_GATE_MUTATION: &str = "gate.mutation";
pub const CHECK_GATE_CONTRACTS: &str = "gate.contracts";

// Codes: measurement
pub const CODE_BELOW_THRESHOLD: &str = "below_threshold";
pub const CODE_CONTRACTS_FAILING: &str = "contracts_failing";
pub const CODE_MISSING_ARTIFACT: &str = "missing_artifact";
pub const CODE_PARSE_ERROR: &str = "parse_error";

// Codes: policy
pub const CODE_UNKNOWN_TIER: &str = "unknown_tier";
pub const CODE_WAIVER_CONFLICT: &str = "waiver_conflict";

// Detail keys written into `GateResult::details`.
pub const DETAIL_WAIVED: &str = "waived";
pub const DETAIL_WAIVER_ID: &str = "waiver_id";
pub const DETAIL_OVERRIDDEN: &str = "overridden";
pub const DETAIL_APPROVED_BY: &str = "approved_by";
pub const DETAIL_REASON: &str = "reason";
pub const DETAIL_EXPERIMENT_MODE: &str = "experiment_mode";
pub const DETAIL_SKIPPED: &str = "skipped";
pub const DETAIL_REQUIRED: &str = "required";
pub const DETAIL_THRESHOLD: &str = "threshold";
pub const DETAIL_TIER: &str = "tier";
pub const DETAIL_SEARCHED: &str = "searched";
pub const DETAIL_EXPECTED_FORMAT: &str = "expected_format";
pub const DETAIL_COMMAND: &str = "command";
pub const DETAIL_SOURCE: &str = "source";

// Tool-level
pub const CHECK_TOOL_RUNTIME: &str = "tool.runtime";
pub const CODE_RUNTIME_ERROR: &str = "runtime_error";

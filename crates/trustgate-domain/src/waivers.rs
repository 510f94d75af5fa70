//! Waiver applicability, approval chains, and conflict resolution.
//!
//! A waiver applies to a gate only when it is active, unexpired, younger than
//! [`MAX_WAIVER_AGE_DAYS`], in scope for the current context, and approved by someone allowed
//! to approve its impact level. Among several applicable waivers exactly one wins; conflicts
//! between them are reported but never block resolution.

use crate::model::{EvaluationContext, ImpactLevel, Waiver, WaiverScope, WaiverStatus};
use globset::Glob;
use std::cmp::Ordering;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use trustgate_types::{GateKind, WaiverAudit, WaiverConflict, WaiverConflictKind};

pub const MAX_WAIVER_AGE_DAYS: i64 = 90;

/// Bonus added to a scope dimension whose entries are all explicit (no `*`).
const EXPLICIT_DIMENSION_BONUS: u32 = 10;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum WaiverRejection {
    #[error("waiver status is {0}")]
    NotActive(&'static str),
    #[error("waiver expired at {0}")]
    Expired(OffsetDateTime),
    #[error("waiver is {age_days} days old (limit {})", MAX_WAIVER_AGE_DAYS)]
    TooOld { age_days: i64 },
    #[error("approver '{approver}' may not approve {impact} impact waivers (requires one of: {required})")]
    UnauthorizedApprover {
        approver: String,
        impact: &'static str,
        required: String,
    },
    #[error("waiver was approved before it was created")]
    ApprovalPredatesCreation,
    #[error("waiver scope does not match {0}")]
    OutOfScope(String),
    #[error("invalid scope pattern '{pattern}': {reason}")]
    InvalidScopePattern { pattern: String, reason: String },
}

/// Outcome of resolving the waivers for one gate.
#[derive(Clone, Debug, PartialEq)]
pub struct WaiverResolution {
    pub gate: GateKind,
    pub winner: Option<Waiver>,
    /// Ids of every applicable waiver, in precedence order.
    pub applicable: Vec<String>,
    pub rejected: Vec<(String, WaiverRejection)>,
    pub conflicts: Vec<WaiverConflict>,
}

impl WaiverResolution {
    pub fn to_audit(&self) -> WaiverAudit {
        WaiverAudit {
            gate: self.gate,
            winner: self.winner.as_ref().map(|w| w.id.clone()),
            applicable: self.applicable.clone(),
            rejected: self
                .rejected
                .iter()
                .map(|(id, reason)| trustgate_types::RejectedWaiver {
                    id: id.clone(),
                    reason: reason.to_string(),
                })
                .collect(),
            conflicts: self.conflicts.clone(),
        }
    }
}

/// Roles allowed to approve a waiver of the given impact.
pub fn required_approvers(impact: ImpactLevel) -> &'static [&'static str] {
    match impact {
        ImpactLevel::Low => &["developer", "tech-lead"],
        ImpactLevel::Medium => &["tech-lead", "engineering-manager"],
        ImpactLevel::High => &["engineering-manager", "vp-engineering"],
        ImpactLevel::Critical => &["vp-engineering", "ciso", "ceo"],
    }
}

/// Stateless: every call works on the snapshot it is handed.
#[derive(Clone, Copy, Debug, Default)]
pub struct WaiverRegistry;

impl WaiverRegistry {
    pub fn new() -> Self {
        WaiverRegistry
    }

    /// Validate one waiver against the context, independent of which gate asked.
    pub fn check_applicability(
        &self,
        waiver: &Waiver,
        ctx: &EvaluationContext,
    ) -> Result<(), WaiverRejection> {
        match waiver.status {
            WaiverStatus::Active => {}
            WaiverStatus::Revoked => return Err(WaiverRejection::NotActive("revoked")),
            WaiverStatus::Expired => return Err(WaiverRejection::NotActive("expired")),
        }

        if ctx.now > waiver.expires_at {
            return Err(WaiverRejection::Expired(waiver.expires_at));
        }

        let age = ctx.now - waiver.created_at;
        if age > Duration::days(MAX_WAIVER_AGE_DAYS) {
            return Err(WaiverRejection::TooOld {
                age_days: age.whole_days(),
            });
        }

        if let Some(scope) = &waiver.scope {
            check_scope(scope, ctx)?;
        }

        check_approval_chain(waiver)
    }

    /// Waivers that target `gate` and pass validation, plus the rejected ones with reasons.
    pub fn find_applicable_waivers(
        &self,
        all: &[Waiver],
        gate: GateKind,
        ctx: &EvaluationContext,
    ) -> (Vec<Waiver>, Vec<(String, WaiverRejection)>) {
        let mut applicable = Vec::new();
        let mut rejected = Vec::new();

        for waiver in all.iter().filter(|w| w.gates.covers(gate)) {
            match self.check_applicability(waiver, ctx) {
                Ok(()) => applicable.push(waiver.clone()),
                Err(reason) => {
                    tracing::debug!(
                        waiver = %waiver.id,
                        gate = %gate,
                        reason = %reason,
                        "waiver not applicable"
                    );
                    rejected.push((waiver.id.clone(), reason));
                }
            }
        }

        (applicable, rejected)
    }

    /// Pick the single winning waiver. See [`precedence`] for the ordering.
    pub fn resolve_conflicts(&self, waivers: &[Waiver]) -> Option<Waiver> {
        match waivers {
            [] => None,
            [only] => Some(only.clone()),
            _ => {
                let mut ordered: Vec<&Waiver> = waivers.iter().collect();
                ordered.sort_by(|a, b| precedence(a, b));
                ordered.first().map(|w| (*w).clone())
            }
        }
    }

    /// Full resolution for one gate: filter, rank, pick the winner, and scan for conflicts.
    pub fn resolve(
        &self,
        all: &[Waiver],
        gate: GateKind,
        ctx: &EvaluationContext,
    ) -> WaiverResolution {
        let (mut applicable, rejected) = self.find_applicable_waivers(all, gate, ctx);
        applicable.sort_by(precedence);

        let conflicts = detect_conflicts(&applicable);
        for conflict in &conflicts {
            tracing::warn!(
                gate = %gate,
                first = %conflict.first,
                second = %conflict.second,
                detail = %conflict.detail,
                "conflicting waivers; escalate for review"
            );
        }

        let winner = self.resolve_conflicts(&applicable);
        WaiverResolution {
            gate,
            winner,
            applicable: applicable.iter().map(|w| w.id.clone()).collect(),
            rejected,
            conflicts,
        }
    }
}

/// Ordering priority:
/// 1) newer `created_at` first
/// 2) higher impact level first
/// 3) higher scope specificity first
/// 4) waiver id, so the winner never depends on input order
pub fn precedence(a: &Waiver, b: &Waiver) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then(b.impact_level.cmp(&a.impact_level))
        .then(specificity(b).cmp(&specificity(a)))
        .then(a.id.cmp(&b.id))
}

/// Per-dimension entry count, plus a bonus for each dimension with no wildcard entry.
pub fn specificity(waiver: &Waiver) -> u32 {
    let Some(scope) = &waiver.scope else {
        return 0;
    };

    scope
        .dimensions()
        .into_iter()
        .filter_map(|(_, entries)| entries)
        .filter(|entries| !entries.is_empty())
        .map(|entries| {
            let explicit = entries.len() as u32;
            if entries.iter().any(|e| e.contains('*')) {
                explicit
            } else {
                explicit + EXPLICIT_DIMENSION_BONUS
            }
        })
        .sum()
}

/// Pairwise scan for waivers that disagree. Input order is preserved in the output.
pub fn detect_conflicts(waivers: &[Waiver]) -> Vec<WaiverConflict> {
    let mut out = Vec::new();

    for (i, a) in waivers.iter().enumerate() {
        for b in &waivers[i + 1..] {
            if a.mitigation_plan != b.mitigation_plan {
                out.push(WaiverConflict {
                    kind: WaiverConflictKind::MitigationPlan,
                    first: a.id.clone(),
                    second: b.id.clone(),
                    detail: "waivers declare different mitigation plans".to_string(),
                });
            }

            if let Some(pattern) = overlapping_file_pattern(a, b) {
                out.push(WaiverConflict {
                    kind: WaiverConflictKind::FileScope,
                    first: a.id.clone(),
                    second: b.id.clone(),
                    detail: format!("file scopes overlap on '{pattern}'"),
                });
            }
        }
    }

    out
}

fn overlapping_file_pattern(a: &Waiver, b: &Waiver) -> Option<String> {
    let files_a = a.scope.as_ref()?.files.as_deref()?;
    let files_b = b.scope.as_ref()?.files.as_deref()?;

    for pa in files_a {
        for pb in files_b {
            let overlaps = pa == pb
                || pa == "*"
                || pb == "*"
                || (pa.contains('*') && pb.contains('*'));
            if overlaps {
                return Some(if pa == "*" { pb.clone() } else { pa.clone() });
            }
        }
    }
    None
}

fn check_scope(scope: &WaiverScope, ctx: &EvaluationContext) -> Result<(), WaiverRejection> {
    if let Some(files) = non_empty(scope.files.as_deref())
        && !files.iter().any(|f| f == "*")
    {
        let mut matched = false;
        for file in &ctx.changed_files {
            if matches_any(files, file)? {
                matched = true;
                break;
            }
        }
        if !matched {
            return Err(WaiverRejection::OutOfScope(if ctx.changed_files.is_empty() {
                "files (no changed files in context)".to_string()
            } else {
                "any changed file".to_string()
            }));
        }
    }

    check_single_value(
        "branch",
        non_empty(scope.branches.as_deref()),
        ctx.branch.as_deref(),
    )?;
    check_single_value(
        "environment",
        non_empty(scope.environments.as_deref()),
        ctx.environment.as_deref(),
    )
}

fn check_single_value(
    dimension: &str,
    patterns: Option<&[String]>,
    value: Option<&str>,
) -> Result<(), WaiverRejection> {
    let Some(patterns) = patterns else {
        return Ok(());
    };
    if patterns.iter().any(|p| p == "*") {
        return Ok(());
    }
    match value {
        Some(v) if matches_any(patterns, v)? => Ok(()),
        Some(v) => Err(WaiverRejection::OutOfScope(format!("{dimension} '{v}'"))),
        None => Err(WaiverRejection::OutOfScope(format!(
            "{dimension} (not set in context)"
        ))),
    }
}

fn matches_any(patterns: &[String], value: &str) -> Result<bool, WaiverRejection> {
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| WaiverRejection::InvalidScopePattern {
            pattern: pattern.clone(),
            reason: e.kind().to_string(),
        })?;
        if glob.compile_matcher().is_match(value) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn non_empty(entries: Option<&[String]>) -> Option<&[String]> {
    entries.filter(|e| !e.is_empty())
}

fn check_approval_chain(waiver: &Waiver) -> Result<(), WaiverRejection> {
    let approver = normalize_role(&waiver.approved_by);
    let required = required_approvers(waiver.impact_level);
    if !required.contains(&approver.as_str()) {
        return Err(WaiverRejection::UnauthorizedApprover {
            approver: waiver.approved_by.clone(),
            impact: waiver.impact_level.as_str(),
            required: required.join(", "),
        });
    }

    if let Some(approved_at) = waiver.approved_at
        && approved_at < waiver.created_at
    {
        return Err(WaiverRejection::ApprovalPredatesCreation);
    }

    Ok(())
}

/// `Tech Lead`, `tech_lead` and `tech-lead` name the same role.
fn normalize_role(role: &str) -> String {
    role.trim()
        .to_ascii_lowercase()
        .replace(['_', ' '], "-")
}

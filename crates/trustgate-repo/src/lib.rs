//! Repository adapters: discover monorepo workspaces, locate and normalize gate reports, read
//! input documents.
//!
//! This crate is allowed to do filesystem IO. It should not spawn external processes;
//! regenerating a missing report is left to the user via the hinted command.

#![forbid(unsafe_code)]

mod discover;
mod parse;
mod source;

use anyhow::Context;
use camino::Utf8Path;
use trustgate_settings::ResolvedConfig;

pub use discover::discover_workspaces;
pub use source::FsArtifactSource;

/// Fuzz-friendly API for testing parsing robustness without filesystem access.
/// These functions are designed to never panic on any input.
pub mod fuzz {
    /// Parse arbitrary text as an Istanbul coverage map. **Never panics** on any input.
    pub fn parse_coverage(text: &str) -> anyhow::Result<()> {
        super::parse::parse_istanbul(text).map(|_| ())
    }

    /// Parse arbitrary text as a Stryker mutation report. **Never panics** on any input.
    pub fn parse_mutation(text: &str) -> anyhow::Result<()> {
        super::parse::parse_stryker(text).map(|_| ())
    }

    /// Parse arbitrary text as contract test results. **Never panics** on any input.
    pub fn parse_contracts(text: &str) -> anyhow::Result<()> {
        super::parse::parse_contracts(text).map(|_| ())
    }
}

/// Build the artifact source for a resolved config: the repo root plus every discovered
/// workspace.
pub fn artifact_source(
    repo_root: &Utf8Path,
    cfg: &ResolvedConfig,
) -> anyhow::Result<FsArtifactSource> {
    let workspaces =
        discover::discover_workspaces(repo_root, &cfg.workspaces).context("discover workspaces")?;
    tracing::debug!(count = workspaces.len(), "workspaces discovered");
    Ok(FsArtifactSource::new(
        repo_root,
        workspaces,
        cfg.artifacts.clone(),
    ))
}

/// Read `rel` under `repo_root`; `Ok(None)` when it does not exist.
pub fn read_optional(repo_root: &Utf8Path, rel: &str) -> anyhow::Result<Option<String>> {
    let path = repo_root.join(rel);
    match std::fs::read_to_string(&path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("read {path}")),
    }
}

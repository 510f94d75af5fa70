use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde_json::Value;
use walkdir::{DirEntry, WalkDir};

/// Directories never searched for workspace packages.
const SKIPPED_DIRS: &[&str] = &["node_modules", ".git", "target", "dist"];

/// Discover monorepo workspace directories under `repo_root`, relative to it.
///
/// Behavior:
/// - Patterns are the union of `configured` and the root `package.json` `workspaces` field
///   (either an array or `{ "packages": [...] }`).
/// - Each pattern is matched against directory paths; `!pattern` entries exclude.
/// - No patterns means no workspaces (single-package repository).
pub fn discover_workspaces(
    repo_root: &Utf8Path,
    configured: &[String],
) -> anyhow::Result<Vec<Utf8PathBuf>> {
    let mut patterns: Vec<String> = configured.to_vec();
    patterns.extend(package_json_workspaces(repo_root)?);

    let (includes, excludes): (Vec<String>, Vec<String>) = patterns
        .into_iter()
        .map(|p| p.trim().trim_end_matches('/').to_string())
        .filter(|p| !p.is_empty())
        .partition(|p| !p.starts_with('!'));
    if includes.is_empty() {
        return Ok(Vec::new());
    }
    let excludes: Vec<String> = excludes
        .iter()
        .map(|p| p.trim_start_matches('!').to_string())
        .collect();

    let include_set = build_globset(&includes).context("compile workspace globset")?;
    let exclude_set = build_globset(&excludes).context("compile workspace exclude globset")?;

    let mut out: Vec<Utf8PathBuf> = WalkDir::new(repo_root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !is_skipped(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .filter_map(|e| Utf8PathBuf::from_path_buf(e.into_path()).ok())
        .filter_map(|abs| {
            let rel = abs.strip_prefix(repo_root).ok()?.as_str().replace('\\', "/");
            (include_set.is_match(&rel) && !exclude_set.is_match(&rel))
                .then(|| Utf8PathBuf::from(rel))
        })
        .collect();

    // Stable order.
    out.sort();
    out.dedup();
    Ok(out)
}

fn package_json_workspaces(repo_root: &Utf8Path) -> anyhow::Result<Vec<String>> {
    let path = repo_root.join("package.json");
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("read {path}")),
    };
    let doc: Value = serde_json::from_str(&text).with_context(|| format!("parse {path}"))?;

    let list = match doc.get("workspaces") {
        Some(Value::Array(items)) => items,
        Some(Value::Object(obj)) => match obj.get("packages") {
            Some(Value::Array(items)) => items,
            _ => return Ok(Vec::new()),
        },
        _ => return Ok(Vec::new()),
    };
    Ok(list
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect())
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut b = GlobSetBuilder::new();
    for p in patterns {
        // `*` stops at `/` so `packages/*` does not pick up nested source directories.
        let glob = GlobBuilder::new(p)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid workspace glob: {p}"))?;
        b.add(glob);
    }
    Ok(b.build()?)
}

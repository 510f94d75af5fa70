//! End-to-end CLI integration tests using test fixtures.
//!
//! Each fixture in `tests/fixtures/` is a small repository:
//! - `.trustgate/working-spec.yaml` (or a `trustgate.toml` pointing elsewhere)
//! - gate reports under their default locations or in workspace packages
//! - an `expected.report.json` with `__TIMESTAMP__` / `__VERSION__` placeholders
//!
//! These tests run `trustgate evaluate` against each fixture with a pinned `--now` and verify:
//! 1. Exit code matches expected (0=pass, 1=fail)
//! 2. JSON output matches expected (after normalization)

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;
use trustgate_test_util::normalize_nondeterministic;

const NOW: &str = "2026-03-01T00:00:00Z";

/// Helper to get a Command for the trustgate binary.
#[allow(deprecated)]
fn trustgate_cmd() -> Command {
    Command::cargo_bin("trustgate").expect("trustgate binary not found - run `cargo build` first")
}

/// Get the path to the test fixtures directory
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("trustgate-cli crate should have a parent directory")
        .parent()
        .expect("crates directory should have a parent (repo root)")
        .join("tests")
        .join("fixtures")
}

/// Run `evaluate` against a fixture and return the exit code and JSON report.
fn run_evaluate_on_fixture(fixture_name: &str) -> (i32, Value) {
    let fixture_path = fixtures_dir().join(fixture_name);
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let report_path = temp_dir.path().join("report.json");

    let output = trustgate_cmd()
        .arg("--repo-root")
        .arg(&fixture_path)
        .arg("--now")
        .arg(NOW)
        .arg("evaluate")
        .arg("--report-out")
        .arg(&report_path)
        .output()
        .expect("Failed to run command");

    let exit_code = output.status.code().unwrap_or(-1);

    let report_content = std::fs::read_to_string(&report_path).expect("Failed to read report");
    let report: Value = serde_json::from_str(&report_content).expect("Failed to parse report JSON");

    (exit_code, report)
}

fn load_expected_report(fixture_name: &str) -> Value {
    let expected_path = fixtures_dir()
        .join(fixture_name)
        .join("expected.report.json");
    let content = std::fs::read_to_string(&expected_path).expect("Failed to read expected report");
    serde_json::from_str(&content).expect("Failed to parse expected report")
}

fn assert_reports_match(actual: Value, expected: Value, fixture_name: &str) {
    let actual = normalize_nondeterministic(actual);
    let expected = normalize_nondeterministic(expected);

    assert_eq!(
        actual,
        expected,
        "Report mismatch for fixture '{}'.\n\nActual:\n{}\n\nExpected:\n{}",
        fixture_name,
        serde_json::to_string_pretty(&actual).unwrap(),
        serde_json::to_string_pretty(&expected).unwrap()
    );
}

fn check_fixture(fixture_name: &str, expected_exit: i32) {
    let (exit_code, report) = run_evaluate_on_fixture(fixture_name);
    assert_eq!(exit_code, expected_exit, "fixture '{fixture_name}' exit code");
    assert_reports_match(report, load_expected_report(fixture_name), fixture_name);
}

// ============================================================================
// Fixture tests
// ============================================================================

#[test]
fn fixture_passing_passes() {
    check_fixture("passing", 0);
}

#[test]
fn fixture_failing_fails_with_contracts_penalty() {
    check_fixture("failing", 1);
}

#[test]
fn fixture_waived_applies_newest_active_waiver() {
    check_fixture("waived", 0);
}

#[test]
fn fixture_experiment_relaxes_tier_one() {
    check_fixture("experiment", 0);
}

#[test]
fn fixture_monorepo_finds_workspace_reports() {
    check_fixture("monorepo", 0);
}

#[test]
fn missing_working_spec_writes_runtime_error_report() {
    let (exit_code, report) = run_evaluate_on_fixture("missing_spec");
    assert_eq!(exit_code, 1);
    assert_eq!(report["verdict"], "fail");
    assert_eq!(report["gates"], Value::Array(Vec::new()));

    let error = report["errors"][0].as_str().expect("runtime error message");
    assert!(error.starts_with("[tool.runtime:runtime_error]"), "{error}");
    assert!(error.contains("working spec not found"), "{error}");
}

// ============================================================================
// Overrides
// ============================================================================

#[test]
fn tier_flag_overrides_working_spec() {
    let temp_dir = TempDir::new().expect("temp dir");
    let report_path = temp_dir.path().join("report.json");

    trustgate_cmd()
        .arg("--repo-root")
        .arg(fixtures_dir().join("passing"))
        .args(["--now", NOW, "--tier", "1", "evaluate", "--report-out"])
        .arg(&report_path)
        .assert()
        .success();

    let report: Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).expect("read report"))
            .expect("parse report");
    assert_eq!(report["trust"]["tier"], 1);
    assert_eq!(report["gates"][0]["passed"], false);
    assert_eq!(report["gates"][0]["details"]["code"], "below_threshold");
}

#[test]
fn waiver_outside_its_validity_window_does_not_apply() {
    let temp_dir = TempDir::new().expect("temp dir");
    let report_path = temp_dir.path().join("report.json");

    trustgate_cmd()
        .arg("--repo-root")
        .arg(fixtures_dir().join("waived"))
        .args(["--now", "2026-05-01T00:00:00Z", "evaluate", "--report-out"])
        .arg(&report_path)
        .assert()
        .code(1);

    let report: Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).expect("read report"))
            .expect("parse report");
    assert_eq!(report["gates"][1]["passed"], false);
    assert_eq!(report["waivers"][0]["winner"], Value::Null);
    assert_eq!(report["waivers"][0]["rejected"][0]["id"], "WV-100");
}

#[test]
fn evaluate_writes_markdown_when_requested() {
    let temp_dir = TempDir::new().expect("temp dir");
    let report_path = temp_dir.path().join("report.json");
    let md_path = temp_dir.path().join("comment.md");

    trustgate_cmd()
        .arg("--repo-root")
        .arg(fixtures_dir().join("failing"))
        .args(["--now", NOW, "evaluate", "--write-markdown", "--report-out"])
        .arg(&report_path)
        .arg("--markdown-out")
        .arg(&md_path)
        .assert()
        .code(1);

    let md = std::fs::read_to_string(&md_path).expect("read markdown");
    assert!(md.contains("- Verdict: **FAIL**"), "{md}");
    assert!(md.contains("Contracts penalty applied"), "{md}");
    assert!(md.contains("3 of 5 contract tests passed"), "{md}");
}

// ============================================================================
// Rendering existing reports
// ============================================================================

/// Evaluate a fixture into `dir/report.json` and return that path.
fn evaluate_into(fixture_name: &str, dir: &TempDir) -> PathBuf {
    let report_path = dir.path().join("report.json");
    let _ = trustgate_cmd()
        .arg("--repo-root")
        .arg(fixtures_dir().join(fixture_name))
        .args(["--now", NOW, "evaluate", "--report-out"])
        .arg(&report_path)
        .output()
        .expect("run evaluate");
    report_path
}

#[test]
fn md_renders_existing_report() {
    let temp_dir = TempDir::new().expect("temp dir");
    let report = evaluate_into("waived", &temp_dir);

    trustgate_cmd()
        .arg("md")
        .arg("--report")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("# Trustgate report"))
        .stdout(predicate::str::contains("waived by `WV-100`"))
        .stdout(predicate::str::contains(
            "waiver 'WV-050' not applied to mutation: waiver status is revoked",
        ));
}

#[test]
fn annotations_render_failures_and_respect_max() {
    let temp_dir = TempDir::new().expect("temp dir");
    let report = evaluate_into("failing", &temp_dir);

    trustgate_cmd()
        .arg("annotations")
        .arg("--report")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "::error title=trustgate coverage::[gate.coverage:below_threshold]",
        ))
        .stdout(predicate::str::contains(
            "trust score 0.34 is below the threshold 0.80",
        ));

    let output = trustgate_cmd()
        .arg("annotations")
        .arg("--report")
        .arg(&report)
        .args(["--max", "2"])
        .output()
        .expect("run annotations");
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert_eq!(stdout.lines().count(), 2);
}

#[test]
fn md_rejects_foreign_report() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("other.json");
    std::fs::write(&path, r#"{"schema": "lintgate.report.v2"}"#).expect("write");

    trustgate_cmd()
        .arg("md")
        .arg("--report")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown report schema"));
}

// ============================================================================
// Single gate
// ============================================================================

#[test]
fn gate_prints_result_and_sets_exit_code() {
    let output = trustgate_cmd()
        .arg("--repo-root")
        .arg(fixtures_dir().join("failing"))
        .args(["--now", NOW, "gate", "mutation"])
        .output()
        .expect("run gate");
    assert_eq!(output.status.code(), Some(1));

    let doc: Value = serde_json::from_slice(&output.stdout).expect("gate json");
    assert_eq!(doc["result"]["gate"], "mutation");
    assert_eq!(doc["result"]["passed"], false);
    assert_eq!(doc["waivers"]["gate"], "mutation");

    trustgate_cmd()
        .arg("--repo-root")
        .arg(fixtures_dir().join("waived"))
        .args(["--now", NOW, "gate", "mutation"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"waiver_id\": \"WV-100\""));
}

#[test]
fn gate_rejects_unknown_gate_name() {
    trustgate_cmd()
        .args(["gate", "lint"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown gate: lint"));
}

// ============================================================================
// Explain
// ============================================================================

#[test]
fn explain_gate_shows_thresholds() {
    trustgate_cmd()
        .args(["explain", "mutation"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mutation score gate"))
        .stdout(predicate::str::contains("tier 1: mutation score >= 0.70"))
        .stdout(predicate::str::contains("generate with: npx stryker run"));
}

#[test]
fn explain_unknown_identifier_fails() {
    trustgate_cmd()
        .args(["explain", "deps.no_wildcards"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Available check_ids:"))
        .stderr(predicate::str::contains("gate.contracts"));
}

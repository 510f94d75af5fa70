//! Developer tasks (schema generation, fixture conformance, explain coverage).
//!
//! Keeping this separate avoids bloating the end-user CLI.

use anyhow::{Context, bail};
use schemars::schema_for;
use std::fs;
use std::path::{Path, PathBuf};
use trustgate_test_util::normalize_nondeterministic;

/// `--now` used for every fixture run; expected reports are pinned to it.
const FIXTURE_NOW: &str = "2026-03-01T00:00:00Z";

/// Get the project root (parent of xtask directory).
fn project_root() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    if manifest_dir.ends_with("xtask") {
        manifest_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(manifest_dir)
    } else {
        manifest_dir
    }
}

fn schemas_dir() -> PathBuf {
    project_root().join("schemas")
}

fn fixtures_dir() -> PathBuf {
    project_root().join("tests").join("fixtures")
}

/// Schema definition with its target filename.
struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

fn generate_report_schema() -> schemars::Schema {
    schema_for!(trustgate_types::TrustgateReport)
}

fn generate_config_schema() -> schemars::Schema {
    schema_for!(trustgate_settings::TrustgateConfigV1)
}

fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "trustgate.report.v1.json",
            generate: generate_report_schema,
        },
        SchemaSpec {
            filename: "trustgate.config.v1.json",
            generate: generate_config_schema,
        },
    ]
}

/// Serialize a schema to pretty-printed JSON with trailing newline.
fn serialize_schema(schema: &schemars::Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(schema).context("Failed to serialize schema")?;
    json.push('\n');
    Ok(json)
}

fn emit_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    fs::create_dir_all(&dir).context("Failed to create schemas directory")?;

    for spec in schema_specs() {
        let json = serialize_schema(&(spec.generate)())?;
        let path = dir.join(spec.filename);
        fs::write(&path, &json)
            .with_context(|| format!("Failed to write schema to {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    println!("\nSchemas emitted successfully.");
    Ok(())
}

/// Validate that schemas in the repo match what would be generated.
fn validate_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for spec in schema_specs() {
        let path = dir.join(spec.filename);
        if !path.exists() {
            missing.push(spec.filename);
            continue;
        }

        let expected = serialize_schema(&(spec.generate)())?;
        let actual = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if expected != actual {
            mismatched.push(spec.filename);
        }
    }

    if missing.is_empty() && mismatched.is_empty() {
        println!("All schemas are up to date.");
        return Ok(());
    }
    if !missing.is_empty() {
        eprintln!("Missing schemas:");
        for name in &missing {
            eprintln!("  - {name}");
        }
    }
    if !mismatched.is_empty() {
        eprintln!("Schemas out of date:");
        for name in &mismatched {
            eprintln!("  - {name}");
        }
    }
    eprintln!("\nRun `cargo xtask emit-schemas` to regenerate.");
    bail!("Schema validation failed")
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help              Show this message");
    eprintln!("  emit-schemas      Generate JSON schemas from Rust types to schemas/");
    eprintln!("  validate-schemas  Check if schemas/ matches generated output (for CI)");
    eprintln!("  print-schema-ids  Print known schema IDs");
    eprintln!("  conform           Validate fixture expected reports against the report schema");
    eprintln!("  conform-full      Run the trustgate binary on every fixture and compare output");
    eprintln!("  explain-coverage  Validate all check IDs and codes have explanations");
}

/// Token pattern for codes.
fn is_valid_token(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn compile_report_schema() -> anyhow::Result<jsonschema::Validator> {
    let schema_value =
        serde_json::to_value(generate_report_schema()).context("Failed to encode report schema")?;
    jsonschema::validator_for(&schema_value)
        .map_err(|e| anyhow::anyhow!("Failed to compile report schema: {e}"))
}

/// Fixture directories that carry a golden `expected.report.json`, sorted by name.
fn golden_fixtures() -> anyhow::Result<Vec<(String, PathBuf)>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(fixtures_dir()).context("Failed to read tests/fixtures/")? {
        let dir = entry?.path();
        if !dir.join("expected.report.json").is_file() {
            continue;
        }
        let name = dir
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        out.push((name, dir));
    }
    out.sort();
    Ok(out)
}

/// Schema and code hygiene checks for one report value.
fn check_report(
    label: &str,
    value: &serde_json::Value,
    compiled: &jsonschema::Validator,
    errors: &mut Vec<String>,
) {
    for err in compiled.iter_errors(value) {
        errors.push(format!("{label}: schema validation: {err}"));
    }

    if let Some(gates) = value.get("gates").and_then(|v| v.as_array()) {
        for (i, gate) in gates.iter().enumerate() {
            if let Some(code) = gate
                .get("details")
                .and_then(|d| d.get("code"))
                .and_then(|c| c.as_str())
                && !is_valid_token(code)
            {
                errors.push(format!("{label}: gates[{i}].details.code '{code}' is not a valid token"));
            }
            let passed = gate.get("passed").and_then(|p| p.as_bool()).unwrap_or(false);
            let has_errors = gate
                .get("errors")
                .and_then(|e| e.as_array())
                .is_some_and(|e| !e.is_empty());
            if !passed && !has_errors {
                errors.push(format!("{label}: gates[{i}] fails without an error message"));
            }
        }
    }
}

/// Validate every fixture's golden report against the generated report schema.
fn conform() -> anyhow::Result<()> {
    let compiled = compile_report_schema()?;
    println!("✓ trustgate.report.v1 schema compiles");

    let fixtures = golden_fixtures()?;
    if fixtures.is_empty() {
        bail!("No expected.report.json files found in {}", fixtures_dir().display());
    }

    let mut errors = Vec::new();
    for (name, dir) in &fixtures {
        let path = dir.join("expected.report.json");
        let content =
            fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {} as JSON", path.display()))?;
        check_report(name, &value, &compiled, &mut errors);
        println!("  ✓ {name} validates");
    }

    if !errors.is_empty() {
        eprintln!("\nConformance errors:");
        for err in &errors {
            eprintln!("  - {err}");
        }
        bail!("Conformance validation failed with {} errors", errors.len());
    }

    println!("\n✓ All {} fixture reports pass conformance checks!", fixtures.len());
    Ok(())
}

/// Full conformance: run the built binary on every golden fixture and compare its output.
fn conform_full() -> anyhow::Result<()> {
    conform()?;

    println!("\n--- Full conformance: trustgate binary output ---\n");

    let compiled = compile_report_schema()?;
    let trustgate_bin = project_root().join("target").join("debug").join("trustgate");
    #[cfg(target_os = "windows")]
    let trustgate_bin = trustgate_bin.with_extension("exe");

    if !trustgate_bin.exists() {
        bail!(
            "trustgate binary not found at {}.\n\
            Run `cargo build -p trustgate-cli` first.",
            trustgate_bin.display()
        );
    }

    let mut errors = Vec::new();
    for (name, dir) in golden_fixtures()? {
        let temp_dir = tempfile::tempdir().context("Failed to create temp dir")?;
        let report_out = temp_dir.path().join("report.json");

        let output = std::process::Command::new(&trustgate_bin)
            .arg("--repo-root")
            .arg(&dir)
            .args(["--now", FIXTURE_NOW, "evaluate", "--report-out"])
            .arg(&report_out)
            .output()
            .with_context(|| format!("Failed to run trustgate on fixture '{name}'"))?;

        if !report_out.exists() {
            errors.push(format!(
                "fixture '{name}': no report written (exit {:?}): {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            ));
            continue;
        }

        let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_out)?)
            .with_context(|| format!("Failed to parse report for fixture '{name}'"))?;
        check_report(&name, &report, &compiled, &mut errors);

        let golden: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join("expected.report.json"))?)?;
        if normalize_nondeterministic(report) != normalize_nondeterministic(golden) {
            errors.push(format!(
                "fixture '{name}': output differs from expected.report.json"
            ));
        } else {
            println!("  ✓ fixture '{name}' matches its golden report");
        }
    }

    if !errors.is_empty() {
        eprintln!("\nFull conformance errors:");
        for err in &errors {
            eprintln!("  - {err}");
        }
        bail!("Full conformance validation failed with {} errors", errors.len());
    }

    println!("\n✓ Full conformance checks passed!");
    Ok(())
}

/// Validate that all check IDs and codes have explanations.
fn explain_coverage() -> anyhow::Result<()> {
    let check_ids = trustgate_types::explain::all_check_ids();
    let codes = trustgate_types::explain::all_codes();

    let mut errors = Vec::new();
    for (kind, ids) in [("Check ID", check_ids), ("Code", codes)] {
        for id in ids {
            match trustgate_types::explain::lookup_explanation(id) {
                Some(exp) => {
                    for (field, text) in [
                        ("title", exp.title),
                        ("description", exp.description),
                        ("remediation", exp.remediation),
                    ] {
                        if text.is_empty() {
                            errors.push(format!("{kind} '{id}' has empty {field}"));
                        }
                    }
                }
                None => errors.push(format!("{kind} '{id}' has no explanation")),
            }
        }
    }

    if errors.is_empty() {
        println!("✓ {} check IDs have explanations", check_ids.len());
        println!("✓ {} codes have explanations", codes.len());
        println!("\n✓ All explain coverage checks passed!");
        Ok(())
    } else {
        for error in &errors {
            eprintln!("  - {error}");
        }
        bail!(
            "Explain coverage validation failed with {} errors",
            errors.len()
        )
    }
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "validate-schemas" => validate_schemas(),
        "conform" => conform(),
        "conform-full" => conform_full(),
        "explain-coverage" => explain_coverage(),
        "print-schema-ids" => {
            for spec in schema_specs() {
                println!("{}", spec.filename.trim_end_matches(".json"));
            }
            Ok(())
        }
        other => bail!("unknown xtask command: {other}\n\nRun `cargo xtask help` for usage."),
    }
    .context("xtask failed")
}

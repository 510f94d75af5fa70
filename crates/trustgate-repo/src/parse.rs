//! Normalizers for the report formats the gates consume.

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use trustgate_domain::model::{ContractMetrics, CoverageMetrics, MutationMetrics};

/// Istanbul `coverage-final.json`: file path -> per-file counters. Extra keys are ignored.
#[derive(Debug, Deserialize)]
struct IstanbulFile {
    #[serde(default)]
    s: BTreeMap<String, u64>,
    #[serde(default)]
    b: BTreeMap<String, Vec<u64>>,
    #[serde(default)]
    f: BTreeMap<String, u64>,
}

pub fn parse_istanbul(text: &str) -> anyhow::Result<CoverageMetrics> {
    let files: BTreeMap<String, IstanbulFile> =
        serde_json::from_str(text).context("expected an Istanbul coverage map")?;

    let mut m = CoverageMetrics::default();
    for file in files.values() {
        m.statements_total += file.s.len() as u64;
        m.statements_covered += file.s.values().filter(|&&hits| hits > 0).count() as u64;

        for arms in file.b.values() {
            m.branches_total += arms.len() as u64;
            m.branches_covered += arms.iter().filter(|&&hits| hits > 0).count() as u64;
        }

        m.functions_total += file.f.len() as u64;
        m.functions_covered += file.f.values().filter(|&&hits| hits > 0).count() as u64;
    }
    Ok(m)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StrykerMetrics {
    killed: u64,
    survived: u64,
    total_detected: u64,
}

/// Stryker JSON. Prefers the `metrics` summary; falls back to counting mutant statuses in a
/// full mutation-testing report (`files.<path>.mutants[].status`).
pub fn parse_stryker(text: &str) -> anyhow::Result<MutationMetrics> {
    let doc: Value = serde_json::from_str(text).context("mutation report is not valid JSON")?;

    if let Some(metrics) = doc.get("metrics") {
        let m: StrykerMetrics = serde_json::from_value(metrics.clone())
            .context("`metrics` must carry killed, survived and totalDetected")?;
        return Ok(MutationMetrics {
            killed: m.killed,
            survived: m.survived,
            total_detected: m.total_detected,
        });
    }

    let files = doc
        .get("files")
        .and_then(Value::as_object)
        .context("mutation report has neither `metrics` nor `files`")?;

    let mut m = MutationMetrics::default();
    let mut timed_out = 0;
    for mutant in files
        .values()
        .filter_map(|f| f.get("mutants").and_then(Value::as_array))
        .flatten()
    {
        match mutant.get("status").and_then(Value::as_str) {
            Some("Killed") => m.killed += 1,
            Some("Timeout") => timed_out += 1,
            Some("Survived") => m.survived += 1,
            _ => {}
        }
    }
    m.total_detected = m.killed + timed_out;
    Ok(m)
}

#[derive(Debug, Deserialize)]
struct RawContracts {
    #[serde(alias = "num_passed")]
    #[serde(rename = "numPassed")]
    num_passed: u64,
    #[serde(alias = "num_total")]
    #[serde(rename = "numTotal")]
    num_total: u64,
    #[serde(default)]
    consumer: bool,
    #[serde(default)]
    provider: bool,
}

pub fn parse_contracts(text: &str) -> anyhow::Result<ContractMetrics> {
    let raw: RawContracts = serde_json::from_str(text)
        .context("expected {numPassed, numTotal, consumer, provider}")?;
    if raw.num_passed > raw.num_total {
        anyhow::bail!(
            "numPassed ({}) exceeds numTotal ({})",
            raw.num_passed,
            raw.num_total
        );
    }
    Ok(ContractMetrics {
        num_passed: raw.num_passed,
        num_total: raw.num_total,
        consumer: raw.consumer,
        provider: raw.provider,
    })
}

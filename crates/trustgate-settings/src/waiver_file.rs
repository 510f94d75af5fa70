use crate::dates::parse_timestamp;
use anyhow::Context;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeSet;
use trustgate_domain::model::{GateSelector, ImpactLevel, Waiver, WaiverScope, WaiverStatus};
use trustgate_types::GateKind;

/// A record that could not be turned into a [`Waiver`]. It never applies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidWaiver {
    /// Record id when one could be read, otherwise its position in the file.
    pub id: String,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedWaivers {
    pub waivers: Vec<Waiver>,
    pub invalid: Vec<InvalidWaiver>,
}

#[derive(Debug, Deserialize)]
struct RawWaiver {
    id: String,
    gates: RawGates,
    #[serde(default)]
    scope: Option<RawScope>,
    #[serde(default)]
    status: Option<WaiverStatus>,
    #[serde(alias = "approvedBy")]
    approved_by: String,
    #[serde(default, alias = "approvedAt")]
    approved_at: Option<String>,
    #[serde(alias = "impactLevel")]
    impact_level: ImpactLevel,
    #[serde(alias = "createdAt")]
    created_at: String,
    #[serde(alias = "expiresAt")]
    expires_at: String,
    #[serde(default, alias = "mitigationPlan")]
    mitigation_plan: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawGates {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct RawScope {
    #[serde(default)]
    files: Option<Vec<String>>,
    #[serde(default)]
    branches: Option<Vec<String>>,
    #[serde(default)]
    environments: Option<Vec<String>>,
}

/// The whole file must be YAML (JSON is accepted as a subset) holding either a list of records
/// or a `waivers:` list. Individual records are validated separately.
pub fn parse(input: &str) -> anyhow::Result<ParsedWaivers> {
    if input.trim().is_empty() {
        return Ok(ParsedWaivers::default());
    }

    let doc: Value = serde_yaml::from_str(input).context("waivers file is not valid YAML/JSON")?;
    let records = match doc {
        Value::Null => Vec::new(),
        Value::Sequence(items) => items,
        Value::Mapping(mut map) => match map.remove("waivers") {
            Some(Value::Sequence(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => anyhow::bail!("`waivers` must be a list"),
        },
        _ => anyhow::bail!("waivers file must be a list or a mapping with a `waivers` list"),
    };

    let mut out = ParsedWaivers::default();
    let mut seen = BTreeSet::new();
    for (index, record) in records.into_iter().enumerate() {
        let label = record
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{index}"));

        match validate(record) {
            Ok(waiver) if !seen.insert(waiver.id.clone()) => out.invalid.push(InvalidWaiver {
                id: label,
                reason: "duplicate waiver id".to_string(),
            }),
            Ok(waiver) => out.waivers.push(waiver),
            Err(err) => out.invalid.push(InvalidWaiver {
                id: label,
                reason: format!("{err:#}"),
            }),
        }
    }
    Ok(out)
}

fn validate(record: Value) -> anyhow::Result<Waiver> {
    let raw: RawWaiver = serde_yaml::from_value(record)?;

    let id = raw.id.trim().to_string();
    if id.is_empty() {
        anyhow::bail!("waiver id must not be empty");
    }

    let created_at = parse_timestamp(&raw.created_at).context("created_at")?;
    let expires_at = parse_timestamp(&raw.expires_at).context("expires_at")?;
    if expires_at < created_at {
        anyhow::bail!("expires_at is before created_at");
    }

    Ok(Waiver {
        id,
        gates: gate_selector(raw.gates)?,
        scope: raw.scope.map(|s| WaiverScope {
            files: s.files,
            branches: s.branches,
            environments: s.environments,
        }),
        status: raw.status.unwrap_or(WaiverStatus::Active),
        approved_by: raw.approved_by,
        approved_at: raw
            .approved_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .context("approved_at")?,
        impact_level: raw.impact_level,
        created_at,
        expires_at,
        mitigation_plan: raw.mitigation_plan,
        reason: raw.reason,
    })
}

fn gate_selector(raw: RawGates) -> anyhow::Result<GateSelector> {
    let names = match raw {
        RawGates::One(name) => vec![name],
        RawGates::Many(names) => names,
    };
    if names.iter().any(|n| n.trim() == "*") {
        return Ok(GateSelector::All);
    }
    if names.is_empty() {
        anyhow::bail!("waiver lists no gates");
    }
    let gates = names
        .iter()
        .map(|n| n.trim().parse::<GateKind>())
        .collect::<Result<BTreeSet<_>, _>>()?;
    Ok(GateSelector::Only(gates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const YAML: &str = r#"
waivers:
  - id: WV-001
    gates: [coverage, mutation]
    status: active
    approved_by: tech-lead
    approved_at: 2026-01-02
    impact_level: low
    created_at: 2026-01-02
    expires_at: 2026-02-01
    mitigation_plan: add tests for legacy parser
    scope:
      files: ["src/legacy/**"]
  - id: WV-002
    gates: "*"
    approved_by: ciso
    approved_at: "2026-01-05T10:00:00Z"
    impact_level: critical
    created_at: "2026-01-05T09:00:00Z"
    expires_at: "2026-01-20T00:00:00Z"
"#;

    #[test]
    fn parses_wrapped_yaml_list() {
        let parsed = parse(YAML).unwrap();
        assert!(parsed.invalid.is_empty(), "{:?}", parsed.invalid);
        assert_eq!(parsed.waivers.len(), 2);

        let first = &parsed.waivers[0];
        assert_eq!(
            first.gates,
            GateSelector::Only(BTreeSet::from([GateKind::Coverage, GateKind::Mutation]))
        );
        assert_eq!(first.created_at, datetime!(2026-01-02 00:00 UTC));
        assert_eq!(
            first.scope.as_ref().and_then(|s| s.files.clone()),
            Some(vec!["src/legacy/**".to_string()])
        );

        let second = &parsed.waivers[1];
        assert_eq!(second.gates, GateSelector::All);
        assert_eq!(second.status, WaiverStatus::Active);
        assert_eq!(second.impact_level, ImpactLevel::Critical);
    }

    #[test]
    fn parses_bare_json_list_with_camel_case() {
        let parsed = parse(
            r#"[{"id":"J-1","gates":["contracts"],"status":"revoked","approvedBy":"developer",
                "approvedAt":"2026-01-01","impactLevel":"low","createdAt":"2026-01-01",
                "expiresAt":"2026-01-31"}]"#,
        )
        .unwrap();
        assert_eq!(parsed.waivers.len(), 1);
        assert_eq!(parsed.waivers[0].status, WaiverStatus::Revoked);
    }

    #[test]
    fn malformed_records_are_set_aside_individually() {
        let parsed = parse(
            r#"
- id: ok
  gates: [coverage]
  approved_by: developer
  approved_at: 2026-01-01
  impact_level: low
  created_at: 2026-01-01
  expires_at: 2026-01-31
- id: bad-gate
  gates: [lint]
  approved_by: developer
  impact_level: low
  created_at: 2026-01-01
  expires_at: 2026-01-31
- id: bad-impact
  gates: [coverage]
  approved_by: developer
  impact_level: catastrophic
  created_at: 2026-01-01
  expires_at: 2026-01-31
- gates: [coverage]
- id: ok
  gates: [coverage]
  approved_by: developer
  impact_level: low
  created_at: 2026-01-01
  expires_at: 2026-01-31
"#,
        )
        .unwrap();

        assert_eq!(parsed.waivers.len(), 1);
        let ids: Vec<&str> = parsed.invalid.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["bad-gate", "bad-impact", "#3", "ok"]);
        assert!(parsed.invalid[0].reason.contains("lint"));
        assert_eq!(parsed.invalid[3].reason, "duplicate waiver id");
    }

    #[test]
    fn inverted_dates_are_invalid() {
        let parsed = parse(
            "- id: x\n  gates: '*'\n  approved_by: developer\n  impact_level: low\n  created_at: 2026-02-01\n  expires_at: 2026-01-01\n",
        )
        .unwrap();
        assert!(parsed.waivers.is_empty());
        assert!(parsed.invalid[0].reason.contains("before created_at"));
    }

    #[test]
    fn empty_inputs_yield_no_waivers() {
        assert_eq!(parse("").unwrap(), ParsedWaivers::default());
        assert_eq!(parse("waivers: []\n").unwrap(), ParsedWaivers::default());
        assert!(parse("42").is_err());
    }
}

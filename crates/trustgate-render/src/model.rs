#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderableVerdictStatus {
    Pass,
    Fail,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderableComponent {
    pub name: String,
    pub score: f64,
    pub weight: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderableTrust {
    pub score: f64,
    pub threshold: f64,
    pub tier: u8,
    pub penalty_applied: bool,
    pub components: Vec<RenderableComponent>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderableGate {
    pub name: String,
    pub check_id: String,
    pub passed: bool,
    pub score: f64,
    pub code: Option<String>,
    /// How a pass was obtained without measurement ("waived by `W-1`", "skipped (experiment)").
    pub disposition: Option<String>,
    pub errors: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderableReport {
    pub verdict: RenderableVerdictStatus,
    pub experiment_mode: bool,
    pub trust: RenderableTrust,
    pub gates: Vec<RenderableGate>,
    /// Run-level messages: ignored declarations, invalid waivers, waiver conflicts.
    pub notes: Vec<String>,
}

#[cfg(test)]
pub(crate) fn sample_report() -> RenderableReport {
    let component = |name: &str, score: f64, weight: f64| RenderableComponent {
        name: name.to_string(),
        score,
        weight,
    };
    RenderableReport {
        verdict: RenderableVerdictStatus::Fail,
        experiment_mode: false,
        trust: RenderableTrust {
            score: 0.456,
            threshold: 0.8,
            tier: 2,
            penalty_applied: true,
            components: vec![
                component("coverage", 1.0, 0.3),
                component("mutation", 0.4, 0.3),
                component("contracts", 0.0, 0.2),
                component("a11y", 1.0, 0.1),
                component("perf", 0.5, 0.1),
            ],
        },
        gates: vec![
            RenderableGate {
                name: "coverage".to_string(),
                check_id: "gate.coverage".to_string(),
                passed: true,
                score: 1.0,
                code: None,
                disposition: Some("waived by `WV-7`".to_string()),
                errors: Vec::new(),
            },
            RenderableGate {
                name: "mutation".to_string(),
                check_id: "gate.mutation".to_string(),
                passed: false,
                score: 0.4,
                code: Some("below_threshold".to_string()),
                disposition: None,
                errors: vec!["mutation score 0.40 is below the tier 2 minimum 0.50".to_string()],
            },
            RenderableGate {
                name: "contracts".to_string(),
                check_id: "gate.contracts".to_string(),
                passed: false,
                score: 0.0,
                code: Some("missing_artifact".to_string()),
                disposition: None,
                errors: vec![
                    "contracts report not found (searched: test-results/contract-results.json)"
                        .to_string(),
                    "run `npm run test:contract` to generate the contracts report".to_string(),
                ],
            },
        ],
        notes: vec!["human override ignored: expired".to_string()],
    }
}

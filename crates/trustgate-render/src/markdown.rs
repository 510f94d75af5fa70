use crate::{RenderableReport, RenderableVerdictStatus};

pub fn render_markdown(report: &RenderableReport) -> String {
    let mut out = String::new();

    out.push_str("# Trustgate report\n\n");
    let verdict = match report.verdict {
        RenderableVerdictStatus::Pass => "PASS",
        RenderableVerdictStatus::Fail => "FAIL",
    };
    let trust = &report.trust;
    out.push_str(&format!(
        "- Verdict: **{}**\n- Trust: {:.2} (threshold {:.2}, tier {})\n",
        verdict, trust.score, trust.threshold, trust.tier
    ));
    if trust.penalty_applied {
        out.push_str("- Contracts penalty applied (x0.8)\n");
    }
    if report.experiment_mode {
        out.push_str("- Experiment mode: active\n");
    }
    out.push('\n');

    out.push_str("## Gates\n\n");
    out.push_str("| Gate | Result | Score | Notes |\n");
    out.push_str("|------|--------|-------|-------|\n");
    for g in &report.gates {
        let notes = match (&g.disposition, &g.code) {
            (Some(d), _) => d.replace('|', "\\|"),
            (None, Some(code)) => format!("`{code}`"),
            (None, None) => String::new(),
        };
        out.push_str(&format!(
            "| `{}` | {} | {:.2} | {} |\n",
            g.name,
            if g.passed { "PASS" } else { "FAIL" },
            g.score,
            notes
        ));
    }
    out.push('\n');

    out.push_str("## Trust breakdown\n\n");
    out.push_str("| Component | Score | Weight |\n");
    out.push_str("|-----------|-------|--------|\n");
    for c in &trust.components {
        out.push_str(&format!("| {} | {:.2} | {:.2} |\n", c.name, c.score, c.weight));
    }

    let problems: Vec<String> = report
        .gates
        .iter()
        .flat_map(|g| g.errors.iter().map(move |e| format!("- `{}`: {}", g.check_id, e)))
        .collect();
    if !problems.is_empty() {
        out.push_str("\n## Problems\n\n");
        for p in problems {
            out.push_str(&p);
            out.push('\n');
        }
    }

    if !report.notes.is_empty() {
        out.push_str("\n## Notes\n\n");
        for n in &report.notes {
            out.push_str(&format!("- {}\n", n));
        }
    }

    out
}

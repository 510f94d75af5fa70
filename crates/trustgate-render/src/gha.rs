use crate::{RenderableReport, RenderableVerdictStatus};

/// Render a report as GitHub Actions workflow command annotations.
///
/// Format:
/// `::{level} title={title}::{message}`
pub fn render_github_annotations(report: &RenderableReport) -> Vec<String> {
    let mut out = Vec::new();

    for g in &report.gates {
        let title = format!("trustgate {}", g.name);
        if !g.passed {
            let code = g.code.as_deref().unwrap_or("failed");
            if g.errors.is_empty() {
                out.push(annotation("error", &title, &format!("[{}:{}] gate failed", g.check_id, code)));
            }
            for e in &g.errors {
                out.push(annotation("error", &title, &format!("[{}:{}] {}", g.check_id, code, e)));
            }
        } else if let Some(d) = &g.disposition {
            out.push(annotation("notice", &title, &format!("[{}] {}", g.check_id, d)));
        }
    }

    for n in &report.notes {
        out.push(annotation("warning", "trustgate", n));
    }

    if report.verdict == RenderableVerdictStatus::Fail {
        out.push(annotation(
            "error",
            "trustgate",
            &format!(
                "trust score {:.2} is below the threshold {:.2} (tier {})",
                report.trust.score, report.trust.threshold, report.trust.tier
            ),
        ));
    }

    out
}

fn annotation(level: &str, title: &str, message: &str) -> String {
    format!("::{} title={}::{}", level, escape_property(title), escape_data(message))
}

fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sample_report;

    #[test]
    fn failing_gates_become_errors_and_waivers_notices() {
        let lines = render_github_annotations(&sample_report());
        assert_eq!(
            lines,
            vec![
                "::notice title=trustgate coverage::[gate.coverage] waived by `WV-7`",
                "::error title=trustgate mutation::[gate.mutation:below_threshold] mutation score 0.40 is below the tier 2 minimum 0.50",
                "::error title=trustgate contracts::[gate.contracts:missing_artifact] contracts report not found (searched: test-results/contract-results.json)",
                "::error title=trustgate contracts::[gate.contracts:missing_artifact] run `npm run test:contract` to generate the contracts report",
                "::warning title=trustgate::human override ignored: expired",
                "::error title=trustgate::trust score 0.46 is below the threshold 0.80 (tier 2)",
            ]
        );
    }

    #[test]
    fn messages_are_escaped() {
        let mut report = sample_report();
        report.gates[1].errors = vec!["100% bad\nreally".to_string()];
        let lines = render_github_annotations(&report);
        assert!(lines.iter().any(|l| l.ends_with("100%25 bad%0Areally")));
    }

    #[test]
    fn clean_pass_emits_nothing() {
        let mut report = sample_report();
        report.verdict = RenderableVerdictStatus::Pass;
        report.notes.clear();
        for g in &mut report.gates {
            g.passed = true;
            g.disposition = None;
        }
        assert!(render_github_annotations(&report).is_empty());
    }
}

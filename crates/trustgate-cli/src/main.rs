//! CLI entry point for trustgate.
//!
//! This module is intentionally thin: it handles argument parsing, I/O, and exit codes.
//! All business logic lives in the `trustgate-app` crate.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use trustgate_app::{
    EvaluateInput, ExplainOutput, gate_exit_code, parse_report_json, render_annotations,
    render_markdown, run_evaluate, run_explain, run_gate, runtime_error_report, serialize_report,
    to_renderable, verdict_exit_code,
};
use trustgate_settings::Overrides;
use trustgate_types::{GateKind, TrustgateReport};

static INIT_TRACING: Once = Once::new();

#[derive(Parser, Debug)]
#[command(
    name = "trustgate",
    version,
    about = "Quality-gate evaluation and trust scoring for CI change control"
)]
struct Cli {
    /// Repository root (directory containing the working spec and reports).
    #[arg(long, default_value = ".")]
    repo_root: Utf8PathBuf,

    /// Path to trustgate config TOML, relative to the repository root.
    #[arg(long, default_value = "trustgate.toml")]
    config: Utf8PathBuf,

    /// Override the working spec's risk tier (1 = strictest).
    #[arg(long)]
    tier: Option<u8>,

    /// Branch the change targets (used for waiver scopes).
    #[arg(long)]
    branch: Option<String>,

    /// Deployment environment (used for waiver scopes).
    #[arg(long)]
    environment: Option<String>,

    /// Changed file path (repeatable; used for waiver file scopes).
    #[arg(long = "changed-file")]
    changed_files: Vec<String>,

    /// Evaluation instant (RFC 3339 or YYYY-MM-DD). Defaults to the wall clock.
    #[arg(long)]
    now: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate every gate, compute the trust score, and write the report.
    Evaluate {
        /// Where to write the JSON report.
        #[arg(long, default_value = "artifacts/trustgate/report.json")]
        report_out: Utf8PathBuf,

        /// Write a Markdown summary alongside the JSON.
        #[arg(long)]
        write_markdown: bool,

        /// Where to write the Markdown summary (if enabled).
        #[arg(long, default_value = "artifacts/trustgate/comment.md")]
        markdown_out: Utf8PathBuf,
    },

    /// Evaluate a single gate and print its result as JSON.
    Gate {
        /// Gate to evaluate (coverage|mutation|contracts).
        gate: GateKind,
    },

    /// Render markdown from an existing JSON report.
    Md {
        /// Path to the JSON report file.
        #[arg(long, default_value = "artifacts/trustgate/report.json")]
        report: Utf8PathBuf,

        /// Where to write the Markdown output (if not specified, prints to stdout).
        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },

    /// Render GitHub Actions annotations from an existing JSON report.
    Annotations {
        /// Path to the JSON report file.
        #[arg(long, default_value = "artifacts/trustgate/report.json")]
        report: Utf8PathBuf,

        /// Maximum number of annotations to emit.
        #[arg(long, default_value = "10")]
        max: usize,
    },

    /// Explain a gate, check_id, or code with remediation guidance.
    Explain {
        /// Gate name (e.g. "coverage"), check_id (e.g. "gate.mutation"), or code
        /// (e.g. "missing_artifact").
        identifier: String,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match &cli.cmd {
        Commands::Evaluate {
            report_out,
            write_markdown,
            markdown_out,
        } => cmd_evaluate(&cli, report_out, *write_markdown, markdown_out),
        Commands::Gate { gate } => cmd_gate(&cli, *gate),
        Commands::Md { report, output } => cmd_md(report, output.as_deref()),
        Commands::Annotations { report, max } => cmd_annotations(report, *max),
        Commands::Explain { identifier } => cmd_explain(identifier),
    }
}

/// Logs go to stderr so stdout stays machine-readable. Filter with `TRUSTGATE_LOG`.
fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_env("TRUSTGATE_LOG")
            .unwrap_or_else(|_| EnvFilter::new("trustgate=warn"));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .init();
    });
}

fn repo_root(cli: &Cli) -> Utf8PathBuf {
    cli.repo_root
        .canonicalize_utf8()
        .unwrap_or_else(|_| cli.repo_root.clone())
}

fn overrides(cli: &Cli) -> Overrides {
    Overrides {
        tier: cli.tier,
        branch: cli.branch.clone(),
        environment: cli.environment.clone(),
        changed_files: cli.changed_files.clone(),
        now: cli.now.clone(),
    }
}

/// Config file text; a missing file means defaults apply.
fn read_config(repo_root: &Utf8Path, config: &Utf8Path) -> anyhow::Result<String> {
    let path = repo_root.join(config);
    match std::fs::read_to_string(&path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e).with_context(|| format!("read config: {path}")),
    }
}

fn cmd_evaluate(
    cli: &Cli,
    report_out: &Utf8Path,
    write_markdown: bool,
    markdown_out: &Utf8Path,
) -> anyhow::Result<()> {
    let repo_root = repo_root(cli);

    let result = (|| -> anyhow::Result<i32> {
        if !repo_root.exists() {
            anyhow::bail!("repo root does not exist: {}", repo_root);
        }
        let cfg_text = read_config(&repo_root, &cli.config)?;

        let input = EvaluateInput {
            repo_root: &repo_root,
            config_text: &cfg_text,
            overrides: overrides(cli),
        };
        let output = run_evaluate(input)?;

        write_report_file(report_out, &output.report).context("write report json")?;
        if write_markdown {
            let md = render_markdown(&to_renderable(&output.report));
            write_text_file(markdown_out, &md).context("write markdown")?;
        }

        tracing::info!(
            verdict = ?output.report.verdict,
            score = output.report.trust.score,
            tier = output.report.trust.tier,
            "evaluation complete"
        );
        Ok(verdict_exit_code(output.report.verdict))
    })();

    match result {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Err(err) => {
            let report = runtime_error_report(&format!("{err:#}"));
            let _ = write_report_file(report_out, &report);
            eprintln!("trustgate error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn cmd_gate(cli: &Cli, gate: GateKind) -> anyhow::Result<()> {
    let repo_root = repo_root(cli);

    let result = (|| -> anyhow::Result<i32> {
        let cfg_text = read_config(&repo_root, &cli.config)?;
        let input = EvaluateInput {
            repo_root: &repo_root,
            config_text: &cfg_text,
            overrides: overrides(cli),
        };
        let output = run_gate(input, gate)?;

        for error in &output.errors {
            eprintln!("trustgate: {error}");
        }
        let doc = serde_json::json!({
            "result": output.result,
            "waivers": output.waivers,
        });
        let text = serde_json::to_string_pretty(&doc).context("serialize gate result")?;
        println!("{text}");
        Ok(gate_exit_code(&output.result))
    })();

    match result {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("trustgate error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn write_report_file(path: &Utf8Path, report: &TrustgateReport) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {parent}"))?;
    }
    let data = serialize_report(report).context("serialize report")?;
    std::fs::write(path, data).with_context(|| format!("write report: {path}"))?;
    Ok(())
}

fn write_text_file(path: &Utf8Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {parent}"))?;
    }
    std::fs::write(path, text).with_context(|| format!("write text: {path}"))?;
    Ok(())
}

fn read_report(path: &Utf8Path) -> anyhow::Result<TrustgateReport> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read report: {path}"))?;
    parse_report_json(&text)
}

fn cmd_md(report_path: &Utf8Path, output: Option<&Utf8Path>) -> anyhow::Result<()> {
    let report = read_report(report_path)?;
    let md = render_markdown(&to_renderable(&report));

    match output {
        Some(out_path) => write_text_file(out_path, &md).context("write markdown output")?,
        None => print!("{md}"),
    }
    Ok(())
}

fn cmd_annotations(report_path: &Utf8Path, max: usize) -> anyhow::Result<()> {
    let report = read_report(report_path)?;
    for annotation in render_annotations(&to_renderable(&report), max) {
        println!("{annotation}");
    }
    Ok(())
}

fn cmd_explain(identifier: &str) -> anyhow::Result<()> {
    match run_explain(identifier) {
        ExplainOutput::Found { explanation, gate } => {
            print!("{}", trustgate_app::format_explanation(&explanation, gate));
            Ok(())
        }
        ExplainOutput::NotFound {
            identifier,
            available_check_ids,
            available_codes,
        } => {
            eprint!(
                "{}",
                trustgate_app::format_not_found(&identifier, available_check_ids, available_codes)
            );
            std::process::exit(1);
        }
    }
}

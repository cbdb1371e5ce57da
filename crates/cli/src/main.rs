use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::{Map, Value};
use specrun_engine::{DocumentOutcome, ExecutionContext, FetchTransport, HttpTransport, NoopTransport, execute_file};
use specrun_types::{ExposedValue, RunReport, WorkflowReport};
use specrun_util::display_string;
use std::path::PathBuf;
use std::process::ExitCode;

/// Execute a spec document: an HTTP fetch, a validation run, or a workflow.
#[derive(Parser, Debug)]
#[command(name = "specrun", version, about)]
struct Cli {
    /// Path to the document (YAML or JSON)
    file: PathBuf,

    /// Override a variable, repeatable (KEY=VALUE)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Override variables as a JSON object
    #[arg(long, value_name = "JSON")]
    vars: Option<String>,

    /// Print exposed values only
    #[arg(long)]
    result_only: bool,

    /// Render the full outcome as JSON
    #[arg(long)]
    json: bool,

    /// Compile requests but echo them instead of sending
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn run() -> Result<bool> {
    let cli = Cli::parse();
    let overrides = collect_overrides(&cli)?;
    tracing::debug!(file = %cli.file.display(), overrides = overrides.len(), dry_run = cli.dry_run, "running document");

    let base_dir = cli.file.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    let outcome = if cli.dry_run {
        let transport = NoopTransport;
        execute(&cli, base_dir, overrides, &transport)?
    } else {
        let transport = HttpTransport::new()?;
        execute(&cli, base_dir, overrides, &transport)?
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else if cli.result_only {
        print_exposed(outcome.exposed());
    } else {
        print_outcome(&outcome);
    }

    Ok(outcome.is_pass())
}

fn execute(cli: &Cli, base_dir: PathBuf, overrides: Map<String, Value>, transport: &dyn FetchTransport) -> Result<DocumentOutcome> {
    let ctx = ExecutionContext::new(base_dir, transport).with_overrides(overrides);
    let outcome = execute_file(&cli.file, &ctx).with_context(|| format!("executing {}", cli.file.display()))?;
    Ok(outcome)
}

/// Merge `--vars` and `--set` into the override layer. `--set` wins when a
/// key appears in both.
fn collect_overrides(cli: &Cli) -> Result<Map<String, Value>> {
    let mut overrides = Map::new();

    if let Some(vars) = &cli.vars {
        let parsed: Value = serde_json::from_str(vars).context("--vars is not valid JSON")?;
        let Value::Object(map) = parsed else {
            bail!("--vars must be a JSON object");
        };
        overrides.extend(map);
    }

    for pair in &cli.set {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("--set expects KEY=VALUE, got '{pair}'");
        };
        overrides.insert(key.to_string(), Value::String(value.to_string()));
    }

    Ok(overrides)
}

fn print_exposed(exposed: &[ExposedValue]) {
    for item in exposed {
        println!("{} = {}", item.label, display_string(&item.value));
    }
}

fn print_outcome(outcome: &DocumentOutcome) {
    match outcome {
        DocumentOutcome::Fetch { exposed, response } => {
            let code = response.get("code").and_then(Value::as_u64).unwrap_or_default();
            let elapsed = response.get("elapsed_ms").and_then(Value::as_u64).unwrap_or_default();
            println!("HTTP {code} ({elapsed} ms)");
            if let Some(data) = response.get("data") {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
            print_exposed(exposed);
        }
        DocumentOutcome::Validate { report, exposed } => {
            print_report(report);
            print_exposed(exposed);
        }
        DocumentOutcome::Workflow { report } => print_workflow(report),
    }
}

fn print_report(report: &RunReport) {
    for result in &report.results {
        let verdict = if result.is_pass { "PASS" } else { "FAIL" };
        println!("{verdict} {}", result.message);
    }
    println!("{} assertions, {} failed", report.total, report.failed);
}

fn print_workflow(report: &WorkflowReport) {
    for outcome in &report.outcomes {
        let verdict = match &outcome.report {
            Some(run) if !run.is_pass() => "failed",
            _ => "ok",
        };
        println!("task {} ({}): {verdict}", outcome.name, outcome.kind);
        if let Some(run) = &outcome.report {
            for result in run.results.iter().filter(|result| !result.is_pass) {
                println!("  FAIL {}", result.message);
            }
        }
        for item in &outcome.exposed {
            println!("  {} = {}", item.label, display_string(&item.value));
        }
    }
    match &report.failure {
        Some(failure) => println!("aborted at task '{}' (#{}): {}", failure.task, failure.index, failure.message),
        None => println!("{} tasks completed", report.outcomes.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("specrun").chain(args.iter().copied()))
    }

    #[test]
    fn set_overrides_win_over_vars() {
        let cli = cli(&["doc.yaml", "--vars", r#"{"host": "a", "page": 2}"#, "--set", "host=b"]);
        let overrides = collect_overrides(&cli).expect("overrides");
        assert_eq!(overrides["host"], Value::String("b".into()));
        assert_eq!(overrides["page"], Value::from(2));
    }

    #[test]
    fn malformed_set_pair_is_rejected() {
        let cli = cli(&["doc.yaml", "--set", "no-equals"]);
        assert!(collect_overrides(&cli).is_err());
    }

    #[test]
    fn vars_must_be_an_object() {
        let cli = cli(&["doc.yaml", "--vars", "[1, 2]"]);
        assert!(collect_overrides(&cli).is_err());
    }
}

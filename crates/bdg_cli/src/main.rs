//! crates/bdg_cli/src/main.rs
//!
//! `budget --input <file> [--out <dir>]` runs the engine once and writes
//! `calculation.json` and `run_record.json` as canonical JSON.

mod args;

mod exitcodes {
    pub const OK: i32 = 0;
    pub const VALIDATION: i32 = 2;
    pub const SELF_VERIFY: i32 = 3;
    pub const IO: i32 = 4;
}

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use args::{parse_and_validate as parse_cli, Args};
use bdg_core::RawNumber;
use bdg_io::canonical_json::write_canonical_file;
use bdg_pipeline::{engine_identifiers, load, run_loaded, PipelineError, PipelineOutputs};

/// Log filter variable, e.g. `BUDGET_LOG=bdg_algo=debug`.
const LOG_ENV: &str = "BUDGET_LOG";

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    /// Malformed input document
    Validation(String),
    /// Artifact id does not match its content
    SelfVerify(String),
    /// Read/write/path/limit failures
    Io(String),
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Validation(m) => write!(f, "validation: {m}"),
            MainError::SelfVerify(m) => write!(f, "self-verify: {m}"),
            MainError::Io(m) => write!(f, "io: {m}"),
        }
    }
}

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("budget: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION as u8);
        }
    };
    init_logging(args.verbose);

    let outcome = if args.validate_only { validate_only(&args) } else { run_once(&args) };
    let rc = match outcome {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            eprintln!("budget: error: {e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc as u8)
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Load and normalize only; no pipeline, no artifacts.
fn validate_only(args: &Args) -> Result<(), MainError> {
    let loaded = load(&args.input).map_err(map_pipeline_err)?;
    if !args.quiet {
        let r = &loaded.report;
        println!(
            "validate-only: rows={} items={} skipped_without_id={}",
            r.rows,
            loaded.document.items.len(),
            r.skipped_without_id
        );
    }
    Ok(())
}

fn run_once(args: &Args) -> Result<(), MainError> {
    let mut loaded = load(&args.input).map_err(map_pipeline_err)?;
    apply_overrides(args, &mut loaded.document.params);

    let outs = run_loaded(loaded, &engine_identifiers()).map_err(map_pipeline_err)?;
    write_artifacts(&args.out, &outs)?;
    info!(out = %args.out.display(), calculation_id = %outs.calculation.id, "artifacts written");

    if !args.quiet {
        let body = &outs.calculation.body;
        println!(
            "grand_total_final={} items={} orphans={}",
            body.grand_total_final,
            body.items.len(),
            body.reconciliation.orphans.len()
        );
    }
    Ok(())
}

fn apply_overrides(args: &Args, params: &mut bdg_core::BudgetParams) {
    if let Some(m) = args.markup {
        debug!(markup = m, "markup override");
        params.markup_percent = RawNumber::Number(m);
    }
    if let Some(a) = args.abc_a {
        params.abc.a_max_pct = a;
    }
    if let Some(b) = args.abc_b {
        params.abc.b_max_pct = b;
    }
}

fn write_artifacts(out_dir: &Path, outs: &PipelineOutputs) -> Result<(), MainError> {
    fs::create_dir_all(out_dir).map_err(|e| MainError::Io(format!("mkdir {}: {e}", out_dir.display())))?;

    write_canonical_file(&out_dir.join("calculation.json"), &outs.calculation)
        .map_err(|e| MainError::Io(format!("write calculation.json: {e}")))?;
    write_canonical_file(&out_dir.join("run_record.json"), &outs.run_record)
        .map_err(|e| MainError::Io(format!("write run_record.json: {e}")))?;
    Ok(())
}

fn map_error(e: &MainError) -> i32 {
    use exitcodes::*;
    match e {
        MainError::Validation(_) => VALIDATION,
        MainError::SelfVerify(_) => SELF_VERIFY,
        MainError::Io(_) => IO,
    }
}

fn map_pipeline_err(e: PipelineError) -> MainError {
    use PipelineError::*;
    match e {
        Validate(m) => MainError::Validation(m),
        Io(m) => MainError::Io(m),
        Build(m) | SelfVerify(m) => MainError::SelfVerify(m),
    }
}

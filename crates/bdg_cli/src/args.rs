//! crates/bdg_cli/src/args.rs
//!
//! Argument surface for the `budget` binary.
//! - One local input file (no `scheme://`, the engine is offline)
//! - Output directory, created on demand
//! - Optional overrides for markup and ABC cut points

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use bdg_core::numeric::try_parse_lenient;
use bdg_io::looks_like_url;
use clap::Parser;

/// Parsed CLI arguments (raw).
#[derive(Debug, Parser, Clone)]
#[command(
    name = "budget",
    disable_help_subcommand = true,
    about = "Offline, deterministic construction budget calculator"
)]
pub struct Args {
    /// Budget document JSON path.
    #[arg(long)]
    pub input: PathBuf,

    /// Output directory (default: current directory).
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// Markup (BDI) percent override, e.g. `25` or `22,5`.
    #[arg(long, value_parser = parse_percent, allow_hyphen_values = true)]
    pub markup: Option<f64>,

    /// Upper cumulative share (percent) of class A.
    #[arg(long = "abc-a", value_parser = parse_share)]
    pub abc_a: Option<f64>,

    /// Upper cumulative share (percent) of class B.
    #[arg(long = "abc-b", value_parser = parse_share)]
    pub abc_b: Option<f64>,

    /// Load and normalize the input only; write nothing.
    #[arg(long)]
    pub validate_only: bool,

    /// Suppress the summary line.
    #[arg(long)]
    pub quiet: bool,

    /// Debug-level logging on stderr (overridden by `BUDGET_LOG`).
    #[arg(long)]
    pub verbose: bool,
}

/// Errors surfaced by argument validation.
#[derive(Debug)]
pub enum CliError {
    NonLocalPath(String),
    NotFound(String),
    BadThresholds(f64, f64),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CliError::*;
        match self {
            NonLocalPath(p) => write!(f, "path must be local file (no scheme): {p}"),
            NotFound(p) => write!(f, "file not found: {p}"),
            BadThresholds(a, b) => write!(f, "--abc-a ({a}) must not exceed --abc-b ({b})"),
        }
    }
}
impl std::error::Error for CliError {}

/// Percent value in any format the document accepts (`25`, `22,5`, `1.000,5`); must be finite.
pub fn parse_percent(s: &str) -> Result<f64, String> {
    try_parse_lenient(s).ok_or_else(|| format!("not a finite number: {}", s.trim()))
}

/// Cumulative share in `0..=100`.
pub fn parse_share(s: &str) -> Result<f64, String> {
    let v = parse_percent(s)?;
    if !(0.0..=100.0).contains(&v) {
        return Err(format!("share must be within 0..=100: {v}"));
    }
    Ok(v)
}

/// Entry point used by main.rs
pub fn parse_and_validate() -> Result<Args, CliError> {
    validate(Args::parse())
}

/// Scheme, existence and threshold checks; paths come back absolute.
pub fn validate(mut args: Args) -> Result<Args, CliError> {
    ensure_local_path(&args.out)?;
    ensure_local_exists(&args.input, "--input")?;

    if let (Some(a), Some(b)) = (args.abc_a, args.abc_b) {
        if a > b {
            return Err(CliError::BadThresholds(a, b));
        }
    }

    args.input = normalize_path(&args.input);
    args.out = normalize_path(&args.out);
    Ok(args)
}

/// Reject any explicit URI scheme (e.g., http://, https://, file://).
#[inline]
fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    if let Some(s) = p.to_str() {
        if looks_like_url(&s.to_ascii_lowercase()) {
            return Err(CliError::NonLocalPath(s.to_string()));
        }
    }
    Ok(())
}

/// Ensure a path is local (no scheme) and exists as a regular file.
fn ensure_local_exists(p: &Path, label: &'static str) -> Result<(), CliError> {
    ensure_local_path(p)?;
    let meta = fs::metadata(p).map_err(|_| CliError::NotFound(format!("{label} {}", p.display())))?;
    if !meta.is_file() {
        return Err(CliError::NotFound(format!("{label} {}", p.display())));
    }
    Ok(())
}

/// Best-effort absolute path; falls back to CWD-relative when canonicalize fails.
fn normalize_path(p: &Path) -> PathBuf {
    fs::canonicalize(p).unwrap_or_else(|_| {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(p)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("budget").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn percent_parser_accepts_comma_decimal() {
        assert_eq!(parse_percent("25").unwrap(), 25.0);
        assert_eq!(parse_percent(" 22,5 ").unwrap(), 22.5);
        assert_eq!(parse_percent("-3.5").unwrap(), -3.5);
        assert_eq!(parse_percent("1.000,5").unwrap(), 1000.5);
        assert!(parse_percent("").is_err());
        assert!(parse_percent("abc").is_err());
        assert!(parse_percent("inf").is_err());
    }

    #[test]
    fn share_parser_bounds() {
        assert_eq!(parse_share("80").unwrap(), 80.0);
        assert!(parse_share("100.5").is_err());
        assert!(parse_share("-1").is_err());
    }

    #[test]
    fn flags_parse_with_defaults() {
        let a = parse(&["--input", "b.json"]);
        assert_eq!(a.out, PathBuf::from("."));
        assert!(a.markup.is_none());
        assert!(!a.validate_only && !a.quiet && !a.verbose);

        let b = parse(&["--input", "b.json", "--markup", "-5", "--abc-a", "70", "--abc-b", "90", "--quiet"]);
        assert_eq!(b.markup, Some(-5.0));
        assert_eq!((b.abc_a, b.abc_b), (Some(70.0), Some(90.0)));
        assert!(b.quiet);
    }

    #[test]
    fn input_is_required() {
        assert!(Args::try_parse_from(["budget", "--out", "x"]).is_err());
    }

    #[test]
    fn ensure_local_path_rejects_schemes() {
        assert!(ensure_local_path(Path::new("http://x")).is_err());
        assert!(ensure_local_path(Path::new("file://C:/x.json")).is_err());
        assert!(ensure_local_path(Path::new("https://x/y.json")).is_err());
        assert!(ensure_local_path(Path::new(r"C:\local\file.json")).is_ok());
        assert!(ensure_local_path(Path::new("/tmp/file.json")).is_ok());
    }

    #[test]
    fn validate_checks_existence_and_thresholds() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("b.json");
        fs::write(&input, "{}").unwrap();
        let input_s = input.to_str().unwrap();

        let ok = validate(parse(&["--input", input_s])).unwrap();
        assert!(ok.input.is_absolute());
        assert!(ok.out.is_absolute());

        let missing = dir.path().join("nope.json");
        assert!(matches!(
            validate(parse(&["--input", missing.to_str().unwrap()])),
            Err(CliError::NotFound(_))
        ));
        assert!(matches!(
            validate(parse(&["--input", dir.path().to_str().unwrap()])),
            Err(CliError::NotFound(_))
        ));
        assert!(matches!(
            validate(parse(&["--input", input_s, "--abc-a", "90", "--abc-b", "80"])),
            Err(CliError::BadThresholds(_, _))
        ));
        assert!(matches!(
            validate(parse(&["--input", "https://host/b.json"])),
            Err(CliError::NonLocalPath(_))
        ));
    }

    #[test]
    fn normalize_path_returns_absolute() {
        let p = PathBuf::from("does/not/exist.txt");
        assert!(normalize_path(&p).is_absolute());
    }
}

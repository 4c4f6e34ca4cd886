//! bdg_pipeline: deterministic pipeline surface
//! (load → repair → calculate → reconcile → adjust → classify → schedule → build).
//!
//! This crate performs no file writes; JSON, hashing, and loading go through
//! `bdg_io`, arithmetic through `bdg_algo`. The same document and engine meta
//! always yield byte-identical artifacts and ids.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use bdg_algo::{
    abc_curve, adjustment_context, adjustment_factors, calculate_budget, reconcile, repair_hierarchy,
    schedule_summary, totals_with_factors, AbcRow, AdjustedTotals, AdjustmentFactors, Reconciliation,
    ScheduleSummary,
};
use bdg_core::numeric::markup_multiplier;
use bdg_core::{BudgetParams, GlobalAdjustment};
use bdg_io::loader::{self, BudgetDocument, LoadReport, LoadedBudget};
use bdg_io::{hasher, IoError};

pub mod build_calculation;
pub mod build_run_record;

pub use build_calculation::{verify_calculation_id, CalculationBody, CalculationDoc, ItemRow};
pub use build_run_record::RunRecordDoc;

/// Engine identifiers echoed in the run record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineMeta {
    pub vendor: String,
    pub name: String,
    pub version: String,
    pub build: String,
}

impl Default for EngineMeta {
    fn default() -> Self {
        engine_identifiers()
    }
}

/// Engine identifiers for this build.
pub fn engine_identifiers() -> EngineMeta {
    EngineMeta {
        vendor: "bdg".to_string(),
        name: "budget_engine".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build: "dev".to_string(),
    }
}

/// Top-level pipeline outputs.
#[derive(Debug, Clone)]
pub struct PipelineOutputs {
    pub calculation: CalculationDoc,
    pub run_record: RunRecordDoc,
}

/// Single error surface for the pipeline orchestration.
#[derive(Debug)]
pub enum PipelineError {
    Io(String),
    Validate(String),
    Build(String),
    SelfVerify(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Io(m) => write!(f, "io: {m}"),
            PipelineError::Validate(m) => write!(f, "validate: {m}"),
            PipelineError::Build(m) => write!(f, "build: {m}"),
            PipelineError::SelfVerify(m) => write!(f, "self-verify: {m}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<IoError> for PipelineError {
    fn from(e: IoError) -> Self {
        use PipelineError::*;
        match e {
            IoError::Json { pointer, msg } => Validate(format!("json {pointer}: {msg}")),
            IoError::Invalid(m) => Validate(m),
            IoError::Path(m) => Io(format!("path: {m}")),
            IoError::Limit(m) => Io(format!("limit: {m}")),
            IoError::Hash(m) => Build(format!("hash: {m}")),
        }
    }
}

/// Adjustment settings together with what they did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentBlock {
    pub settings: GlobalAdjustment,
    pub factors: AdjustmentFactors,
    pub totals: AdjustedTotals,
}

// -------------------------------------- Public API --------------------------------------

/// Load a budget document from a local path.
pub fn load(path: &Path) -> Result<LoadedBudget, PipelineError> {
    Ok(loader::load_budget_from_path(path)?)
}

/// Load then run.
pub fn run_from_path(path: &Path, meta: &EngineMeta) -> Result<PipelineOutputs, PipelineError> {
    run_loaded(load(path)?, meta)
}

/// Run an in-memory document (no load report; the input digest covers the document itself).
pub fn run_document(doc: BudgetDocument, meta: &EngineMeta) -> Result<PipelineOutputs, PipelineError> {
    let input_sha256 = hasher::sha256_canonical(&doc)?;
    run_stages(doc, None, input_sha256, meta)
}

/// Run a loaded document, keeping its load report and input digest.
pub fn run_loaded(loaded: LoadedBudget, meta: &EngineMeta) -> Result<PipelineOutputs, PipelineError> {
    let LoadedBudget { document, report, input_sha256 } = loaded;
    run_stages(document, Some(report), input_sha256, meta)
}

// -------------------------------------- Stages --------------------------------------

fn run_stages(
    doc: BudgetDocument,
    report: Option<LoadReport>,
    input_sha256: String,
    meta: &EngineMeta,
) -> Result<PipelineOutputs, PipelineError> {
    let params = &doc.params;
    let markup_percent = params.markup();

    // REPAIR → CALCULATE
    let repaired = repair_hierarchy(&doc.items);
    let calc = calculate_budget(&repaired, markup_percent);

    // RECONCILE
    let reconciliation = reconcile(&calc);
    log_reconciliation(&reconciliation);

    // ADJUST (optional)
    let adjustment = params.adjustment.as_ref().map(|settings| adjust(&repaired, settings, markup_percent));

    // CLASSIFY
    let abc: Vec<AbcRow> = abc_curve(&repaired, &calc, &params.abc);

    // SCHEDULE (optional)
    let schedule: Option<ScheduleSummary> = doc.schedule.as_ref().map(|s| schedule_summary(&calc, s));

    // BUILD
    let calculation = build_calculation::build(
        build_calculation::CalculationParts {
            budget_id: doc.budget_id.clone(),
            markup_percent,
            repaired: &repaired,
            calc: &calc,
            reconciliation,
            adjustment,
            abc,
            schedule,
        },
    )?;
    verify_calculation_id(&calculation)?;

    let run_record = build_run_record::build(meta, &input_sha256, params_digest(params)?, report, &calculation)?;

    debug!(
        calculation_id = %calculation.id,
        run_id = %run_record.id,
        items = calculation.body.items.len(),
        "pipeline complete"
    );
    Ok(PipelineOutputs { calculation, run_record })
}

fn adjust(items: &[bdg_core::LineItem], settings: &GlobalAdjustment, markup_percent: f64) -> AdjustmentBlock {
    let multiplier = markup_multiplier(markup_percent);
    let ctx = adjustment_context(items, markup_percent);
    let factors = adjustment_factors(Some(settings), &ctx, multiplier);
    let totals = totals_with_factors(items, &factors, multiplier);
    AdjustmentBlock { settings: settings.clone(), factors, totals }
}

fn params_digest(params: &BudgetParams) -> Result<String, PipelineError> {
    Ok(hasher::sha256_canonical(params)?)
}

fn log_reconciliation(r: &Reconciliation) {
    if r.is_balanced() {
        return;
    }
    warn!(
        orphans = r.orphans.len(),
        unaggregated = r.unaggregated.len(),
        excluded_final = r.excluded_final,
        discrepancy_final = r.discrepancy_final,
        "grand total does not account for every leaf"
    );
}

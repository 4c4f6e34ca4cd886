//! build_run_record.rs
//! Run record: what ran, on which input, producing which calculation.
//! No wall-clock timestamp is recorded, so identical runs share a `RUN:` id.

use serde::{Deserialize, Serialize};

use bdg_core::ids::{CalculationId, RunId};
use bdg_io::canonical_json::to_canonical_bytes;
use bdg_io::hasher;
use bdg_io::loader::LoadReport;

use crate::{CalculationDoc, EngineMeta, PipelineError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecordDoc {
    pub id: RunId,
    pub engine: EngineMeta,
    /// SHA-256 of the canonicalized input document.
    pub input_sha256: String,
    /// SHA-256 of the effective parameters (after any overrides).
    pub params_sha256: String,
    pub calculation_id: CalculationId,
    /// SHA-256 of the full calculation artifact's canonical bytes.
    pub calculation_sha256: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_report: Option<LoadReport>,
}

#[derive(Serialize)]
struct RunNoId<'a> {
    engine: &'a EngineMeta,
    input_sha256: &'a str,
    params_sha256: &'a str,
    calculation_id: &'a CalculationId,
    calculation_sha256: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    load_report: Option<&'a LoadReport>,
}

pub(crate) fn build(
    engine: &EngineMeta,
    input_sha256: &str,
    params_sha256: String,
    load_report: Option<LoadReport>,
    calculation: &CalculationDoc,
) -> Result<RunRecordDoc, PipelineError> {
    let calculation_sha256 = hasher::sha256_hex(&to_canonical_bytes(calculation)?);
    let id = hasher::run_id_from_canonical(&RunNoId {
        engine,
        input_sha256,
        params_sha256: &params_sha256,
        calculation_id: &calculation.id,
        calculation_sha256: &calculation_sha256,
        load_report: load_report.as_ref(),
    })?;
    Ok(RunRecordDoc {
        id,
        engine: engine.clone(),
        input_sha256: input_sha256.to_string(),
        params_sha256,
        calculation_id: calculation.id.clone(),
        calculation_sha256,
        load_report,
    })
}

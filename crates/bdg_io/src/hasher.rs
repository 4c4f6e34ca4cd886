//! crates/bdg_io/src/hasher.rs
//!
//! Deterministic hashing and ID builders for canonical artifacts.
//!
//! - Canonical JSON hashing: sorted object keys, array order preserved, compact.
//! - `CALC:<hex>` is the digest of the calculation payload **without** its `id`.
//! - `RUN:<hex>` is the digest of the run record payload **without** its `id`.
//! - Hex digests are lowercase.
//!
//! Use `sha256_canonical(..)` for JSON values/structs and `sha256_hex(..)` for raw bytes.

use bdg_core::ids::{CalculationId, RunId};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::canonical_json::{canonical_json_bytes, to_canonical_bytes};
use crate::{IoError, IoResult};

/// SHA-256 over raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 over **canonical JSON bytes** of any serializable value.
pub fn sha256_canonical<T: Serialize + ?Sized>(value: &T) -> IoResult<String> {
    Ok(sha256_hex(&to_canonical_bytes(value)?))
}

/// SHA-256 over a parsed `Value`, canonicalized first.
pub fn sha256_canonical_value(v: &Value) -> IoResult<String> {
    Ok(sha256_hex(&canonical_json_bytes(v)?))
}

/* ---------------------------- Artifact ID builders ---------------------------- */

/// `CALC:<hex>` from the canonical bytes of the idless calculation payload.
pub fn calculation_id_from_canonical<T: Serialize + ?Sized>(payload: &T) -> IoResult<CalculationId> {
    let hex = sha256_canonical(payload)?;
    CalculationId::from_digest(&hex).map_err(|e| IoError::Hash(e.to_string()))
}

/// `RUN:<hex>` from the canonical bytes of the idless run payload.
pub fn run_id_from_canonical<T: Serialize + ?Sized>(payload: &T) -> IoResult<RunId> {
    let hex = sha256_canonical(payload)?;
    RunId::from_digest(&hex).map_err(|e| IoError::Hash(e.to_string()))
}

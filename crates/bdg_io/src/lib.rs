//! crates/bdg_io/src/lib.rs
//! File-facing layer of the budget engine.
//!
//! - Shared error type (`IoError`) with `From` conversions used across modules.
//! - `loader`: budget documents from local JSON (lenient numbers, camelCase aliases).
//! - `canonical_json`: sorted-key compact JSON + atomic writes.
//! - `hasher`: SHA-256 digests and `CALC:`/`RUN:` artifact ids.
//!
//! Offline only: nothing here opens a network connection.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error for bdg_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors (open, create_dir_all, rename, fsync).
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON parse/shape errors with a JSON Pointer to the offending node.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    #[error("hash error: {0}")]
    Hash(String),

    /// Input exceeds a hard size limit.
    #[error("limit exceeded: {0}")]
    Limit(String),

    /// Generic validation / invariants.
    #[error("invalid: {0}")]
    Invalid(String),
}

pub type IoResult<T> = Result<T, IoError>;

/* ---------------- From conversions (used by file modules) ---------------- */

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json keeps no pointer; callers that know better set their own.
        IoError::Json { pointer: "/".to_string(), msg: e.to_string() }
    }
}

pub mod canonical_json;
pub mod hasher;
pub mod loader;

/// Returns true if `s` looks like a URL (any `<scheme>://`, or bare http(s):).
#[inline]
pub fn looks_like_url(s: &str) -> bool {
    let s = s.trim();
    s.contains("://") || s.starts_with("http:") || s.starts_with("https:")
}

pub mod prelude {
    pub use crate::canonical_json::{canonical_json_bytes, to_canonical_bytes, write_canonical_file};
    pub use crate::hasher::{sha256_canonical, sha256_hex};
    pub use crate::loader::{load_budget_from_bytes, load_budget_from_path, BudgetDocument, LoadReport, LoadedBudget};
    pub use crate::{looks_like_url, IoError, IoResult};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_detection() {
        assert!(looks_like_url("https://example.com/budget.json"));
        assert!(looks_like_url(" file:///tmp/x.json"));
        assert!(looks_like_url("http:budget.json"));
        assert!(!looks_like_url("budgets/obra-01.json"));
        assert!(!looks_like_url("C:\\budgets\\obra.json"));
    }
}

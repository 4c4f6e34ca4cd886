//! bdg_core: core types, item classification, numeric safety, and ordering helpers.
//!
//! This crate is **I/O-free**. It defines the stable types shared across the
//! engine (`bdg_algo`, `bdg_io`, `bdg_pipeline`, `bdg_cli`).
//!
//! - Identifiers: `ItemId`, `CalculationId` (`CALC:`), `RunId` (`RUN:`)
//! - Line items as they arrive from storage or import (`LineItem`, `ItemType`)
//! - Role classification computed once per item (`ItemRole`)
//! - Lenient numeric input (`RawNumber`) and the sanitizer applied at every
//!   arithmetic boundary
//! - Calculation outputs (`CalculatedItem`, `BudgetCalculation`)
//! - Budget parameters (`BudgetParams`, global adjustment, ABC thresholds)
//!
//! Serialization derives are gated behind the `serde` feature.

#![forbid(unsafe_code)]

pub mod errors {
    use core::fmt;

    /// Minimal error set for core-domain parsing.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub enum CoreError {
        EmptyId,
        IdTooLong,
        InvalidIdChar,
        InvalidArtifactId,
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::EmptyId => write!(f, "empty id"),
                CoreError::IdTooLong => write!(f, "id too long"),
                CoreError::InvalidIdChar => write!(f, "id contains control characters"),
                CoreError::InvalidArtifactId => write!(f, "invalid artifact id"),
            }
        }
    }

    impl std::error::Error for CoreError {}
}

pub mod determinism;
pub mod entities;
pub mod ids;
pub mod numeric;
pub mod variables;

pub use entities::{BudgetCalculation, CalculatedItem, ItemRole, ItemType, LineItem, ScheduleInput};
pub use errors::CoreError;
pub use ids::ItemId;
pub use numeric::RawNumber;
pub use variables::{AbcThresholds, AdjustmentKind, AdjustmentMode, BudgetParams, GlobalAdjustment};

// crates/bdg_algo/src/lib.rs
#![forbid(unsafe_code)]

//! Pure budget algorithms over a flat list of line items.
//!
//! Data flow: raw items → [`repair_hierarchy`] → [`calculate_budget`] →
//! ([`reconcile`], [`adjusted_totals`], [`abc_curve`], [`schedule_summary`]).
//! Nothing here performs I/O or fails on malformed numbers.

pub use bdg_core::{BudgetCalculation, CalculatedItem, ItemId, ItemRole, LineItem};

// ----------------------------- Hierarchy & calculation -----------------------------

pub mod hierarchy;
pub mod calculation;
pub mod reconcile;

pub use calculation::calculate_budget;
pub use hierarchy::repair_hierarchy;
pub use reconcile::{reconcile, Reconciliation};

// ----------------------------- Derived analyses ------------------------------------

#[cfg(feature = "adjustment")]
pub mod adjustment;
#[cfg(feature = "abc")]
pub mod abc_curve;
#[cfg(feature = "schedule")]
pub mod schedule;

#[cfg(feature = "adjustment")]
pub use adjustment::{
    adjusted_item_values, adjusted_totals, adjustment_context, adjustment_factors, classify_origin,
    totals_with_factors,
    AdjustedTotals, AdjustedValues, AdjustmentContext, AdjustmentFactors, CostOrigin,
};
#[cfg(feature = "abc")]
pub use abc_curve::{abc_curve, AbcClass, AbcRow};
#[cfg(feature = "schedule")]
pub use schedule::{schedule_summary, ItemAllocation, PeriodSummary, ScheduleSummary};

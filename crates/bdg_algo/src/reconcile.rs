//! Reconciliation audit: does the grand total account for every leaf?
//!
//! `calculate_budget` silently drops leaves that never reach a stage through the
//! two aggregation passes. This audit makes that visible without changing the
//! calculation result.

use std::collections::BTreeSet;

use bdg_core::numeric::safe_add;
use bdg_core::{BudgetCalculation, ItemId, ItemRole};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Relative tolerance for `is_balanced`.
pub const BALANCE_REL_TOL: f64 = 1e-6;

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Reconciliation {
    pub leaf_total_base: f64,
    pub leaf_total_final: f64,
    /// Non-stage items whose parent chain never reaches a level-1 item.
    pub orphans: Vec<ItemId>,
    /// Leaves that reach a stage but whose value the passes never carried up.
    pub unaggregated: Vec<ItemId>,
    pub excluded_final: f64,
    /// `leaf_total_final - grand_total_final`.
    pub discrepancy_final: f64,
}

impl Reconciliation {
    pub fn is_balanced(&self) -> bool {
        self.discrepancy_final.abs() <= BALANCE_REL_TOL * self.leaf_total_final.abs().max(1.0)
    }
}

/// Audit a finished calculation.
pub fn reconcile(calc: &BudgetCalculation) -> Reconciliation {
    let mut out = Reconciliation::default();

    for item in calc.per_item.values() {
        if item.role == ItemRole::Stage {
            continue;
        }
        let reaches_stage = reaches_stage(calc, item.parent_id.as_ref());
        if !reaches_stage {
            out.orphans.push(item.id.clone());
        }
        if item.role != ItemRole::Leaf {
            continue;
        }
        out.leaf_total_base = safe_add(out.leaf_total_base, item.base_total);
        out.leaf_total_final = safe_add(out.leaf_total_final, item.final_total);
        if !reaches_stage {
            out.excluded_final = safe_add(out.excluded_final, item.final_total);
        } else if !calc.is_rolled_up(&item.id) {
            out.unaggregated.push(item.id.clone());
            out.excluded_final = safe_add(out.excluded_final, item.final_total);
        }
    }

    out.discrepancy_final = out.leaf_total_final - calc.grand_total_final;
    out
}

/// Walk parents until a stage, a dangling id, or a cycle.
fn reaches_stage<'a>(calc: &'a BudgetCalculation, mut parent: Option<&'a ItemId>) -> bool {
    let mut seen: BTreeSet<&ItemId> = BTreeSet::new();
    while let Some(pid) = parent {
        if !seen.insert(pid) {
            return false;
        }
        match calc.get(pid) {
            Some(p) if p.role == ItemRole::Stage => return true,
            Some(p) => parent = p.parent_id.as_ref(),
            None => return false,
        }
    }
    false
}

//! ABC (Pareto) classification of leaves by final value.

use std::collections::BTreeMap;

use bdg_core::determinism::cmp_amount_desc;
use bdg_core::numeric::{percent_of, safe_add};
use bdg_core::{AbcThresholds, BudgetCalculation, ItemId, LineItem};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AbcClass {
    A,
    B,
    C,
}

impl AbcClass {
    fn from_cumulative(cumulative_pct: f64, t: &AbcThresholds) -> Self {
        if cumulative_pct <= t.a_max_pct {
            AbcClass::A
        } else if cumulative_pct <= t.b_max_pct {
            AbcClass::B
        } else {
            AbcClass::C
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AbcRow {
    pub rank: usize,
    pub id: ItemId,
    pub final_total: f64,
    pub share_pct: f64,
    pub cumulative_pct: f64,
    pub class: AbcClass,
}

/// Rank leaves by `final_total` (desc; ties by `order`, then id) and classify.
pub fn abc_curve(items: &[LineItem], calc: &BudgetCalculation, thresholds: &AbcThresholds) -> Vec<AbcRow> {
    let thresholds = thresholds.normalized();
    // Later duplicates win, as in the calculation.
    let order_of: BTreeMap<&ItemId, i64> = items.iter().map(|i| (&i.id, i.order)).collect();
    let order = |id: &ItemId| order_of.get(id).copied().unwrap_or_default();

    let mut leaves: Vec<_> = calc.leaves().collect();
    leaves.sort_by(|a, b| {
        cmp_amount_desc(a.final_total, order(&a.id), a.id.as_str(), b.final_total, order(&b.id), b.id.as_str())
    });

    let total = leaves.iter().fold(0.0, |acc, c| safe_add(acc, c.final_total));
    let mut cumulative = 0.0;
    leaves
        .into_iter()
        .enumerate()
        .map(|(i, c)| {
            let share_pct = if total == 0.0 { 0.0 } else { percent_of(c.final_total, total) };
            cumulative = safe_add(cumulative, share_pct);
            AbcRow {
                rank: i + 1,
                id: c.id.clone(),
                final_total: c.final_total,
                share_pct,
                cumulative_pct: cumulative,
                class: AbcClass::from_cumulative(cumulative, &thresholds),
            }
        })
        .collect()
}

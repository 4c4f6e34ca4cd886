//! Physical-financial schedule roll-up.
//!
//! Distributions give, per leaf, the percent of its final total planned in each
//! period. Costs per period are accumulated against the grand total.

use std::collections::{BTreeMap, BTreeSet};

use bdg_core::numeric::{percent_of, safe_add, safe_mul, sanitize};
use bdg_core::{BudgetCalculation, ItemId, ItemRole, ScheduleInput};
use tracing::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PeriodSummary {
    pub period: u32,
    pub cost: f64,
    pub percent_of_total: f64,
    pub cumulative_percent: f64,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ItemAllocation {
    pub allocated_percent: f64,
    pub unallocated_final: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScheduleSummary {
    pub periods: Vec<PeriodSummary>,
    pub items: BTreeMap<ItemId, ItemAllocation>,
    pub unallocated_final: f64,
    /// Distribution rows naming a group or an unknown id.
    pub ignored_entries: usize,
}

pub fn schedule_summary(calc: &BudgetCalculation, input: &ScheduleInput) -> ScheduleSummary {
    // Listed periods, first occurrence only.
    let mut seen = BTreeSet::new();
    let periods: Vec<u32> = input.periods.iter().copied().filter(|p| seen.insert(*p)).collect();

    let ignored_entries = input
        .distributions
        .keys()
        .filter(|id| calc.get(id).map_or(true, |c| c.role != ItemRole::Leaf))
        .count();

    let mut costs = vec![0.0; periods.len()];
    let mut items = BTreeMap::new();
    let mut unallocated_total = 0.0;

    for leaf in calc.leaves() {
        let dist = input.distributions.get(&leaf.id);
        let mut allocated = 0.0;
        for (slot, period) in periods.iter().enumerate() {
            let pct = dist.and_then(|d| d.get(period)).map_or(0.0, |v| v.value());
            allocated = safe_add(allocated, pct);
            costs[slot] = safe_add(costs[slot], safe_mul(leaf.final_total, pct / 100.0));
        }
        let unallocated = sanitize(leaf.final_total * (1.0 - allocated / 100.0)).max(0.0);
        unallocated_total = safe_add(unallocated_total, unallocated);
        items.insert(
            leaf.id.clone(),
            ItemAllocation { allocated_percent: allocated, unallocated_final: unallocated },
        );
    }

    let mut cumulative = 0.0;
    let periods = periods
        .into_iter()
        .zip(costs)
        .map(|(period, cost)| {
            cumulative = safe_add(cumulative, cost);
            let (percent_of_total, cumulative_percent) = if calc.grand_total_final == 0.0 {
                (0.0, 0.0)
            } else {
                (percent_of(cost, calc.grand_total_final), percent_of(cumulative, calc.grand_total_final))
            };
            PeriodSummary { period, cost, percent_of_total, cumulative_percent }
        })
        .collect();

    if unallocated_total > 0.0 && !input.distributions.is_empty() {
        warn!(unallocated_final = unallocated_total, "schedule leaves value unallocated");
    }
    if ignored_entries > 0 {
        warn!(ignored_entries, "schedule rows for groups or unknown items ignored");
    }

    ScheduleSummary { periods, items, unallocated_final: unallocated_total, ignored_entries }
}

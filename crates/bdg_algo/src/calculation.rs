//! Bottom-up budget calculation.
//!
//! Three sequential passes over the whole item set, then weights:
//! 1. leaf costs: `base = qty × unit`, `final = base × (1 + markup/100)`; groups start at 0
//! 2. level-2 totals = Σ direct children (any level)
//! 3. level-1 totals = Σ direct children (any level); grand totals = Σ level-1
//! 4. `weight = final / grand_final × 100` (grand 0 treated as 1)
//!
//! Children are indexed once per call. Items whose parent chain never reaches a
//! level-1 item keep their own leaf values but are excluded from every roll-up
//! and from the grand total; see `reconcile` for the audit.

use std::collections::{BTreeMap, BTreeSet};

use bdg_core::numeric::{markup_multiplier, percent_of, safe_add, safe_mul};
use bdg_core::{BudgetCalculation, CalculatedItem, ItemId, ItemRole, LineItem};
use tracing::{debug, warn};

/// Compute per-item costs, roll-ups, grand totals and weights.
///
/// Never fails: malformed numbers are sanitized to 0, missing links simply do
/// not aggregate. Does not repair the hierarchy; run `repair_hierarchy` first.
/// When two items share an id, the later one replaces the earlier.
pub fn calculate_budget(items: &[LineItem], markup_percent: f64) -> BudgetCalculation {
    let markup = markup_multiplier(markup_percent);

    // Pass 1: classify once, cost the leaves.
    let mut per_item: BTreeMap<ItemId, CalculatedItem> = BTreeMap::new();
    let mut duplicates = 0usize;
    for item in items {
        if per_item.insert(item.id.clone(), leaf_cost(item, markup)).is_some() {
            duplicates += 1;
        }
    }
    if duplicates > 0 {
        warn!(duplicates, "duplicate item ids; later items replace earlier ones");
    }

    let children = index_children(&per_item);
    let sub_stages = ids_with_role(items, &per_item, ItemRole::SubStage);
    let stages = ids_with_role(items, &per_item, ItemRole::Stage);

    // Leaves carried by each group total, tracked alongside the sums.
    let mut carried: BTreeMap<ItemId, BTreeSet<ItemId>> = BTreeMap::new();

    // Pass 2: sub-stages.
    for sub in &sub_stages {
        let (base, fin) = sum_children(&per_item, children.get(sub));
        if let Some(calc) = per_item.get_mut(sub) {
            calc.base_total = base;
            calc.final_total = fin;
        }
        let leaves = carried_leaves(&per_item, &carried, children.get(sub));
        carried.insert(sub.clone(), leaves);
    }

    // Pass 3: stages and grand totals.
    let mut grand_total_base = 0.0;
    let mut grand_total_final = 0.0;
    let mut rolled_up: BTreeSet<ItemId> = BTreeSet::new();
    for stage in &stages {
        let (base, fin) = sum_children(&per_item, children.get(stage));
        if let Some(calc) = per_item.get_mut(stage) {
            calc.base_total = base;
            calc.final_total = fin;
        }
        grand_total_base = safe_add(grand_total_base, base);
        grand_total_final = safe_add(grand_total_final, fin);
        let leaves = carried_leaves(&per_item, &carried, children.get(stage));
        rolled_up.extend(leaves.iter().cloned());
        carried.insert(stage.clone(), leaves);
    }

    // Weights.
    for calc in per_item.values_mut() {
        calc.weight_percent = percent_of(calc.final_total, grand_total_final);
    }

    debug!(
        items = per_item.len(),
        stages = stages.len(),
        sub_stages = sub_stages.len(),
        grand_total_base,
        grand_total_final,
        markup,
        "budget calculated"
    );

    BudgetCalculation {
        per_item,
        grand_total_base,
        grand_total_final,
        markup_multiplier: markup,
        rolled_up,
    }
}

fn leaf_cost(item: &LineItem, markup: f64) -> CalculatedItem {
    let role = item.role();
    let mut calc = CalculatedItem {
        id: item.id.clone(),
        parent_id: item.parent_id.clone(),
        level: item.level,
        role,
        is_group: role.is_group(),
        base_unit_price: 0.0,
        base_total: 0.0,
        final_unit_price: 0.0,
        final_total: 0.0,
        weight_percent: 0.0,
    };
    if !calc.is_group {
        let unit = item.unit_price.value();
        let qty = item.quantity.value();
        calc.base_unit_price = unit;
        calc.base_total = safe_mul(qty, unit);
        calc.final_unit_price = safe_mul(unit, markup);
        calc.final_total = safe_mul(calc.base_total, markup);
    }
    calc
}

/// parent id → direct children, in id order.
fn index_children(per_item: &BTreeMap<ItemId, CalculatedItem>) -> BTreeMap<ItemId, Vec<ItemId>> {
    let mut children: BTreeMap<ItemId, Vec<ItemId>> = BTreeMap::new();
    for calc in per_item.values() {
        if let Some(parent) = &calc.parent_id {
            children.entry(parent.clone()).or_default().push(calc.id.clone());
        }
    }
    children
}

/// Ids whose surviving entry has `role`, in first-seen input order.
fn ids_with_role(items: &[LineItem], per_item: &BTreeMap<ItemId, CalculatedItem>, role: ItemRole) -> Vec<ItemId> {
    let mut seen: BTreeSet<&ItemId> = BTreeSet::new();
    items
        .iter()
        .filter(|item| seen.insert(&item.id))
        .filter(|item| per_item.get(&item.id).is_some_and(|c| c.role == role))
        .map(|item| item.id.clone())
        .collect()
}

/// Leaves a group picks up from its direct children, given what earlier groups carry now.
fn carried_leaves(
    per_item: &BTreeMap<ItemId, CalculatedItem>,
    carried: &BTreeMap<ItemId, BTreeSet<ItemId>>,
    kids: Option<&Vec<ItemId>>,
) -> BTreeSet<ItemId> {
    let mut out = BTreeSet::new();
    for kid in kids.into_iter().flatten() {
        match per_item.get(kid).map(|c| c.role) {
            Some(ItemRole::Leaf) => {
                out.insert(kid.clone());
            }
            Some(ItemRole::Stage | ItemRole::SubStage) => {
                if let Some(leaves) = carried.get(kid) {
                    out.extend(leaves.iter().cloned());
                }
            }
            _ => {}
        }
    }
    out
}

fn sum_children(per_item: &BTreeMap<ItemId, CalculatedItem>, kids: Option<&Vec<ItemId>>) -> (f64, f64) {
    let mut base = 0.0;
    let mut fin = 0.0;
    for kid in kids.into_iter().flatten() {
        if let Some(c) = per_item.get(kid) {
            base = safe_add(base, c.base_total);
            fin = safe_add(fin, c.final_total);
        }
    }
    (base, fin)
}

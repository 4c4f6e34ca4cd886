//! build_calculation.rs
//! Assemble the calculation artifact: idless body first, then `CALC:<sha256>`
//! over the body's canonical bytes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use bdg_algo::{AbcRow, Reconciliation, ScheduleSummary};
use bdg_core::ids::CalculationId;
use bdg_core::{BudgetCalculation, ItemId, ItemRole, LineItem};
use bdg_io::hasher;

use crate::{AdjustmentBlock, PipelineError};

/// One output row per item, in repaired document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRow {
    pub id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ItemId>,
    pub order: i64,
    pub level: u32,
    pub role: ItemRole,
    pub base_unit_price: f64,
    pub base_total: f64,
    pub final_unit_price: f64,
    pub final_total: f64,
    pub weight_percent: f64,
}

/// Everything in the artifact except its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_id: Option<String>,
    pub markup_percent: f64,
    pub markup_multiplier: f64,
    pub grand_total_base: f64,
    pub grand_total_final: f64,
    pub items: Vec<ItemRow>,
    pub reconciliation: Reconciliation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjustment: Option<AdjustmentBlock>,
    pub abc: Vec<AbcRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationDoc {
    pub id: CalculationId,
    #[serde(flatten)]
    pub body: CalculationBody,
}

pub(crate) struct CalculationParts<'a> {
    pub budget_id: Option<String>,
    pub markup_percent: f64,
    pub repaired: &'a [LineItem],
    pub calc: &'a BudgetCalculation,
    pub reconciliation: Reconciliation,
    pub adjustment: Option<AdjustmentBlock>,
    pub abc: Vec<AbcRow>,
    pub schedule: Option<ScheduleSummary>,
}

pub(crate) fn build(parts: CalculationParts<'_>) -> Result<CalculationDoc, PipelineError> {
    let body = CalculationBody {
        budget_id: parts.budget_id,
        markup_percent: parts.markup_percent,
        markup_multiplier: parts.calc.markup_multiplier,
        grand_total_base: parts.calc.grand_total_base,
        grand_total_final: parts.calc.grand_total_final,
        items: item_rows(parts.repaired, parts.calc),
        reconciliation: parts.reconciliation,
        adjustment: parts.adjustment,
        abc: parts.abc,
        schedule: parts.schedule,
    };
    let id = hasher::calculation_id_from_canonical(&body)?;
    Ok(CalculationDoc { id, body })
}

/// Rows follow the repaired order; for a duplicated id only the last occurrence
/// (the one the calculation kept) is emitted.
fn item_rows(repaired: &[LineItem], calc: &BudgetCalculation) -> Vec<ItemRow> {
    let last_index: BTreeMap<&ItemId, usize> = repaired.iter().enumerate().map(|(i, it)| (&it.id, i)).collect();
    repaired
        .iter()
        .enumerate()
        .filter(|(i, it)| last_index.get(&it.id) == Some(i))
        .filter_map(|(_, it)| {
            let c = calc.get(&it.id)?;
            Some(ItemRow {
                id: it.id.clone(),
                parent_id: it.parent_id.clone(),
                order: it.order,
                level: c.level,
                role: c.role,
                base_unit_price: c.base_unit_price,
                base_total: c.base_total,
                final_unit_price: c.final_unit_price,
                final_total: c.final_total,
                weight_percent: c.weight_percent,
            })
        })
        .collect()
}

/// Recompute the id from the body and compare.
pub fn verify_calculation_id(doc: &CalculationDoc) -> Result<(), PipelineError> {
    let expected = hasher::calculation_id_from_canonical(&doc.body)?;
    if expected == doc.id {
        Ok(())
    } else {
        Err(PipelineError::SelfVerify(format!("calculation id {} does not match content ({expected})", doc.id)))
    }
}

//! Global price adjustment layered on top of a calculation.
//!
//! Two steps: derive factors from the unadjusted leaf totals (the context), then
//! apply them per item. Labor and equipment share one factor; the markup factor
//! scales the final price only.

use bdg_core::numeric::{markup_multiplier, safe_add, safe_mul, sanitize};
use bdg_core::{AdjustmentKind, AdjustmentMode, GlobalAdjustment, ItemRole, ItemType, LineItem};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const LABOR_KEYWORDS: &[&str] = &[
    "PEDREIRO",
    "SERVENTE",
    "ENCARREGADO",
    "AJUDANTE",
    "OPERADOR",
    "CARPINTEIRO",
    "ARMADOR",
    "MONTADOR",
    "ELETRICISTA",
    "ENCANADOR",
    "PINTOR",
    "MESTRE",
    "HORISTA",
    "MENSALISTA",
];

const EQUIPMENT_KEYWORDS: &[&str] =
    &["CAMINHÃO", "TRATOR", "LOCAÇÃO", "EQUIPAMENTO", "MÁQUINA", "BETONEIRA", "GUINCHO"];

/// Cost family of a leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CostOrigin {
    Material,
    Labor,
    Equipment,
}

/// Explicit labor/equipment tags win; otherwise description keywords; else material.
pub fn classify_origin(description: &str, item_type: ItemType) -> CostOrigin {
    match item_type {
        ItemType::Labor => return CostOrigin::Labor,
        ItemType::Equipment => return CostOrigin::Equipment,
        _ => {}
    }
    let desc = description.to_uppercase();
    if LABOR_KEYWORDS.iter().any(|kw| desc.contains(kw)) {
        CostOrigin::Labor
    } else if EQUIPMENT_KEYWORDS.iter().any(|kw| desc.contains(kw)) {
        CostOrigin::Equipment
    } else {
        CostOrigin::Material
    }
}

/// Unadjusted leaf totals the factors are solved against.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AdjustmentContext {
    pub total_base: f64,
    pub total_final: f64,
    pub total_material_base: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AdjustmentFactors {
    pub material: f64,
    pub labor: f64,
    pub markup: f64,
}

impl Default for AdjustmentFactors {
    fn default() -> Self {
        Self { material: 1.0, labor: 1.0, markup: 1.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AdjustedValues {
    pub unit_price: f64,
    pub final_unit_price: f64,
    pub origin: CostOrigin,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AdjustedTotals {
    pub total_base: f64,
    pub total_final: f64,
    pub total_markup: f64,
    pub material_base: f64,
    pub labor_base: f64,
    pub equipment_base: f64,
}

fn leaves(items: &[LineItem]) -> impl Iterator<Item = &LineItem> {
    items.iter().filter(|i| i.role() == ItemRole::Leaf)
}

pub fn adjustment_context(items: &[LineItem], markup_percent: f64) -> AdjustmentContext {
    let mut ctx = AdjustmentContext::default();
    for item in leaves(items) {
        let total = safe_mul(item.unit_price.value(), item.quantity.value());
        ctx.total_base = safe_add(ctx.total_base, total);
        if classify_origin(&item.description, item.item_type) == CostOrigin::Material {
            ctx.total_material_base = safe_add(ctx.total_material_base, total);
        }
    }
    ctx.total_final = safe_mul(ctx.total_base, markup_multiplier(markup_percent));
    ctx
}

/// Solve the factors for `adjustment`; identity when there is none.
pub fn adjustment_factors(
    adjustment: Option<&GlobalAdjustment>,
    ctx: &AdjustmentContext,
    markup_multiplier: f64,
) -> AdjustmentFactors {
    let mut f = AdjustmentFactors::default();
    let Some(adj) = adjustment else {
        return f;
    };
    let value = adj.value.value();

    if adj.kind == AdjustmentKind::Percentage {
        let factor = sanitize(1.0 + value / 100.0);
        match adj.mode {
            AdjustmentMode::GlobalAll => {
                f.material = factor;
                f.labor = factor;
            }
            AdjustmentMode::MaterialsOnly => f.material = factor,
            AdjustmentMode::BdiOnly => f.markup = factor,
        }
        return f;
    }

    let target = match adj.kind {
        AdjustmentKind::FixedTargetTotal => value,
        _ => safe_add(ctx.total_final, value),
    };
    let scale = if ctx.total_final > 0.0 { sanitize(target / ctx.total_final) } else { 1.0 };

    match adj.mode {
        AdjustmentMode::GlobalAll => {
            f.material = scale;
            f.labor = scale;
        }
        AdjustmentMode::BdiOnly => f.markup = scale,
        AdjustmentMode::MaterialsOnly => {
            let markup = sanitize(markup_multiplier);
            if ctx.total_material_base > 0.0 && markup != 0.0 {
                let labor_base = ctx.total_base - ctx.total_material_base;
                f.material = sanitize((target / markup - labor_base) / ctx.total_material_base);
            }
        }
    }
    f
}

pub fn adjusted_item_values(item: &LineItem, factors: &AdjustmentFactors, markup_multiplier: f64) -> AdjustedValues {
    let origin = classify_origin(&item.description, item.item_type);
    let factor = match origin {
        CostOrigin::Material => factors.material,
        CostOrigin::Labor | CostOrigin::Equipment => factors.labor,
    };
    let unit_price = safe_mul(item.unit_price.value(), factor);
    let final_unit_price = safe_mul(safe_mul(unit_price, markup_multiplier), factors.markup);
    AdjustedValues { unit_price, final_unit_price, origin }
}

/// Leaf totals after applying `adjustment`, split by cost origin.
pub fn adjusted_totals(items: &[LineItem], adjustment: Option<&GlobalAdjustment>, markup_percent: f64) -> AdjustedTotals {
    let markup = markup_multiplier(markup_percent);
    let ctx = adjustment_context(items, markup_percent);
    let factors = adjustment_factors(adjustment, &ctx, markup);
    totals_with_factors(items, &factors, markup)
}

/// Totals over the leaves with factors already solved.
pub fn totals_with_factors(items: &[LineItem], factors: &AdjustmentFactors, markup: f64) -> AdjustedTotals {
    let mut t = AdjustedTotals::default();
    for item in leaves(items) {
        let qty = item.quantity.value();
        let adj = adjusted_item_values(item, factors, markup);
        let base = safe_mul(adj.unit_price, qty);
        t.total_base = safe_add(t.total_base, base);
        t.total_final = safe_add(t.total_final, safe_mul(adj.final_unit_price, qty));
        match adj.origin {
            CostOrigin::Material => t.material_base = safe_add(t.material_base, base),
            CostOrigin::Labor => t.labor_base = safe_add(t.labor_base, base),
            CostOrigin::Equipment => t.equipment_base = safe_add(t.equipment_base, base),
        }
    }
    t.total_markup = sanitize(t.total_final - t.total_base);
    tracing::debug!(?factors, total_final = t.total_final, "adjustment applied");
    t
}

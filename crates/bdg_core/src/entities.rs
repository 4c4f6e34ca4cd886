//! Domain entities: line items as stored/imported and the calculation outputs.
//!
//! The hierarchy is implicit: each item carries a `level` (1 = stage, 2 = sub-stage,
//! 3+ = item) and an optional `parent_id`. No nested structure is ever built; the
//! algorithms work over a flat list indexed by id.

use std::collections::{BTreeMap, BTreeSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::ItemId;
use crate::numeric::RawNumber;

/// Level assumed when the source omits it.
pub const DEFAULT_LEVEL: u32 = 3;

/// Source type tag of a line item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ItemType {
    Group,
    Etapa,
    Subetapa,
    #[default]
    Material,
    Labor,
    Equipment,
    Service,
    #[cfg_attr(feature = "serde", serde(other))]
    Other,
}

impl ItemType {
    /// Structural, non-costed tags.
    #[inline]
    pub fn is_group_tag(self) -> bool {
        matches!(self, ItemType::Group | ItemType::Etapa | ItemType::Subetapa)
    }
}

/// Role of an item in the calculation, derived once from `(level, type)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ItemRole {
    /// Level 1.
    Stage,
    /// Level 2.
    SubStage,
    /// Level 0, or level 3+ tagged as a structural group. Never costed, never aggregated.
    Group,
    /// Costed line: quantity × unit price.
    Leaf,
}

impl ItemRole {
    pub fn classify(level: u32, item_type: ItemType) -> Self {
        match level {
            1 => ItemRole::Stage,
            2 => ItemRole::SubStage,
            0 => ItemRole::Group,
            _ if item_type.is_group_tag() => ItemRole::Group,
            _ => ItemRole::Leaf,
        }
    }

    #[inline]
    pub fn is_group(self) -> bool {
        !matches!(self, ItemRole::Leaf)
    }
}

/// One budget line as received from storage or import.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineItem {
    pub id: ItemId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub order: i64,
    #[cfg_attr(feature = "serde", serde(default = "default_level"))]
    pub level: u32,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub parent_id: Option<ItemId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub quantity: RawNumber,
    #[cfg_attr(feature = "serde", serde(default))]
    pub unit_price: RawNumber,
    #[cfg_attr(feature = "serde", serde(default, rename = "type"))]
    pub item_type: ItemType,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: String,
}

#[cfg(feature = "serde")]
fn default_level() -> u32 {
    DEFAULT_LEVEL
}

impl LineItem {
    /// Bare item at `level`/`order`, no parent, no cost.
    pub fn new(id: ItemId, level: u32, order: i64) -> Self {
        Self {
            id,
            order,
            level,
            parent_id: None,
            quantity: RawNumber::Missing,
            unit_price: RawNumber::Missing,
            item_type: ItemType::default(),
            description: String::new(),
        }
    }

    pub fn with_parent(mut self, parent: ItemId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    pub fn with_cost(mut self, quantity: impl Into<RawNumber>, unit_price: impl Into<RawNumber>) -> Self {
        self.quantity = quantity.into();
        self.unit_price = unit_price.into();
        self
    }

    pub fn with_type(mut self, item_type: ItemType) -> Self {
        self.item_type = item_type;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[inline]
    pub fn role(&self) -> ItemRole {
        ItemRole::classify(self.level, self.item_type)
    }
}

/// Per-item result of a calculation pass.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalculatedItem {
    pub id: ItemId,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub parent_id: Option<ItemId>,
    pub level: u32,
    pub role: ItemRole,
    pub is_group: bool,
    pub base_unit_price: f64,
    pub base_total: f64,
    pub final_unit_price: f64,
    pub final_total: f64,
    pub weight_percent: f64,
}

/// Full output of `calculate_budget`.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BudgetCalculation {
    pub per_item: BTreeMap<ItemId, CalculatedItem>,
    pub grand_total_base: f64,
    pub grand_total_final: f64,
    pub markup_multiplier: f64,
    /// Leaves whose value the aggregation passes carried into the grand total.
    #[cfg_attr(feature = "serde", serde(default))]
    pub rolled_up: BTreeSet<ItemId>,
}

impl BudgetCalculation {
    #[inline]
    pub fn get(&self, id: &ItemId) -> Option<&CalculatedItem> {
        self.per_item.get(id)
    }

    pub fn stages(&self) -> impl Iterator<Item = &CalculatedItem> {
        self.per_item.values().filter(|c| c.role == ItemRole::Stage)
    }

    pub fn leaves(&self) -> impl Iterator<Item = &CalculatedItem> {
        self.per_item.values().filter(|c| c.role == ItemRole::Leaf)
    }

    #[inline]
    pub fn is_rolled_up(&self, id: &ItemId) -> bool {
        self.rolled_up.contains(id)
    }
}

/// Planned physical-financial distribution: percent of each item's final total per period.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScheduleInput {
    #[cfg_attr(feature = "serde", serde(default))]
    pub periods: Vec<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub distributions: BTreeMap<ItemId, BTreeMap<u32, RawNumber>>,
}

//! variables.rs: budget parameters with safe defaults.
//!
//! - `markup_percent` (BDI) is stored per budget and accepted leniently.
//! - `adjustment` is an optional budget-wide price adjustment.
//! - `abc` holds the cumulative-share cut points of the ABC curve.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::numeric::{sanitize, RawNumber};

/// Define an enum with explicit wire tokens.
macro_rules! wire_enum {
    ($(#[$m:meta])* $name:ident => { $($variant:ident = $token:literal),+ $(,)? }) => {
        $(#[$m])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub enum $name {
            $(
                #[cfg_attr(feature = "serde", serde(rename = $token))]
                $variant,
            )+
        }

        impl $name {
            pub fn as_token(self) -> &'static str {
                match self {
                    $( $name::$variant => $token, )+
                }
            }
        }
    };
}

wire_enum!(
    /// Which share of the budget an adjustment touches.
    AdjustmentMode => {
        MaterialsOnly = "materials_only",
        BdiOnly       = "bdi_only",
        GlobalAll     = "global_all",
    }
);

wire_enum!(
    /// How the adjustment `value` is interpreted.
    AdjustmentKind => {
        Percentage       = "percentage",
        Fixed            = "fixed",
        FixedTargetTotal = "fixed_target_total",
        FixedDelta       = "fixed_delta",
    }
);

/// Budget-wide price adjustment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GlobalAdjustment {
    pub mode: AdjustmentMode,
    pub kind: AdjustmentKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub value: RawNumber,
}

/// Cumulative-share cut points (percent) for the ABC curve.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AbcThresholds {
    pub a_max_pct: f64,
    pub b_max_pct: f64,
}

impl Default for AbcThresholds {
    fn default() -> Self {
        Self { a_max_pct: 80.0, b_max_pct: 95.0 }
    }
}

impl AbcThresholds {
    /// Clamp to `0..=100` and force `a ≤ b`.
    pub fn normalized(self) -> Self {
        let a = sanitize(self.a_max_pct).clamp(0.0, 100.0);
        let b = sanitize(self.b_max_pct).clamp(0.0, 100.0);
        Self { a_max_pct: a.min(b), b_max_pct: b.max(a) }
    }
}

/// Parameters of one calculation run.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BudgetParams {
    #[cfg_attr(feature = "serde", serde(default))]
    pub markup_percent: RawNumber,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub adjustment: Option<GlobalAdjustment>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub abc: AbcThresholds,
}

impl BudgetParams {
    pub fn with_markup(markup_percent: f64) -> Self {
        Self { markup_percent: RawNumber::Number(markup_percent), ..Self::default() }
    }

    #[inline]
    pub fn markup(&self) -> f64 {
        self.markup_percent.value()
    }
}

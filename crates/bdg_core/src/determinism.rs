//! Determinism utilities: stable ordering for line items and ranked outputs.
//!
//! This module is **I/O-free**. Sorting is always stable so that ties keep the
//! caller's relative order; float keys use `total_cmp` so NaN can never break
//! the ordering (values are sanitized upstream anyway).

use core::cmp::Ordering;

use crate::entities::LineItem;

/// Provide a **total**, stable order for values that must sort canonically.
pub trait StableOrd {
    fn stable_cmp(&self, other: &Self) -> Ordering;
}

impl StableOrd for LineItem {
    /// Document order is `order` only; equal orders compare `Equal` so a stable
    /// sort keeps the input sequence.
    #[inline]
    fn stable_cmp(&self, other: &Self) -> Ordering {
        self.order.cmp(&other.order)
    }
}

/// Sort items **in place** by ascending `order` (stable).
#[inline]
pub fn sort_items_by_order(xs: &mut [LineItem]) {
    xs.sort_by(|a, b| a.stable_cmp(b));
}

/// Ranking order for value tables: amount ↓, then `order` ↑, then id ↑.
#[inline]
pub fn cmp_amount_desc(a_amount: f64, a_order: i64, a_id: &str, b_amount: f64, b_order: i64, b_id: &str) -> Ordering {
    b_amount
        .total_cmp(&a_amount)
        .then_with(|| a_order.cmp(&b_order))
        .then_with(|| a_id.cmp(b_id))
}

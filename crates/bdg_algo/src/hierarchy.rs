//! Hierarchy repair ("virtual parenting") for flat item lists.
//!
//! Contract:
//! - Output is a new list, sorted by `order` ascending (stable), same length,
//!   same items; only `parent_id` may change.
//! - Gaps are filled, explicit links are never overwritten (even if wrong).
//! - Level 2 without parent → the nearest preceding level-1 item.
//! - Level 3+ without parent → the nearest preceding level-2 item within the
//!   current stage, else the nearest preceding level-1 item, else left absent.
//! - A new level-1 item resets the sub-stage context.

use bdg_core::determinism::sort_items_by_order;
use bdg_core::{ItemId, LineItem};
use tracing::debug;

/// Fill missing parent links from document order.
pub fn repair_hierarchy(items: &[LineItem]) -> Vec<LineItem> {
    let mut sorted = items.to_vec();
    sort_items_by_order(&mut sorted);

    let mut last_stage: Option<ItemId> = None;
    let mut last_sub_stage: Option<ItemId> = None;
    let mut filled = 0usize;
    let mut unresolved = 0usize;

    for item in &mut sorted {
        match item.level {
            1 => {
                last_stage = Some(item.id.clone());
                last_sub_stage = None;
            }
            2 => {
                last_sub_stage = Some(item.id.clone());
                if item.parent_id.is_none() {
                    match &last_stage {
                        Some(stage) => {
                            item.parent_id = Some(stage.clone());
                            filled += 1;
                        }
                        None => unresolved += 1,
                    }
                }
            }
            level if level >= 3 => {
                if item.parent_id.is_none() {
                    match last_sub_stage.as_ref().or(last_stage.as_ref()) {
                        Some(parent) => {
                            item.parent_id = Some(parent.clone());
                            filled += 1;
                        }
                        None => unresolved += 1,
                    }
                }
            }
            // Level 0 carries no hierarchy meaning.
            _ => {}
        }
    }

    debug!(items = sorted.len(), filled, unresolved, "hierarchy repaired");
    sorted
}

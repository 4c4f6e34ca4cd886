//! Loader: read a local budget document (JSON), normalize each row into a
//! `LineItem`, and return a typed `LoadedBudget` for the pipeline. No network I/O.
//!
//! Rows are taken leniently, the way spreadsheet imports and database exports
//! arrive:
//! - `snake_case` and camelCase keys (`parentId`, `unitPrice`, `markupPercent`)
//! - numbers as JSON numbers, locale strings, or null
//! - ids as strings or numbers
//! - missing/zero level → 3, missing order → row position, blank parent → none
//! - rows without an id are skipped (they cannot take part in aggregation)

use std::fs;
use std::path::Path;

use bdg_core::entities::DEFAULT_LEVEL;
use bdg_core::{
    AbcThresholds, BudgetParams, GlobalAdjustment, ItemId, ItemType, LineItem, RawNumber, ScheduleInput,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::hasher::{sha256_canonical_value, sha256_hex};
use crate::{looks_like_url, IoError, IoResult};

/// Prefix of the placeholder kept for an explicit but invalid parent id.
pub const UNRESOLVED_PARENT_PREFIX: &str = "unresolved-parent:";

/// Hard cap on input size.
pub const MAX_INPUT_BYTES: u64 = 32 * 1024 * 1024;

// ----------------------------- Public types -----------------------------

/// A budget as handed to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub params: BudgetParams,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleInput>,
}

/// What normalization did to the rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub rows: usize,
    pub skipped_without_id: usize,
    pub defaulted_level: usize,
    pub defaulted_order: usize,
    /// Explicit parent links that are not valid ids; kept as unresolvable links.
    #[serde(default)]
    pub invalid_parent: usize,
}

#[derive(Debug, Clone)]
pub struct LoadedBudget {
    pub document: BudgetDocument,
    pub report: LoadReport,
    /// SHA-256 of the canonicalized input document.
    pub input_sha256: String,
}

// ----------------------------- Wire-facing rows -----------------------------

#[derive(Debug, Default, Deserialize)]
struct RawDocument {
    #[serde(default, alias = "budgetId")]
    budget_id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    params: Option<RawParams>,
    #[serde(default)]
    schedule: Option<ScheduleInput>,
}

#[derive(Debug, Default, Deserialize)]
struct RawParams {
    #[serde(default, alias = "markupPercent", alias = "bdi")]
    markup_percent: RawNumber,
    #[serde(default, alias = "globalAdjustment")]
    adjustment: Option<GlobalAdjustment>,
    #[serde(default)]
    abc: Option<AbcThresholds>,
}

#[derive(Debug, Default, Deserialize)]
struct RawItem {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    order: RawNumber,
    #[serde(default)]
    level: RawNumber,
    #[serde(default, alias = "parentId")]
    parent_id: Option<Value>,
    #[serde(default)]
    quantity: RawNumber,
    #[serde(default, alias = "unitPrice")]
    unit_price: RawNumber,
    #[serde(default, rename = "type")]
    item_type: Option<ItemType>,
    #[serde(default)]
    description: Option<String>,
}

// ----------------------------- Entry points -----------------------------

/// Load from a local file path (size-checked before reading).
pub fn load_budget_from_path(path: &Path) -> IoResult<LoadedBudget> {
    if path.to_str().is_some_and(looks_like_url) {
        return Err(IoError::Path(format!("{}: URLs are not allowed (offline only)", path.display())));
    }
    let meta = fs::metadata(path).map_err(|e| IoError::Path(format!("{}: {e}", path.display())))?;
    if !meta.is_file() {
        return Err(IoError::Path(format!("{}: not a file", path.display())));
    }
    if meta.len() > MAX_INPUT_BYTES {
        return Err(IoError::Limit(format!(
            "{}: {} bytes exceeds {} bytes",
            path.display(),
            meta.len(),
            MAX_INPUT_BYTES
        )));
    }
    let bytes = fs::read(path).map_err(|e| IoError::Path(format!("{}: {e}", path.display())))?;
    load_budget_from_bytes(&bytes)
}

pub fn load_budget_from_bytes(bytes: &[u8]) -> IoResult<LoadedBudget> {
    parse_with_limit(bytes, MAX_INPUT_BYTES)
}

fn parse_with_limit(bytes: &[u8], limit: u64) -> IoResult<LoadedBudget> {
    if bytes.len() as u64 > limit {
        return Err(IoError::Limit(format!("input of {} bytes exceeds {limit} bytes", bytes.len())));
    }
    let value: Value = serde_json::from_slice(bytes)?;
    let input_sha256 = sha256_canonical_value(&value)?;
    let (document, report) = document_from_value(value)?;
    debug!(
        rows = report.rows,
        items = document.items.len(),
        skipped = report.skipped_without_id,
        "budget document loaded"
    );
    Ok(LoadedBudget { document, report, input_sha256 })
}

// ----------------------------- Normalization -----------------------------

fn document_from_value(mut value: Value) -> IoResult<(BudgetDocument, LoadReport)> {
    let obj = value.as_object_mut().ok_or_else(|| IoError::Json {
        pointer: "/".into(),
        msg: "budget document must be a JSON object".into(),
    })?;
    let rows = match obj.remove("items") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(rows)) => rows,
        Some(_) => {
            return Err(IoError::Json { pointer: "/items".into(), msg: "items must be an array".into() });
        }
    };

    let raw: RawDocument = serde_json::from_value(value).map_err(|e| IoError::Json {
        pointer: "/".into(),
        msg: e.to_string(),
    })?;

    let mut report = LoadReport { rows: rows.len(), ..LoadReport::default() };
    let mut items = Vec::with_capacity(rows.len());
    for (idx, row) in rows.into_iter().enumerate() {
        if !row.is_object() {
            return Err(IoError::Json { pointer: format!("/items/{idx}"), msg: "item must be an object".into() });
        }
        let raw_item: RawItem = serde_json::from_value(row).map_err(|e| IoError::Json {
            pointer: format!("/items/{idx}"),
            msg: e.to_string(),
        })?;
        if let Some(item) = normalize_item(idx, raw_item, &mut report) {
            items.push(item);
        }
    }

    let params = raw.params.map(|p| BudgetParams {
        markup_percent: p.markup_percent,
        adjustment: p.adjustment,
        abc: p.abc.unwrap_or_default(),
    });

    let document = BudgetDocument {
        budget_id: raw.budget_id.as_ref().and_then(id_text),
        name: raw.name,
        params: params.unwrap_or_default(),
        items,
        schedule: raw.schedule,
    };
    Ok((document, report))
}

fn normalize_item(idx: usize, raw: RawItem, report: &mut LoadReport) -> Option<LineItem> {
    let Some(id) = raw.id.as_ref().and_then(id_text).and_then(|s| s.parse::<ItemId>().ok()) else {
        warn!(row = idx, "item without a usable id skipped");
        report.skipped_without_id += 1;
        return None;
    };

    let level = match raw.level.value() {
        l if l >= 1.0 => l as u32,
        _ => {
            report.defaulted_level += 1;
            DEFAULT_LEVEL
        }
    };
    let order = if raw.order.is_missing() {
        report.defaulted_order += 1;
        idx as i64
    } else {
        raw.order.value() as i64
    };
    let parent_id = match raw.parent_id.as_ref().and_then(id_text) {
        None => None,
        Some(text) => match text.parse::<ItemId>() {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!(row = idx, id = %id, error = %e, "explicit parent id is not a valid id; link left unresolved");
                report.invalid_parent += 1;
                unresolved_parent(&text)
            }
        },
    };

    Some(LineItem {
        id,
        order,
        level,
        parent_id,
        quantity: raw.quantity,
        unit_price: raw.unit_price,
        item_type: raw.item_type.unwrap_or_default(),
        description: raw.description.unwrap_or_default(),
    })
}

/// Deterministic stand-in for an explicit parent that is not a valid id. The link
/// stays set, so repair leaves it alone and the item audits as an orphan.
fn unresolved_parent(raw: &str) -> Option<ItemId> {
    format!("{UNRESOLVED_PARENT_PREFIX}{}", sha256_hex(raw.as_bytes())).parse().ok()
}

/// Ids arrive as strings (UUIDs, codes) or bare numbers (row keys).
fn id_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

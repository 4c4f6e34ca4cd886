use std::fs;

use assert_json_diff::assert_json_include;
use bdg_io::prelude::*;
use serde_json::{json, Value};

const BUDGET: &str = r#"{
  "budgetId": "obra-42",
  "name": "Residência unifamiliar",
  "params": { "markupPercent": "22,5" },
  "items": [
    { "id": "S1", "level": 1, "order": 1, "type": "etapa", "description": "FUNDAÇÃO" },
    { "id": "I1", "level": 3, "order": 2, "unitPrice": "R$ 32,90", "quantity": "120", "description": "CIMENTO CP-II 50KG" },
    { "id": "I2", "order": 3, "parentId": "S1", "unitPrice": 180, "quantity": 8, "type": "labor", "description": "PEDREIRO" }
  ]
}"#;

#[test]
fn load_from_file_then_write_canonical() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("budget.json");
    fs::write(&input, BUDGET).unwrap();

    let loaded = load_budget_from_path(&input).unwrap();
    assert_eq!(loaded.document.items.len(), 3);
    assert_eq!(loaded.report.defaulted_level, 1);

    let out = dir.path().join("normalized.json");
    write_canonical_file(&out, &loaded.document).unwrap();
    let text = fs::read_to_string(&out).unwrap();
    assert!(!text.contains('\n'));

    let written: Value = serde_json::from_str(&text).unwrap();
    assert_json_include!(
        actual: written,
        expected: json!({
            "budget_id": "obra-42",
            "items": [
                { "id": "S1", "level": 1, "type": "etapa" },
                { "id": "I1", "level": 3, "unit_price": "R$ 32,90", "quantity": "120" },
                { "id": "I2", "level": 3, "parent_id": "S1", "type": "labor" }
            ]
        })
    );
}

#[test]
fn loading_twice_is_deterministic() {
    let a = load_budget_from_bytes(BUDGET.as_bytes()).unwrap();
    let b = load_budget_from_bytes(BUDGET.as_bytes()).unwrap();
    assert_eq!(a.document, b.document);
    assert_eq!(a.input_sha256, b.input_sha256);
    assert_eq!(
        to_canonical_bytes(&a.document).unwrap(),
        to_canonical_bytes(&b.document).unwrap()
    );
}

#[test]
fn missing_file_and_directory_are_path_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(load_budget_from_path(&dir.path().join("nope.json")), Err(IoError::Path(_))));
    assert!(matches!(load_budget_from_path(dir.path()), Err(IoError::Path(_))));
}

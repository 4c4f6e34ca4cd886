use std::fs;

use assert_json_diff::assert_json_include;
use serde_json::json;

use bdg_core::{AdjustmentKind, AdjustmentMode, BudgetParams, GlobalAdjustment, ItemId, ItemRole, LineItem, RawNumber};
use bdg_io::loader::BudgetDocument;
use bdg_pipeline::{
    engine_identifiers, run_document, run_from_path, verify_calculation_id, PipelineError,
};

fn id(s: &str) -> ItemId {
    s.parse().unwrap()
}

fn doc(items: Vec<LineItem>, markup: f64) -> BudgetDocument {
    BudgetDocument {
        budget_id: Some("B-1".into()),
        params: BudgetParams::with_markup(markup),
        items,
        ..BudgetDocument::default()
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn repaired_single_stage_budget() {
    let out = run_document(
        doc(
            vec![
                LineItem::new(id("I1"), 3, 2).with_cost(2.0, 100.0),
                LineItem::new(id("S1"), 1, 1),
            ],
            10.0,
        ),
        &engine_identifiers(),
    )
    .unwrap();
    let body = &out.calculation.body;
    assert!(close(body.grand_total_final, 220.0));
    assert_eq!(body.grand_total_base, 200.0);
    assert_eq!(body.items[0].id, id("S1"));
    assert_eq!(body.items[1].parent_id, Some(id("S1")));
    assert_eq!(body.items[1].role, ItemRole::Leaf);
    assert!(close(body.items[1].weight_percent, 100.0));
    assert!(body.reconciliation.is_balanced());
    assert_eq!(body.abc.len(), 1);
    assert!(body.adjustment.is_none());
    assert!(body.schedule.is_none());
    assert!(out.calculation.id.as_str().starts_with("CALC:"));
    assert_eq!(out.run_record.calculation_id, out.calculation.id);
    assert!(out.run_record.load_report.is_none());
}

#[test]
fn identical_inputs_give_identical_ids() {
    let make = || {
        doc(
            vec![
                LineItem::new(id("S1"), 1, 1),
                LineItem::new(id("I1"), 3, 2).with_cost("1.234,56", 2.0),
            ],
            0.0,
        )
    };
    let a = run_document(make(), &engine_identifiers()).unwrap();
    let b = run_document(make(), &engine_identifiers()).unwrap();
    assert_eq!(a.calculation, b.calculation);
    assert_eq!(a.run_record.id, b.run_record.id);
    assert_eq!(a.calculation.body.items[1].base_total, 2469.12);

    let c = run_document(doc(make().items, 5.0), &engine_identifiers()).unwrap();
    assert_ne!(a.calculation.id, c.calculation.id);
}

#[test]
fn orphans_surface_in_the_audit() {
    let out = run_document(
        doc(
            vec![
                LineItem::new(id("X"), 3, 0).with_cost(1.0, 50.0),
                LineItem::new(id("S1"), 1, 1),
                LineItem::new(id("I1"), 3, 2).with_cost(1.0, 100.0),
            ],
            0.0,
        ),
        &engine_identifiers(),
    )
    .unwrap();
    let body = &out.calculation.body;
    assert_eq!(body.grand_total_final, 100.0);
    assert_eq!(body.reconciliation.orphans, vec![id("X")]);
    assert_eq!(body.reconciliation.discrepancy_final, 50.0);
    let orphan = body.items.iter().find(|r| r.id == id("X")).unwrap();
    assert_eq!(orphan.base_total, 50.0);
}

#[test]
fn adjustment_block_reports_adjusted_totals() {
    let mut d = doc(
        vec![
            LineItem::new(id("S1"), 1, 1),
            LineItem::new(id("I1"), 3, 2).with_cost(10.0, 100.0).with_description("CIMENTO"),
            LineItem::new(id("I2"), 3, 3).with_cost(5.0, 200.0).with_description("PEDREIRO"),
            LineItem::new(id("I3"), 3, 4).with_cost(20.0, 50.0).with_description("AREIA"),
        ],
        20.0,
    );
    d.params.adjustment = Some(GlobalAdjustment {
        mode: AdjustmentMode::GlobalAll,
        kind: AdjustmentKind::FixedTargetTotal,
        value: RawNumber::Number(4000.0),
    });
    let out = run_document(d, &engine_identifiers()).unwrap();
    let body = &out.calculation.body;
    assert!((body.grand_total_final - 3600.0).abs() < 1e-6);
    let adj = body.adjustment.as_ref().unwrap();
    assert!((adj.totals.total_final - 4000.0).abs() < 1e-6);
    // global_all scales labor and material alike by 4000 / 3600.
    assert!((adj.totals.labor_base - 1000.0 * 4000.0 / 3600.0).abs() < 1e-6);
    assert!((adj.totals.material_base - 2000.0 * 4000.0 / 3600.0).abs() < 1e-6);
    assert!((adj.factors.labor - adj.factors.material).abs() < 1e-12);
}

#[test]
fn tampered_calculation_fails_self_verification() {
    let out = run_document(
        doc(vec![LineItem::new(id("S1"), 1, 1), LineItem::new(id("I1"), 3, 2).with_cost(1.0, 1.0)], 0.0),
        &engine_identifiers(),
    )
    .unwrap();
    let mut calc = out.calculation;
    assert!(verify_calculation_id(&calc).is_ok());
    calc.body.grand_total_final += 1.0;
    assert!(matches!(verify_calculation_id(&calc), Err(PipelineError::SelfVerify(_))));
}

#[test]
fn from_path_with_schedule_and_load_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("budget.json");
    fs::write(
        &path,
        r#"{
            "budgetId": "obra-7",
            "params": { "markupPercent": 0 },
            "items": [
                { "id": "S1", "level": 1, "order": 1 },
                { "id": "SS1", "level": 2, "order": 2 },
                { "id": "I1", "level": 3, "order": 3, "quantity": 1, "unitPrice": 600 },
                { "id": "I2", "level": 3, "order": 4, "quantity": 1, "unitPrice": 400 },
                { "level": 3, "quantity": 9, "unitPrice": 9 }
            ],
            "schedule": { "periods": [1, 2], "distributions": { "I1": { "1": 100 }, "I2": { "2": 50 } } }
        }"#,
    )
    .unwrap();

    let out = run_from_path(&path, &engine_identifiers()).unwrap();
    let calc = serde_json::to_value(&out.calculation).unwrap();
    assert_json_include!(
        actual: calc,
        expected: json!({
            "budget_id": "obra-7",
            "grand_total_final": 1000.0,
            "items": [
                { "id": "S1", "role": "stage" },
                { "id": "SS1", "parent_id": "S1", "role": "sub_stage", "final_total": 1000.0 },
                { "id": "I1", "parent_id": "SS1" },
                { "id": "I2", "parent_id": "SS1" }
            ],
            "schedule": {
                "periods": [
                    { "period": 1, "cost": 600.0, "cumulative_percent": 60.0 },
                    { "period": 2, "cost": 200.0, "cumulative_percent": 80.0 }
                ],
                "unallocated_final": 200.0
            }
        })
    );
    let report = out.run_record.load_report.as_ref().unwrap();
    assert_eq!(report.skipped_without_id, 1);
    assert_eq!(out.run_record.input_sha256.len(), 64);
}

#[test]
fn missing_input_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = run_from_path(&dir.path().join("absent.json"), &engine_identifiers()).unwrap_err();
    assert!(matches!(err, PipelineError::Io(_)));
}

#[test]
fn malformed_document_is_a_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{"items": "nope"}"#).unwrap();
    let err = run_from_path(&path, &engine_identifiers()).unwrap_err();
    assert!(matches!(err, PipelineError::Validate(_)));
}

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

const AUDIT_BUDGET: &str = r#"{
  "budgetId": "audit",
  "params": { "bdi": 20 },
  "items": [
    { "id": "S1", "level": 1, "order": 1, "description": "ESTRUTURA" },
    { "id": "I1", "level": 3, "order": 2, "quantity": 10, "unitPrice": 100, "description": "CIMENTO" },
    { "id": "I2", "level": 3, "order": 3, "quantity": 5, "unitPrice": 200, "description": "PEDREIRO", "type": "labor" },
    { "id": "I3", "level": 3, "order": 4, "quantity": 20, "unitPrice": 50, "description": "AREIA" },
    { "id": "X9", "level": 3, "order": 5, "parentId": "GONE", "quantity": 1, "unitPrice": 7 }
  ]
}"#;

fn budget() -> Command {
    Command::cargo_bin("budget").expect("bin")
}

fn write_input(dir: &Path, name: &str, body: &str) -> PathBuf {
    let p = dir.join(name);
    fs::write(&p, body).unwrap();
    p
}

fn read_json(p: &Path) -> Value {
    serde_json::from_slice(&fs::read(p).unwrap()).unwrap()
}

#[test]
fn run_writes_artifacts_and_prints_summary() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "budget.json", AUDIT_BUDGET);
    let out = dir.path().join("out");

    budget()
        .arg("--input")
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::eq("grand_total_final=3600 items=5 orphans=1\n"));

    let calc = read_json(&out.join("calculation.json"));
    let run = read_json(&out.join("run_record.json"));
    assert!(calc["id"].as_str().unwrap().starts_with("CALC:"));
    assert!(run["id"].as_str().unwrap().starts_with("RUN:"));
    assert_eq!(run["calculation_id"], calc["id"]);
    assert_eq!(calc["reconciliation"]["orphans"][0], "X9");
    assert_eq!(run["load_report"]["rows"], 5);
}

#[test]
fn repeated_runs_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "budget.json", AUDIT_BUDGET);
    let (a, b) = (dir.path().join("a"), dir.path().join("b"));
    for out in [&a, &b] {
        budget().arg("--input").arg(&input).arg("--out").arg(out).arg("--quiet").assert().success();
    }
    for name in ["calculation.json", "run_record.json"] {
        assert_eq!(fs::read(a.join(name)).unwrap(), fs::read(b.join(name)).unwrap());
    }
}

#[test]
fn quiet_suppresses_summary() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "budget.json", AUDIT_BUDGET);
    budget()
        .arg("--input")
        .arg(&input)
        .arg("--out")
        .arg(dir.path())
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    assert!(dir.path().join("calculation.json").is_file());
}

#[test]
fn markup_override_changes_totals_and_params_digest() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "budget.json", AUDIT_BUDGET);
    let (base, over) = (dir.path().join("base"), dir.path().join("over"));

    budget().arg("--input").arg(&input).arg("--out").arg(&base).arg("--quiet").assert().success();
    budget()
        .arg("--input")
        .arg(&input)
        .arg("--out")
        .arg(&over)
        .args(["--markup", "25"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("grand_total_final=3750 "));

    let (r1, r2) = (read_json(&base.join("run_record.json")), read_json(&over.join("run_record.json")));
    assert_eq!(r1["input_sha256"], r2["input_sha256"]);
    assert_ne!(r1["params_sha256"], r2["params_sha256"]);
}

#[test]
fn validate_only_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "budget.json", AUDIT_BUDGET);
    let out = dir.path().join("out");
    budget()
        .arg("--input")
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .arg("--validate-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("validate-only: rows=5 items=5"));
    assert!(!out.exists());
}

#[test]
fn malformed_document_exits_with_validation_code() {
    let dir = tempfile::tempdir().unwrap();
    for (name, body) in [("shape.json", r#"{"items": "nope"}"#), ("syntax.json", "{ not json")] {
        let input = write_input(dir.path(), name, body);
        budget()
            .arg("--input")
            .arg(&input)
            .arg("--out")
            .arg(dir.path())
            .assert()
            .code(2)
            .stderr(predicate::str::contains("budget: error"));
    }
}

#[test]
fn missing_input_and_urls_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    budget()
        .arg("--input")
        .arg(dir.path().join("absent.json"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("file not found"));
    budget()
        .args(["--input", "https://example.org/budget.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no scheme"));
}

#[test]
fn inverted_abc_thresholds_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "budget.json", AUDIT_BUDGET);
    budget()
        .arg("--input")
        .arg(&input)
        .args(["--abc-a", "90", "--abc-b", "50"])
        .assert()
        .code(2);
}

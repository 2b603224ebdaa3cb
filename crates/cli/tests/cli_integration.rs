//! CLI integration tests for the `renewal` binary.
//!
//! Uses `assert_cmd` to spawn the binary and verify exit codes, stdout
//! content, and stderr content. Fixtures are written to temp directories.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn renewal() -> Command {
    let mut cmd = cargo_bin_cmd!("renewal");
    cmd.env_remove("RENEWAL_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn fixture(state: &str) -> String {
    serde_json::json!({
        "agreements": [{
            "id": 1,
            "name": "AGR/00001",
            "state": state,
            "revision_no": 1,
            "contractor_id": 21,
            "validity_start": "2024-01-01",
            "validity_end": "2024-12-31",
            "mgq_target": 1000.0,
            "manpower_matrix": [
                { "id": 10, "designation": "Pump Operator", "headcount": 2, "base_rate": 900.0 }
            ],
            "clauses": [
                { "id": 11, "sequence": 10, "title": "Scope", "body_html": "<p>Pumping</p>" }
            ],
            "bonus_rules": []
        }]
    })
    .to_string()
}

fn snapshot_doc(mgq: f64, designation: &str) -> String {
    serde_json::json!({
        "bonus_rules": [],
        "clauses": [],
        "financial": { "mgq_target": mgq, "part_a_fixed": 0.0, "part_b_variable": 0.0 },
        "matrix": [{
            "base_rate": 900.0,
            "designation": designation,
            "employee_id": null,
            "headcount": 2,
            "remark": "part_a",
            "shift": "general",
            "vehicle_id": null
        }]
    })
    .to_string()
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    renewal()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Agreement renewal toolkit"));
}

#[test]
fn version_exits_0() {
    renewal()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("renewal"));
}

// ──────────────────────────────────────────────
// 2. Window subcommand
// ──────────────────────────────────────────────

#[test]
fn window_follows_previous_period() {
    renewal()
        .args([
            "window",
            "--start",
            "2024-01-01",
            "--end",
            "2024-12-31",
            "--today",
            "2025-01-01",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2025-01-01 → 2026-01-01"));
}

#[test]
fn window_never_starts_in_the_past() {
    renewal()
        .args([
            "--output",
            "json",
            "window",
            "--end",
            "2020-01-01",
            "--today",
            "2025-06-01",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"validity_start\": \"2025-06-01\""))
        .stdout(predicate::str::contains("\"validity_end\": \"2026-06-01\""));
}

#[test]
fn window_rejects_malformed_date() {
    renewal()
        .args(["window", "--today", "01/01/2025"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid date"));
}

// ──────────────────────────────────────────────
// 3. Diff subcommand
// ──────────────────────────────────────────────

#[test]
fn diff_identical_snapshots_reports_no_changes() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.json", &snapshot_doc(1000.0, "Driver"));
    let b = write(&dir, "b.json", &snapshot_doc(1000.0, "Driver"));
    renewal()
        .arg("diff")
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout("No material term changes detected.\n");
}

#[test]
fn diff_reports_financial_and_matrix_changes() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.json", &snapshot_doc(1000.0, "Driver"));
    let b = write(&dir, "b.json", &snapshot_doc(1500.0, "Senior Driver"));
    renewal()
        .arg("diff")
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("MGQ Target: 1000.0 → 1500.0"))
        .stdout(predicate::str::contains("Manpower matrix updated."))
        .stdout(predicate::str::contains("~ financial.mgq_target: 1500.0"));
}

#[test]
fn diff_json_output_has_summary_and_delta() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.json", &snapshot_doc(1000.0, "Driver"));
    let b = write(&dir, "b.json", &snapshot_doc(1500.0, "Driver"));
    let out = renewal()
        .args(["--output", "json", "diff"])
        .arg(&a)
        .arg(&b)
        .output()
        .unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(
        value["summary"],
        serde_json::json!(["MGQ Target: 1000.0 → 1500.0"])
    );
    assert_eq!(
        value["delta"],
        serde_json::json!({ "financial": { "mgq_target": 1500.0 } })
    );
}

#[test]
fn diff_html_escapes_digest() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.json", &snapshot_doc(1000.0, "Driver"));
    let b = write(&dir, "b.json", &snapshot_doc(1000.0, "<b>Lead</b>"));
    renewal()
        .args(["diff", "--html"])
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "<p><strong>Renewal Term Changes</strong></p>",
        ))
        .stdout(predicate::str::contains("&lt;b&gt;Lead&lt;/b&gt;"))
        .stdout(predicate::str::contains("<b>Lead</b>").not());
}

#[test]
fn diff_missing_file_exits_1() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.json", &snapshot_doc(1000.0, "Driver"));
    renewal()
        .arg("diff")
        .arg(&a)
        .arg(dir.path().join("missing.json"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error reading"));
}

#[test]
fn diff_invalid_json_reports_json_error() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.json", "{ not json");
    let b = write(&dir, "b.json", "{}");
    renewal()
        .args(["--output", "json", "diff"])
        .arg(&a)
        .arg(&b)
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"error\""));
}

// ──────────────────────────────────────────────
// 4. Renew subcommand
// ──────────────────────────────────────────────

#[test]
fn renew_active_agreement_creates_revision() {
    let dir = TempDir::new().unwrap();
    let f = write(&dir, "fixture.json", &fixture("active"));
    renewal()
        .arg("renew")
        .arg(&f)
        .args(["--source", "1", "--today", "2025-01-01", "--actor", "9"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Created AGR/00002 (id 2, Rev 2) from agreement 1",
        ))
        .stdout(predicate::str::contains("Validity: 2025-01-01 → 2026-01-01"))
        .stdout(predicate::str::contains(
            "  - No material term changes detected.",
        ));
}

#[test]
fn renew_json_output_has_outcome() {
    let dir = TempDir::new().unwrap();
    let f = write(&dir, "fixture.json", &fixture("active"));
    let out = renewal()
        .args(["--output", "json", "renew"])
        .arg(&f)
        .args(["--source", "1", "--today", "2025-01-01"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["agreement"]["state"], "draft");
    assert_eq!(value["agreement"]["revision_no"], 2);
    assert_eq!(value["agreement"]["previous_agreement_id"], 1);
    assert_eq!(value["agreement"]["validity_end"], "2026-01-01");
    assert_eq!(value["change_log"]["delta_json"], serde_json::json!({}));
    assert_eq!(value["navigation"]["view_mode"], "form");
    assert_eq!(
        value["navigation"]["context"]["default_previous_agreement_id"],
        1
    );
}

#[test]
fn renew_inactive_agreement_fails() {
    let dir = TempDir::new().unwrap();
    let f = write(&dir, "fixture.json", &fixture("draft"));
    renewal()
        .arg("renew")
        .arg(&f)
        .args(["--source", "1", "--today", "2025-01-01"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Only active agreements can be renewed.",
        ));
}

#[test]
fn renew_unknown_source_fails() {
    let dir = TempDir::new().unwrap();
    let f = write(&dir, "fixture.json", &fixture("active"));
    renewal()
        .arg("renew")
        .arg(&f)
        .args(["--source", "7", "--today", "2025-01-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("agreement 7 not found"));
}

#[test]
fn renew_with_unknown_delta_engine_fails() {
    let dir = TempDir::new().unwrap();
    let f = write(&dir, "fixture.json", &fixture("active"));
    let c = write(&dir, "renewal.toml", "[audit]\ndelta_engine = \"jsondiff\"\n");
    renewal()
        .arg("renew")
        .arg(&f)
        .args(["--source", "1", "--today", "2025-01-01", "--config"])
        .arg(&c)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "delta engine 'jsondiff' is not available",
        ));
}

#[test]
fn quiet_suppresses_errors() {
    let dir = TempDir::new().unwrap();
    let f = write(&dir, "fixture.json", &fixture("draft"));
    renewal()
        .args(["--quiet", "renew"])
        .arg(&f)
        .args(["--source", "1", "--today", "2025-01-01"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty());
}

// ──────────────────────────────────────────────
// 5. Config subcommand
// ──────────────────────────────────────────────

#[test]
fn config_prints_defaults_as_toml() {
    renewal()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[audit]"))
        .stdout(predicate::str::contains("delta_engine = \"structural\""))
        .stdout(predicate::str::contains(
            "action = \"agreement.action_agreement\"",
        ));
}

#[test]
fn config_reads_file() {
    let dir = TempDir::new().unwrap();
    let c = write(
        &dir,
        "renewal.toml",
        "[navigation]\naction = \"contracts.open\"\n",
    );
    renewal()
        .args(["--output", "json", "config"])
        .arg(&c)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"action\": \"contracts.open\""))
        .stdout(predicate::str::contains("\"delta_engine\": \"structural\""));
}

//! Conformance test suite for `AgreementStore` implementations.
//!
//! A backend-agnostic suite that any `AgreementStore` implementation can run
//! to verify the guarantees the renewal workflow relies on:
//!
//! - **Snapshot isolation**: uncommitted writes invisible, committed writes
//!   visible, aborted writes discarded
//! - **Write access**: user writes blocked on non-draft agreements, system
//!   writes allowed, links validated
//! - **Audit records**: change-log ordering and message threads
//!
//! # Usage
//!
//! ```ignore
//! use renewal_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn postgres_conformance() {
//!     let report = run_conformance_suite(|| async {
//!         create_test_postgres_store().await
//!     }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod access;
mod audit;
mod snapshot;

use std::fmt;
use std::future::Future;

use renewal_core::{AgreementState, StagedBonusRuleLine, StagedClauseLine, StagedMatrixLine};

use crate::record::{AgreementPatch, NewAgreement, WriteAccess, NEW_AGREEMENT_NAME};
use crate::AgreementStore;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "snapshot", "access").
    pub category: String,
    /// Test name (e.g. "uncommitted_agreement_invisible").
    pub name: String,
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        let (passed, message) = match result {
            Ok(()) => (true, None),
            Err(msg) => (false, Some(msg)),
        };
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed,
            message,
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a store.
///
/// The `factory` function is called once per test to create a fresh, empty
/// store, ensuring test isolation.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: AgreementStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(snapshot::run_snapshot_tests(&factory).await);
    results.extend(access::run_access_tests(&factory).await);
    results.extend(audit::run_audit_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn make_new_agreement(previous_agreement_id: Option<u64>) -> NewAgreement {
    NewAgreement {
        name: NEW_AGREEMENT_NAME.to_string(),
        revision_no: 1,
        previous_agreement_id,
        contractor_id: Some(1),
        contract_type: Some("manpower".to_string()),
        currency_id: Some(1),
        validity_start: None,
        validity_end: None,
        start_date: None,
        end_date: None,
        mgq_target: Some(1000.0),
        part_a_fixed: Some(50_000.0),
        part_b_variable: Some(20_000.0),
        manpower_matrix: vec![StagedMatrixLine::new("Driver", 21_000.0)],
        clauses: vec![StagedClauseLine::new("Scope", "<p>Supply of manpower</p>")],
        bonus_rules: vec![StagedBonusRuleLine::new(
            "Uptime",
            Default::default(),
            1.5,
        )],
    }
}

/// Create an agreement, move it to `state`, and commit.
async fn seed_agreement<S: AgreementStore>(
    s: &S,
    state: AgreementState,
) -> Result<u64, String> {
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let created = s
        .create_agreement(&mut snap, make_new_agreement(None))
        .await
        .map_err(|e| e.to_string())?;
    if state != AgreementState::Draft {
        s.write_agreement(
            &mut snap,
            created.id,
            AgreementPatch::state(state),
            WriteAccess::User,
        )
        .await
        .map_err(|e| e.to_string())?;
    }
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;
    Ok(created.id)
}

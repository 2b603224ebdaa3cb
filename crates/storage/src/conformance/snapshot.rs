//! Snapshot isolation conformance tests.
//!
//! Verifies that uncommitted writes are invisible outside a snapshot,
//! committed writes are visible, and aborted writes are discarded.

use std::future::Future;

use renewal_core::AgreementState;

use super::{make_new_agreement, seed_agreement, TestResult};
use crate::{AgreementPatch, AgreementStore, StorageError, WriteAccess};

pub(super) async fn run_snapshot_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: AgreementStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "snapshot",
            "created_agreement_is_draft_with_fresh_lines",
            created_agreement_is_draft_with_fresh_lines(factory).await,
        ),
        TestResult::from_result(
            "snapshot",
            "uncommitted_agreement_invisible",
            uncommitted_agreement_invisible(factory).await,
        ),
        TestResult::from_result(
            "snapshot",
            "uncommitted_agreement_visible_inside_snapshot",
            uncommitted_agreement_visible_inside_snapshot(factory).await,
        ),
        TestResult::from_result(
            "snapshot",
            "committed_agreement_visible",
            committed_agreement_visible(factory).await,
        ),
        TestResult::from_result(
            "snapshot",
            "abort_discards_agreement_and_links",
            abort_discards_agreement_and_links(factory).await,
        ),
        TestResult::from_result(
            "snapshot",
            "list_agreements_with_filter",
            list_agreements_with_filter(factory).await,
        ),
    ]
}

// ── 1. created_agreement_is_draft_with_fresh_lines ──────────────────────────

async fn created_agreement_is_draft_with_fresh_lines<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: AgreementStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let created = s
        .create_agreement(&mut snap, make_new_agreement(None))
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    if created.state != AgreementState::Draft {
        return Err(format!("expected draft, got '{}'", created.state.as_str()));
    }
    if created.next_agreement_id.is_some() {
        return Err("new agreement must not have a successor".to_string());
    }
    if created.manpower_matrix.len() != 1
        || created.clauses.len() != 1
        || created.bonus_rules.len() != 1
    {
        return Err("expected one line per collection".to_string());
    }
    let mut ids = vec![
        created.manpower_matrix[0].id,
        created.clauses[0].id,
        created.bonus_rules[0].id,
    ];
    ids.sort_unstable();
    ids.dedup();
    if ids.len() != 3 {
        return Err(format!("line ids must be distinct, got {:?}", ids));
    }
    Ok(())
}

// ── 2. uncommitted_agreement_invisible ──────────────────────────────────────

async fn uncommitted_agreement_invisible<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AgreementStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let created = s
        .create_agreement(&mut snap, make_new_agreement(None))
        .await
        .map_err(|e| e.to_string())?;
    // Snapshot still open.

    let result = s.get_agreement(created.id).await;
    if !matches!(result, Err(StorageError::AgreementNotFound { .. })) {
        return Err(format!(
            "expected AgreementNotFound for uncommitted agreement, got {:?}",
            result
        ));
    }
    let listed = s.list_agreements(None).await.map_err(|e| e.to_string())?;
    if !listed.is_empty() {
        return Err(format!("expected empty list, got {} agreements", listed.len()));
    }
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;
    Ok(())
}

// ── 3. uncommitted_agreement_visible_inside_snapshot ────────────────────────

async fn uncommitted_agreement_visible_inside_snapshot<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: AgreementStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let created = s
        .create_agreement(&mut snap, make_new_agreement(None))
        .await
        .map_err(|e| e.to_string())?;
    let read = s
        .get_agreement_for_update(&mut snap, created.id)
        .await
        .map_err(|e| e.to_string())?;
    if read != created {
        return Err("snapshot read differs from created agreement".to_string());
    }
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;
    Ok(())
}

// ── 4. committed_agreement_visible ──────────────────────────────────────────

async fn committed_agreement_visible<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AgreementStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let id = seed_agreement(&s, AgreementState::Active).await?;
    let read = s.get_agreement(id).await.map_err(|e| e.to_string())?;
    if read.state != AgreementState::Active {
        return Err(format!("expected active, got '{}'", read.state.as_str()));
    }
    Ok(())
}

// ── 5. abort_discards_agreement_and_links ───────────────────────────────────

async fn abort_discards_agreement_and_links<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AgreementStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let source = seed_agreement(&s, AgreementState::Active).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let renewal = s
        .create_agreement(&mut snap, make_new_agreement(Some(source)))
        .await
        .map_err(|e| e.to_string())?;
    s.write_agreement(
        &mut snap,
        source,
        AgreementPatch::next_agreement(Some(renewal.id)),
        WriteAccess::System,
    )
    .await
    .map_err(|e| e.to_string())?;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    let read = s.get_agreement(source).await.map_err(|e| e.to_string())?;
    if read.next_agreement_id.is_some() {
        return Err("aborted forward link is visible".to_string());
    }
    if s.get_agreement(renewal.id).await.is_ok() {
        return Err("aborted agreement is visible".to_string());
    }
    Ok(())
}

// ── 6. list_agreements_with_filter ──────────────────────────────────────────

async fn list_agreements_with_filter<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AgreementStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let active = seed_agreement(&s, AgreementState::Active).await?;
    seed_agreement(&s, AgreementState::Draft).await?;

    let all = s.list_agreements(None).await.map_err(|e| e.to_string())?;
    if all.len() != 2 {
        return Err(format!("expected 2 agreements, got {}", all.len()));
    }
    let filtered = s
        .list_agreements(Some(AgreementState::Active))
        .await
        .map_err(|e| e.to_string())?;
    if filtered.len() != 1 || filtered[0].id != active {
        return Err(format!(
            "expected only agreement {}, got {:?}",
            active,
            filtered.iter().map(|a| a.id).collect::<Vec<_>>()
        ));
    }
    Ok(())
}

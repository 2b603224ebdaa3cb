//! Write access conformance tests.
//!
//! User writes on agreements past the draft stage must be refused with
//! `StorageError::Locked`; system writes go through. Links to other
//! agreements must reference existing records.

use std::future::Future;

use renewal_core::{AgreementState, ManpowerTotals};

use super::{make_new_agreement, seed_agreement, TestResult};
use crate::{AgreementPatch, AgreementStore, StorageError, WriteAccess};

pub(super) async fn run_access_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: AgreementStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "access",
            "user_write_on_draft_allowed",
            user_write_on_draft_allowed(factory).await,
        ),
        TestResult::from_result(
            "access",
            "user_write_on_active_locked",
            user_write_on_active_locked(factory).await,
        ),
        TestResult::from_result(
            "access",
            "system_write_on_active_allowed",
            system_write_on_active_allowed(factory).await,
        ),
        TestResult::from_result(
            "access",
            "next_link_to_missing_agreement_rejected",
            next_link_to_missing_agreement_rejected(factory).await,
        ),
        TestResult::from_result(
            "access",
            "previous_link_to_missing_agreement_rejected",
            previous_link_to_missing_agreement_rejected(factory).await,
        ),
        TestResult::from_result(
            "access",
            "write_to_missing_agreement_rejected",
            write_to_missing_agreement_rejected(factory).await,
        ),
    ]
}

// ── 1. user_write_on_draft_allowed ──────────────────────────────────────────

async fn user_write_on_draft_allowed<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AgreementStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let id = seed_agreement(&s, AgreementState::Draft).await?;
    let totals = ManpowerTotals {
        part_a_amount: 21_000.0,
        part_b_amount: 0.0,
        total_headcount: 1,
    };

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let updated = s
        .write_agreement(
            &mut snap,
            id,
            AgreementPatch::manpower_totals(totals),
            WriteAccess::User,
        )
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    if updated.manpower_totals != totals {
        return Err(format!(
            "expected totals {:?}, got {:?}",
            totals, updated.manpower_totals
        ));
    }
    if updated.state != AgreementState::Draft {
        return Err("a totals patch must not change the lifecycle stage".to_string());
    }
    Ok(())
}

// ── 2. user_write_on_active_locked ──────────────────────────────────────────

async fn user_write_on_active_locked<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AgreementStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let source = seed_agreement(&s, AgreementState::Active).await?;
    let other = seed_agreement(&s, AgreementState::Draft).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s
        .write_agreement(
            &mut snap,
            source,
            AgreementPatch::next_agreement(Some(other)),
            WriteAccess::User,
        )
        .await;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    match result {
        Err(StorageError::Locked {
            agreement_id,
            state: AgreementState::Active,
        }) if agreement_id == source => Ok(()),
        other => Err(format!(
            "expected Locked for active agreement {}, got {:?}",
            source, other
        )),
    }
}

// ── 3. system_write_on_active_allowed ───────────────────────────────────────

async fn system_write_on_active_allowed<S, F, Fut>(factory: &F) -> Result<(), String>
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
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let read = s.get_agreement(source).await.map_err(|e| e.to_string())?;
    if read.next_agreement_id != Some(renewal.id) {
        return Err(format!(
            "expected next_agreement_id {}, got {:?}",
            renewal.id, read.next_agreement_id
        ));
    }
    if read.state != AgreementState::Active {
        return Err("system link write must not change the lifecycle stage".to_string());
    }
    let renewal = s.get_agreement(renewal.id).await.map_err(|e| e.to_string())?;
    if renewal.previous_agreement_id != Some(source) {
        return Err(format!(
            "expected previous_agreement_id {}, got {:?}",
            source, renewal.previous_agreement_id
        ));
    }
    Ok(())
}

// ── 4. next_link_to_missing_agreement_rejected ──────────────────────────────

async fn next_link_to_missing_agreement_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AgreementStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let id = seed_agreement(&s, AgreementState::Active).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s
        .write_agreement(
            &mut snap,
            id,
            AgreementPatch::next_agreement(Some(9_999)),
            WriteAccess::System,
        )
        .await;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    match result {
        Err(StorageError::AgreementNotFound { agreement_id: 9_999 }) => Ok(()),
        other => Err(format!("expected AgreementNotFound(9999), got {:?}", other)),
    }
}

// ── 5. previous_link_to_missing_agreement_rejected ──────────────────────────

async fn previous_link_to_missing_agreement_rejected<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: AgreementStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s
        .create_agreement(&mut snap, make_new_agreement(Some(9_999)))
        .await;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    match result {
        Err(StorageError::AgreementNotFound { agreement_id: 9_999 }) => Ok(()),
        other => Err(format!("expected AgreementNotFound(9999), got {:?}", other)),
    }
}

// ── 6. write_to_missing_agreement_rejected ──────────────────────────────────

async fn write_to_missing_agreement_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AgreementStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s
        .write_agreement(
            &mut snap,
            42,
            AgreementPatch::state(AgreementState::Review),
            WriteAccess::System,
        )
        .await;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    match result {
        Err(StorageError::AgreementNotFound { agreement_id: 42 }) => Ok(()),
        other => Err(format!("expected AgreementNotFound(42), got {:?}", other)),
    }
}

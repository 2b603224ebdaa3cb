//! Audit record conformance tests.
//!
//! Change-log entries list newest first; messages keep posting order and
//! may only be attached to existing agreements.

use std::future::Future;

use renewal_core::AgreementState;
use serde_json::json;
use time::{Duration, OffsetDateTime};

use super::{seed_agreement, TestResult};
use crate::{AgreementStore, MessageKind, NewChangeLogEntry, NewMessage, StorageError};

pub(super) async fn run_audit_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: AgreementStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "audit",
            "change_log_newest_first",
            change_log_newest_first(factory).await,
        ),
        TestResult::from_result(
            "audit",
            "change_log_scoped_to_agreement",
            change_log_scoped_to_agreement(factory).await,
        ),
        TestResult::from_result(
            "audit",
            "messages_in_posting_order",
            messages_in_posting_order(factory).await,
        ),
        TestResult::from_result(
            "audit",
            "message_on_missing_record_rejected",
            message_on_missing_record_rejected(factory).await,
        ),
        TestResult::from_result(
            "audit",
            "change_log_on_missing_agreement_rejected",
            change_log_on_missing_agreement_rejected(factory).await,
        ),
    ]
}

fn entry(agreement_id: u64, changed_on: OffsetDateTime, marker: u32) -> NewChangeLogEntry {
    NewChangeLogEntry {
        agreement_id,
        changed_by_id: Some(7),
        changed_on,
        delta_json: json!({ "financial": { "mgq_target": marker } }),
    }
}

fn comment(record_id: u64, body: &str) -> NewMessage {
    NewMessage {
        record_id,
        kind: MessageKind::Comment,
        subject: None,
        body: body.to_string(),
        author_id: Some(7),
        posted_at: OffsetDateTime::UNIX_EPOCH,
    }
}

// ── 1. change_log_newest_first ──────────────────────────────────────────────

async fn change_log_newest_first<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AgreementStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let id = seed_agreement(&s, AgreementState::Draft).await?;
    let t0 = OffsetDateTime::UNIX_EPOCH;
    let t1 = t0 + Duration::hours(1);

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let first = s
        .insert_change_log(&mut snap, entry(id, t0, 1))
        .await
        .map_err(|e| e.to_string())?;
    let latest = s
        .insert_change_log(&mut snap, entry(id, t1, 2))
        .await
        .map_err(|e| e.to_string())?;
    let tied = s
        .insert_change_log(&mut snap, entry(id, t0, 3))
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let listed = s.list_change_log(id).await.map_err(|e| e.to_string())?;
    let ids: Vec<u64> = listed.iter().map(|e| e.id).collect();
    let expected = vec![latest.id, tied.id, first.id];
    if ids != expected {
        return Err(format!("expected order {:?}, got {:?}", expected, ids));
    }
    if listed[0].delta_json != json!({ "financial": { "mgq_target": 2 } }) {
        return Err(format!("delta not stored verbatim: {}", listed[0].delta_json));
    }
    Ok(())
}

// ── 2. change_log_scoped_to_agreement ───────────────────────────────────────

async fn change_log_scoped_to_agreement<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AgreementStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let a = seed_agreement(&s, AgreementState::Draft).await?;
    let b = seed_agreement(&s, AgreementState::Draft).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.insert_change_log(&mut snap, entry(a, OffsetDateTime::UNIX_EPOCH, 1))
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let for_b = s.list_change_log(b).await.map_err(|e| e.to_string())?;
    if !for_b.is_empty() {
        return Err(format!("expected no entries for {}, got {}", b, for_b.len()));
    }
    Ok(())
}

// ── 3. messages_in_posting_order ────────────────────────────────────────────

async fn messages_in_posting_order<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AgreementStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let id = seed_agreement(&s, AgreementState::Active).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    for body in ["first", "second", "third"] {
        s.post_message(&mut snap, comment(id, body))
            .await
            .map_err(|e| e.to_string())?;
    }
    let mut note = comment(id, "internal");
    note.kind = MessageKind::Note;
    s.post_message(&mut snap, note)
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let listed = s.list_messages(id).await.map_err(|e| e.to_string())?;
    let bodies: Vec<&str> = listed.iter().map(|m| m.body.as_str()).collect();
    if bodies != ["first", "second", "third", "internal"] {
        return Err(format!("unexpected message order: {:?}", bodies));
    }
    if listed[3].kind != MessageKind::Note {
        return Err("message kind not preserved".to_string());
    }
    Ok(())
}

// ── 4. message_on_missing_record_rejected ───────────────────────────────────

async fn message_on_missing_record_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AgreementStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s.post_message(&mut snap, comment(404, "orphan")).await;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    match result {
        Err(StorageError::AgreementNotFound { agreement_id: 404 }) => Ok(()),
        other => Err(format!("expected AgreementNotFound(404), got {:?}", other)),
    }
}

// ── 5. change_log_on_missing_agreement_rejected ─────────────────────────────

async fn change_log_on_missing_agreement_rejected<S, F, Fut>(
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
        .insert_change_log(&mut snap, entry(404, OffsetDateTime::UNIX_EPOCH, 1))
        .await;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    match result {
        Err(StorageError::AgreementNotFound { agreement_id: 404 }) => Ok(()),
        other => Err(format!("expected AgreementNotFound(404), got {:?}", other)),
    }
}

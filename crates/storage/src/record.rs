use renewal_core::{
    AgreementState, ManpowerTotals, StagedBonusRuleLine, StagedClauseLine, StagedMatrixLine,
};
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// Placeholder name for agreements whose reference the store assigns.
pub const NEW_AGREEMENT_NAME: &str = "New";

/// Field values for an agreement about to be created.
///
/// This is the full list of fields a creator may set. Everything else
/// (identity, lifecycle stage, signature and preview fields, derived
/// totals) is owned by the store: new agreements always start as drafts
/// with those fields empty.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAgreement {
    /// Display name. Stores may replace the placeholder `"New"` with a
    /// generated reference.
    pub name: String,
    pub revision_no: u32,
    pub previous_agreement_id: Option<u64>,
    pub contractor_id: Option<u64>,
    pub contract_type: Option<String>,
    pub currency_id: Option<u64>,
    pub validity_start: Option<Date>,
    pub validity_end: Option<Date>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub mgq_target: Option<f64>,
    pub part_a_fixed: Option<f64>,
    pub part_b_variable: Option<f64>,
    pub manpower_matrix: Vec<StagedMatrixLine>,
    pub clauses: Vec<StagedClauseLine>,
    pub bonus_rules: Vec<StagedBonusRuleLine>,
}

/// A partial update of an agreement header. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgreementPatch {
    pub state: Option<AgreementState>,
    /// `Some(None)` clears the forward link.
    pub next_agreement_id: Option<Option<u64>>,
    pub manpower_totals: Option<ManpowerTotals>,
}

impl AgreementPatch {
    pub fn state(state: AgreementState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    pub fn next_agreement(next_agreement_id: Option<u64>) -> Self {
        Self {
            next_agreement_id: Some(next_agreement_id),
            ..Self::default()
        }
    }

    pub fn manpower_totals(totals: ManpowerTotals) -> Self {
        Self {
            manpower_totals: Some(totals),
            ..Self::default()
        }
    }
}

/// Write permission context for agreement updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAccess {
    /// A regular user edit, subject to the store's write lock on
    /// non-draft agreements.
    User,
    /// A system-level write that bypasses the write lock.
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Visible discussion message.
    Comment,
    /// Internal note.
    Note,
}

/// A message to post on a record's discussion thread.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub record_id: u64,
    pub kind: MessageKind,
    pub subject: Option<String>,
    pub body: String,
    pub author_id: Option<u64>,
    pub posted_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub record_id: u64,
    pub kind: MessageKind,
    pub subject: Option<String>,
    pub body: String,
    pub author_id: Option<u64>,
    #[serde(with = "time::serde::rfc3339")]
    pub posted_at: OffsetDateTime,
}

/// Change-log entry about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChangeLogEntry {
    pub agreement_id: u64,
    pub changed_by_id: Option<u64>,
    pub changed_on: OffsetDateTime,
    pub delta_json: serde_json::Value,
}

/// An immutable audit record of the term delta produced by a renewal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub id: u64,
    pub agreement_id: u64,
    pub changed_by_id: Option<u64>,
    #[serde(with = "time::serde::rfc3339")]
    pub changed_on: OffsetDateTime,
    pub delta_json: serde_json::Value,
}

impl ChangeLogEntry {
    /// Display name, e.g. `Change on 2025-01-01 09:30:00`.
    pub fn name(&self) -> String {
        let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
        match self.changed_on.format(fmt) {
            Ok(ts) => format!("Change on {}", ts),
            Err(_) => "Change Log Entry".to_string(),
        }
    }
}

/// Order change-log entries newest first: `(changed_on desc, id desc)`.
pub fn sort_newest_first(entries: &mut [ChangeLogEntry]) {
    entries.sort_by(|a, b| {
        b.changed_on
            .cmp(&a.changed_on)
            .then_with(|| b.id.cmp(&a.id))
    });
}

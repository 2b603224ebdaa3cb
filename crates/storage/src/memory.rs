//! In-memory `AgreementStore`.
//!
//! Each snapshot works on its own copy of the tables. Committing swaps the
//! copy in, provided no other snapshot committed since this one began;
//! aborting or dropping a snapshot simply discards the copy.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use renewal_core::{
    Agreement, AgreementState, BonusRuleLine, ClauseLine, ManpowerTotals, MatrixLine,
};
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::record::{
    sort_newest_first, AgreementPatch, ChangeLogEntry, Message, NewAgreement, NewChangeLogEntry,
    NewMessage, WriteAccess, NEW_AGREEMENT_NAME,
};
use crate::traits::AgreementStore;

#[derive(Debug, Clone, Default)]
struct Sequences {
    agreement: u64,
    line: u64,
    message: u64,
    change_log: u64,
}

fn next_id(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Clone, Default)]
struct Tables {
    agreements: BTreeMap<u64, Agreement>,
    messages: Vec<Message>,
    change_log: Vec<ChangeLogEntry>,
    sequences: Sequences,
}

impl Tables {
    fn agreement(&self, agreement_id: u64) -> Result<&Agreement, StorageError> {
        self.agreements
            .get(&agreement_id)
            .ok_or(StorageError::AgreementNotFound { agreement_id })
    }

    fn ensure_exists(&self, agreement_id: u64) -> Result<(), StorageError> {
        self.agreement(agreement_id).map(|_| ())
    }
}

#[derive(Debug, Default)]
struct Committed {
    tables: Tables,
    generation: u64,
}

/// Snapshot of a [`MemoryStore`]: a private copy of the tables.
#[derive(Debug)]
pub struct MemorySnapshot {
    tables: Tables,
    base_generation: u64,
}

/// Thread-safe in-memory store, for tests, fixtures and the CLI.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    committed: Arc<RwLock<Committed>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing agreements, keeping their identities.
    ///
    /// Id sequences continue after the highest seeded agreement and line ids.
    pub fn with_agreements(agreements: impl IntoIterator<Item = Agreement>) -> Self {
        let mut tables = Tables::default();
        for agreement in agreements {
            tables.sequences.agreement = tables.sequences.agreement.max(agreement.id);
            let max_line = agreement
                .manpower_matrix
                .iter()
                .map(|l| l.id)
                .chain(agreement.clauses.iter().map(|l| l.id))
                .chain(agreement.bonus_rules.iter().map(|l| l.id))
                .max()
                .unwrap_or(0);
            tables.sequences.line = tables.sequences.line.max(max_line);
            tables.agreements.insert(agreement.id, agreement);
        }
        Self {
            committed: Arc::new(RwLock::new(Committed {
                tables,
                generation: 0,
            })),
        }
    }
}

fn build_agreement(tables: &mut Tables, new: NewAgreement) -> Agreement {
    let id = next_id(&mut tables.sequences.agreement);
    let name = if new.name.is_empty() || new.name == NEW_AGREEMENT_NAME {
        format!("AGR/{:05}", id)
    } else {
        new.name
    };

    let seq = &mut tables.sequences.line;
    let manpower_matrix = new
        .manpower_matrix
        .into_iter()
        .map(|l| MatrixLine {
            id: next_id(seq),
            sequence: l.sequence,
            designation: l.designation,
            employee_id: l.employee_id,
            vehicle_id: l.vehicle_id,
            headcount: l.headcount,
            shift: l.shift,
            remark: l.remark,
            base_rate: l.base_rate,
        })
        .collect();
    let clauses = new
        .clauses
        .into_iter()
        .map(|l| ClauseLine {
            id: next_id(seq),
            sequence: l.sequence,
            title: l.title,
            body_html: l.body_html,
        })
        .collect();
    let bonus_rules = new
        .bonus_rules
        .into_iter()
        .map(|l| BonusRuleLine {
            id: next_id(seq),
            sequence: l.sequence,
            name: l.name,
            rule_type: l.rule_type,
            trigger_condition: l.trigger_condition,
            percentage: l.percentage,
            notes: l.notes,
        })
        .collect();

    Agreement {
        id,
        name,
        state: AgreementState::Draft,
        revision_no: Some(new.revision_no),
        previous_agreement_id: new.previous_agreement_id,
        next_agreement_id: None,
        contractor_id: new.contractor_id,
        contract_type: new.contract_type,
        currency_id: new.currency_id,
        validity_start: new.validity_start,
        validity_end: new.validity_end,
        start_date: new.start_date,
        end_date: new.end_date,
        mgq_target: new.mgq_target,
        part_a_fixed: new.part_a_fixed,
        part_b_variable: new.part_b_variable,
        sign_request_id: None,
        sign_state: None,
        is_agreement_signed: false,
        preview_pdf: None,
        preview_pdf_filename: None,
        preview_cache_key: None,
        manpower_totals: ManpowerTotals::default(),
        manpower_matrix,
        clauses,
        bonus_rules,
    }
}

#[async_trait]
impl AgreementStore for MemoryStore {
    type Snapshot = MemorySnapshot;

    async fn begin_snapshot(&self) -> Result<MemorySnapshot, StorageError> {
        let committed = self.committed.read().await;
        Ok(MemorySnapshot {
            tables: committed.tables.clone(),
            base_generation: committed.generation,
        })
    }

    async fn commit_snapshot(&self, snapshot: MemorySnapshot) -> Result<(), StorageError> {
        let mut committed = self.committed.write().await;
        if committed.generation != snapshot.base_generation {
            return Err(StorageError::ConcurrentConflict {
                expected_generation: snapshot.base_generation,
                actual_generation: committed.generation,
            });
        }
        committed.tables = snapshot.tables;
        committed.generation += 1;
        tracing::debug!(generation = committed.generation, "memory store committed");
        Ok(())
    }

    async fn abort_snapshot(&self, snapshot: MemorySnapshot) -> Result<(), StorageError> {
        tracing::debug!(
            base_generation = snapshot.base_generation,
            "memory store snapshot discarded"
        );
        Ok(())
    }

    async fn get_agreement_for_update(
        &self,
        snapshot: &mut MemorySnapshot,
        agreement_id: u64,
    ) -> Result<Agreement, StorageError> {
        snapshot.tables.agreement(agreement_id).cloned()
    }

    async fn create_agreement(
        &self,
        snapshot: &mut MemorySnapshot,
        agreement: NewAgreement,
    ) -> Result<Agreement, StorageError> {
        let tables = &mut snapshot.tables;
        if let Some(previous) = agreement.previous_agreement_id {
            tables.ensure_exists(previous)?;
        }
        let created = build_agreement(tables, agreement);
        tables.agreements.insert(created.id, created.clone());
        Ok(created)
    }

    async fn write_agreement(
        &self,
        snapshot: &mut MemorySnapshot,
        agreement_id: u64,
        patch: AgreementPatch,
        access: WriteAccess,
    ) -> Result<Agreement, StorageError> {
        let tables = &mut snapshot.tables;
        if let Some(Some(next)) = patch.next_agreement_id {
            tables.ensure_exists(next)?;
        }
        let agreement = tables
            .agreements
            .get_mut(&agreement_id)
            .ok_or(StorageError::AgreementNotFound { agreement_id })?;

        if access == WriteAccess::User && agreement.state != AgreementState::Draft {
            return Err(StorageError::Locked {
                agreement_id,
                state: agreement.state,
            });
        }

        if let Some(state) = patch.state {
            agreement.state = state;
        }
        if let Some(next) = patch.next_agreement_id {
            agreement.next_agreement_id = next;
        }
        if let Some(totals) = patch.manpower_totals {
            agreement.manpower_totals = totals;
        }
        Ok(agreement.clone())
    }

    async fn post_message(
        &self,
        snapshot: &mut MemorySnapshot,
        message: NewMessage,
    ) -> Result<Message, StorageError> {
        let tables = &mut snapshot.tables;
        tables.ensure_exists(message.record_id)?;
        let posted = Message {
            id: next_id(&mut tables.sequences.message),
            record_id: message.record_id,
            kind: message.kind,
            subject: message.subject,
            body: message.body,
            author_id: message.author_id,
            posted_at: message.posted_at,
        };
        tables.messages.push(posted.clone());
        Ok(posted)
    }

    async fn insert_change_log(
        &self,
        snapshot: &mut MemorySnapshot,
        entry: NewChangeLogEntry,
    ) -> Result<ChangeLogEntry, StorageError> {
        let tables = &mut snapshot.tables;
        tables.ensure_exists(entry.agreement_id)?;
        let inserted = ChangeLogEntry {
            id: next_id(&mut tables.sequences.change_log),
            agreement_id: entry.agreement_id,
            changed_by_id: entry.changed_by_id,
            changed_on: entry.changed_on,
            delta_json: entry.delta_json,
        };
        tables.change_log.push(inserted.clone());
        Ok(inserted)
    }

    async fn get_agreement(&self, agreement_id: u64) -> Result<Agreement, StorageError> {
        let committed = self.committed.read().await;
        committed.tables.agreement(agreement_id).cloned()
    }

    async fn list_agreements(
        &self,
        state_filter: Option<AgreementState>,
    ) -> Result<Vec<Agreement>, StorageError> {
        let committed = self.committed.read().await;
        Ok(committed
            .tables
            .agreements
            .values()
            .filter(|a| state_filter.map_or(true, |s| a.state == s))
            .cloned()
            .collect())
    }

    async fn list_change_log(&self, agreement_id: u64) -> Result<Vec<ChangeLogEntry>, StorageError> {
        let committed = self.committed.read().await;
        let mut entries: Vec<ChangeLogEntry> = committed
            .tables
            .change_log
            .iter()
            .filter(|e| e.agreement_id == agreement_id)
            .cloned()
            .collect();
        sort_newest_first(&mut entries);
        Ok(entries)
    }

    async fn list_messages(&self, record_id: u64) -> Result<Vec<Message>, StorageError> {
        let committed = self.committed.read().await;
        Ok(committed
            .tables
            .messages
            .iter()
            .filter(|m| m.record_id == record_id)
            .cloned()
            .collect())
    }
}

//! The renewal wizard.
//!
//! A [`RenewalWizard`] holds the transient state of one renewal: the
//! selected source agreement, the proposed validity window and editable
//! copies of the source's lines. [`RenewalService`] drives it against an
//! [`AgreementStore`]:
//!
//! 1. [`RenewalService::open`] stages a source (step `edit`) or starts empty
//!    (step `select`)
//! 2. the caller edits the staged window and lines, then calls
//!    [`RenewalWizard::review`]
//! 3. [`RenewalService::confirm`] validates, creates the new draft revision,
//!    links it to its source and records the term delta, all inside one
//!    storage snapshot
//!
//! Changing the source with [`RenewalService::select_source`] re-stages
//! everything and discards edits.

use renewal_core::{
    materialize, render_digest, snapshot, suggest_window, summary_lines, Agreement,
    AgreementState, ManpowerTotals, StagedBonusRuleLine, StagedClauseLine, StagedMatrixLine,
};
use renewal_storage::{
    AgreementPatch, AgreementStore, ChangeLogEntry, MessageKind, NewAgreement, NewChangeLogEntry,
    NewMessage, StorageError, WriteAccess, NEW_AGREEMENT_NAME,
};
use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::config::{DeltaEngine, RenewalConfig};
use crate::error::RenewalError;
use crate::navigation::{ActionResolver, NavigationDirective};

pub const SELECT_SOURCE: &str = "Select an agreement to renew.";
pub const SOURCE_NOT_ACTIVE: &str = "Only active agreements can be renewed.";
pub const ALREADY_RENEWED: &str = "This agreement has already been renewed.";
pub const WINDOW_REVERSED: &str = "The renewal end date must not precede its start date.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Select,
    Edit,
    Review,
    /// Confirmed. The wizard cannot be confirmed again.
    Done,
}

/// Transient state of one renewal.
#[derive(Debug, Clone)]
pub struct RenewalWizard {
    step: WizardStep,
    source: Option<Agreement>,
    today: Date,
    pub validity_start: Date,
    pub validity_end: Date,
    pub matrix_lines: Vec<StagedMatrixLine>,
    pub clause_lines: Vec<StagedClauseLine>,
    pub bonus_rule_lines: Vec<StagedBonusRuleLine>,
}

impl RenewalWizard {
    fn empty(today: Date) -> Self {
        Self {
            step: WizardStep::Select,
            source: None,
            today,
            validity_start: today,
            validity_end: today,
            matrix_lines: Vec::new(),
            clause_lines: Vec::new(),
            bonus_rule_lines: Vec::new(),
        }
    }

    /// Replace the source and everything staged from it.
    fn stage(&mut self, source: Option<Agreement>) {
        match source {
            Some(source) => {
                let (start, end) = suggest_window(&source, self.today);
                let lines = materialize(&source);
                tracing::debug!(
                    source_id = source.id,
                    matrix = lines.matrix.len(),
                    clauses = lines.clauses.len(),
                    bonus_rules = lines.bonus_rules.len(),
                    "staged renewal lines"
                );
                self.validity_start = start;
                self.validity_end = end;
                self.matrix_lines = lines.matrix;
                self.clause_lines = lines.clauses;
                self.bonus_rule_lines = lines.bonus_rules;
                self.source = Some(source);
                self.step = WizardStep::Edit;
            }
            None => {
                tracing::debug!("renewal source cleared");
                self.matrix_lines.clear();
                self.clause_lines.clear();
                self.bonus_rule_lines.clear();
                self.source = None;
                self.step = WizardStep::Select;
            }
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn source(&self) -> Option<&Agreement> {
        self.source.as_ref()
    }

    pub fn source_id(&self) -> Option<u64> {
        self.source.as_ref().map(|s| s.id)
    }

    /// Revision number the renewal will get.
    pub fn revision_no(&self) -> u32 {
        self.source
            .as_ref()
            .map_or(1, Agreement::revision_no)
            .saturating_add(1)
    }

    pub fn contractor_id(&self) -> Option<u64> {
        self.source.as_ref().and_then(|s| s.contractor_id)
    }

    pub fn contract_type(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.contract_type.as_deref())
    }

    pub fn currency_id(&self) -> Option<u64> {
        self.source.as_ref().and_then(|s| s.currency_id)
    }

    pub fn set_window(&mut self, start: Date, end: Date) {
        self.validity_start = start;
        self.validity_end = end;
    }

    /// Move from editing to review.
    pub fn review(&mut self) -> Result<(), RenewalError> {
        match self.step {
            WizardStep::Edit | WizardStep::Review => {
                self.step = WizardStep::Review;
                Ok(())
            }
            WizardStep::Select => Err(RenewalError::validation(SELECT_SOURCE)),
            WizardStep::Done => Err(RenewalError::validation(ALREADY_RENEWED)),
        }
    }

    /// Go back from review to editing.
    pub fn edit(&mut self) {
        if self.step == WizardStep::Review {
            self.step = WizardStep::Edit;
        }
    }

    /// Check every confirmation precondition against `source`, in order.
    fn check(&self, source: &Agreement) -> Result<(), RenewalError> {
        if source.state != AgreementState::Active {
            return Err(RenewalError::validation(SOURCE_NOT_ACTIVE));
        }
        if source.next_agreement_id.is_some() {
            return Err(RenewalError::validation(ALREADY_RENEWED));
        }
        if self.validity_end < self.validity_start {
            return Err(RenewalError::validation(WINDOW_REVERSED));
        }
        for (i, line) in self.matrix_lines.iter().enumerate() {
            if line.designation.trim().is_empty() {
                return Err(RenewalError::Validation(format!(
                    "Manpower line {}: designation is required.",
                    i + 1
                )));
            }
        }
        for (i, line) in self.clause_lines.iter().enumerate() {
            if line.title.trim().is_empty() {
                return Err(RenewalError::Validation(format!(
                    "Clause {}: title is required.",
                    i + 1
                )));
            }
        }
        for (i, line) in self.bonus_rule_lines.iter().enumerate() {
            if line.name.trim().is_empty() {
                return Err(RenewalError::Validation(format!(
                    "Bonus/Penalty rule {}: label is required.",
                    i + 1
                )));
            }
        }
        Ok(())
    }

    /// Field values of the renewal of `source`.
    fn new_agreement(&self, source: &Agreement) -> NewAgreement {
        NewAgreement {
            name: NEW_AGREEMENT_NAME.to_string(),
            revision_no: source.revision_no().saturating_add(1),
            previous_agreement_id: Some(source.id),
            contractor_id: source.contractor_id,
            contract_type: source.contract_type.clone(),
            currency_id: source.currency_id,
            validity_start: Some(self.validity_start),
            validity_end: Some(self.validity_end),
            start_date: Some(self.validity_start),
            end_date: Some(self.validity_end),
            mgq_target: source.mgq_target,
            part_a_fixed: source.part_a_fixed,
            part_b_variable: source.part_b_variable,
            manpower_matrix: self.matrix_lines.clone(),
            clauses: self.clause_lines.clone(),
            bonus_rules: self.bonus_rule_lines.clone(),
        }
    }
}

/// Everything a confirmed renewal produced.
#[derive(Debug, Clone, Serialize)]
pub struct RenewalOutcome {
    /// The new draft revision as committed.
    pub agreement: Agreement,
    pub change_log: ChangeLogEntry,
    /// Plain-text lines of the digest.
    pub summary: Vec<String>,
    /// HTML change digest, also posted as a note on the new agreement.
    pub digest: String,
    pub navigation: NavigationDirective,
}

/// Runs renewal wizards against a store.
pub struct RenewalService<S, A> {
    store: S,
    actions: A,
    config: RenewalConfig,
    engine: DeltaEngine,
}

impl<S: AgreementStore, A: ActionResolver> RenewalService<S, A> {
    /// Fails with `MissingDependency` when the configured delta engine is
    /// not available.
    pub fn new(store: S, actions: A, config: RenewalConfig) -> Result<Self, RenewalError> {
        let engine = config.delta_engine()?;
        Ok(Self {
            store,
            actions,
            config,
            engine,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RenewalConfig {
        &self.config
    }

    /// Start a wizard, staging `source_id` when it names an existing
    /// agreement.
    pub async fn open(
        &self,
        source_id: Option<u64>,
        today: Date,
    ) -> Result<RenewalWizard, RenewalError> {
        let mut wizard = RenewalWizard::empty(today);
        let Some(id) = source_id else {
            return Ok(wizard);
        };
        match self.store.get_agreement(id).await {
            Ok(source) => wizard.stage(Some(source)),
            Err(StorageError::AgreementNotFound { .. }) => {
                tracing::debug!(source_id = id, "renewal source not found");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(wizard)
    }

    /// Change the wizard's source. Staged edits are discarded.
    pub async fn select_source(
        &self,
        wizard: &mut RenewalWizard,
        source_id: Option<u64>,
    ) -> Result<(), RenewalError> {
        let source = match source_id {
            Some(id) => Some(self.store.get_agreement(id).await?),
            None => None,
        };
        wizard.stage(source);
        Ok(())
    }

    /// Create the renewal.
    ///
    /// All writes happen in one storage snapshot. If anything fails the
    /// snapshot is aborted and nothing is recorded.
    pub async fn confirm(
        &self,
        wizard: &mut RenewalWizard,
        actor_id: Option<u64>,
        now: OffsetDateTime,
    ) -> Result<RenewalOutcome, RenewalError> {
        if wizard.step == WizardStep::Done {
            return Err(RenewalError::validation(ALREADY_RENEWED));
        }
        let Some(source_id) = wizard.source_id() else {
            tracing::warn!(reason = SELECT_SOURCE, "renewal rejected");
            return Err(RenewalError::validation(SELECT_SOURCE));
        };

        let mut snap = self.store.begin_snapshot().await?;
        let result = self
            .write_renewal(&mut snap, wizard, source_id, actor_id, now)
            .await;
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                let _ = self.store.abort_snapshot(snap).await;
                if let RenewalError::Validation(reason) = &e {
                    tracing::warn!(source_id, reason = %reason, "renewal rejected");
                }
                return Err(e);
            }
        };
        self.store.commit_snapshot(snap).await?;

        tracing::info!(
            source_id,
            renewal_id = outcome.agreement.id,
            revision_no = outcome.agreement.revision_no(),
            "renewal committed"
        );
        wizard.step = WizardStep::Done;
        Ok(outcome)
    }

    async fn write_renewal(
        &self,
        snap: &mut S::Snapshot,
        wizard: &RenewalWizard,
        source_id: u64,
        actor_id: Option<u64>,
        now: OffsetDateTime,
    ) -> Result<RenewalOutcome, RenewalError> {
        let store = &self.store;

        // 1. Re-read the source and check preconditions
        let source = store.get_agreement_for_update(snap, source_id).await?;
        wizard.check(&source)?;
        let before = snapshot(&source);

        // 2. Create the draft revision with derived totals
        let created = store
            .create_agreement(snap, wizard.new_agreement(&source))
            .await?;
        let totals = ManpowerTotals::from_matrix(&created.manpower_matrix);
        let created = store
            .write_agreement(
                snap,
                created.id,
                AgreementPatch::manpower_totals(totals),
                WriteAccess::User,
            )
            .await?;

        // 3. Link the source forward; it is locked for regular writes
        store
            .write_agreement(
                snap,
                source.id,
                AgreementPatch::next_agreement(Some(created.id)),
                WriteAccess::System,
            )
            .await?;

        // 4. Chatter on both records
        store
            .post_message(
                snap,
                NewMessage {
                    record_id: source.id,
                    kind: MessageKind::Comment,
                    subject: Some("Renewal Draft Created".to_string()),
                    body: format!(
                        "Renewal draft {} (Rev {}) created.",
                        created.name,
                        created.revision_no()
                    ),
                    author_id: actor_id,
                    posted_at: now,
                },
            )
            .await?;
        store
            .post_message(
                snap,
                NewMessage {
                    record_id: created.id,
                    kind: MessageKind::Comment,
                    subject: Some("Renewal Prepared".to_string()),
                    body: format!("Duplicated from {}.", source.name),
                    author_id: actor_id,
                    posted_at: now,
                },
            )
            .await?;

        // 5. Record the term delta
        let after = snapshot(&created);
        let delta = self.engine.diff(&before, &after);
        tracing::debug!(changed = ?delta.changed_paths(), "term delta computed");
        let change_log = store
            .insert_change_log(
                snap,
                NewChangeLogEntry {
                    agreement_id: created.id,
                    changed_by_id: actor_id,
                    changed_on: now,
                    delta_json: delta.to_json(),
                },
            )
            .await?;
        let digest = render_digest(&before, &after, &delta);
        store
            .post_message(
                snap,
                NewMessage {
                    record_id: created.id,
                    kind: MessageKind::Note,
                    subject: None,
                    body: digest.clone(),
                    author_id: actor_id,
                    posted_at: now,
                },
            )
            .await?;

        let navigation = NavigationDirective::open_renewal(
            &self.actions,
            &self.config.navigation.action,
            created.id,
            source.id,
        );

        Ok(RenewalOutcome {
            agreement: created,
            change_log,
            summary: summary_lines(&before, &after),
            digest,
            navigation,
        })
    }
}

use async_trait::async_trait;
use renewal_core::{Agreement, AgreementState};

use crate::error::StorageError;
use crate::record::{
    AgreementPatch, ChangeLogEntry, Message, NewAgreement, NewChangeLogEntry, NewMessage,
    WriteAccess,
};

/// The persistence seam of the renewal workflow.
///
/// An `AgreementStore` holds agreements with their line collections, the
/// discussion messages posted on them, and the renewal change log.
///
/// ## Snapshot Semantics
///
/// All mutating operations take `&mut Self::Snapshot`, a type representing an
/// in-progress transaction. The lifecycle is:
///
/// 1. `begin_snapshot()`: start a transaction, returns a `Snapshot`
/// 2. Call mutating methods with `&mut snapshot`
/// 3. `commit_snapshot(snapshot)`: commit and consume the transaction
///    OR `abort_snapshot(snapshot)`: roll back and consume the transaction
///
/// If a `Snapshot` is dropped without committing, nothing it wrote may
/// become visible.
///
/// ## Write Lock
///
/// `write_agreement` with [`WriteAccess::User`] must fail with
/// `StorageError::Locked` when the agreement is not a draft.
/// [`WriteAccess::System`] bypasses the lock.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` so a store can be shared
/// across async tasks.
#[async_trait]
pub trait AgreementStore: Send + Sync + 'static {
    /// The snapshot (transaction) type used by this storage backend.
    type Snapshot: Send;

    // ── Snapshot lifecycle ────────────────────────────────────────────────────

    /// Begin a new snapshot (transaction).
    async fn begin_snapshot(&self) -> Result<Self::Snapshot, StorageError>;

    /// Commit a snapshot, making all mutations durable.
    async fn commit_snapshot(&self, snapshot: Self::Snapshot) -> Result<(), StorageError>;

    /// Abort (roll back) a snapshot, discarding all mutations.
    async fn abort_snapshot(&self, snapshot: Self::Snapshot) -> Result<(), StorageError>;

    // ── Agreement operations (within snapshot) ───────────────────────────────

    /// Read an agreement as seen by the snapshot, including its own
    /// uncommitted writes.
    ///
    /// Returns `Err(StorageError::AgreementNotFound)` if it does not exist.
    async fn get_agreement_for_update(
        &self,
        snapshot: &mut Self::Snapshot,
        agreement_id: u64,
    ) -> Result<Agreement, StorageError>;

    /// Create a draft agreement with fresh line identities.
    ///
    /// Returns `Err(StorageError::AgreementNotFound)` if
    /// `previous_agreement_id` does not reference an existing agreement.
    async fn create_agreement(
        &self,
        snapshot: &mut Self::Snapshot,
        agreement: NewAgreement,
    ) -> Result<Agreement, StorageError>;

    /// Apply a header patch. Returns the updated agreement.
    async fn write_agreement(
        &self,
        snapshot: &mut Self::Snapshot,
        agreement_id: u64,
        patch: AgreementPatch,
        access: WriteAccess,
    ) -> Result<Agreement, StorageError>;

    // ── Recording operations (within snapshot) ────────────────────────────────

    /// Post a message on an agreement's discussion thread.
    async fn post_message(
        &self,
        snapshot: &mut Self::Snapshot,
        message: NewMessage,
    ) -> Result<Message, StorageError>;

    /// Insert a change-log entry. Entries are never updated afterwards.
    async fn insert_change_log(
        &self,
        snapshot: &mut Self::Snapshot,
        entry: NewChangeLogEntry,
    ) -> Result<ChangeLogEntry, StorageError>;

    // ── Query operations (committed state) ────────────────────────────────────

    /// Read an agreement with its lines.
    ///
    /// Returns `Err(StorageError::AgreementNotFound)` if it does not exist.
    async fn get_agreement(&self, agreement_id: u64) -> Result<Agreement, StorageError>;

    /// List agreements ordered by id, optionally filtered by lifecycle stage.
    async fn list_agreements(
        &self,
        state_filter: Option<AgreementState>,
    ) -> Result<Vec<Agreement>, StorageError>;

    /// Change-log entries of an agreement, newest first.
    async fn list_change_log(&self, agreement_id: u64) -> Result<Vec<ChangeLogEntry>, StorageError>;

    /// Messages posted on a record, in posting order.
    async fn list_messages(&self, record_id: u64) -> Result<Vec<Message>, StorageError>;
}

use renewal_core::AgreementState;

/// All errors that can be returned by an AgreementStore implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No agreement with the given id.
    #[error("agreement not found: {agreement_id}")]
    AgreementNotFound { agreement_id: u64 },

    /// A regular write was attempted on an agreement that is no longer a
    /// draft. Only system-level writes may touch such records.
    #[error("agreement {agreement_id} is locked in state '{}'", .state.as_str())]
    Locked {
        agreement_id: u64,
        state: AgreementState,
    },

    /// Another snapshot committed after this one began.
    #[error("concurrent conflict: snapshot based on generation {expected_generation}, store is at {actual_generation}")]
    ConcurrentConflict {
        expected_generation: u64,
        actual_generation: u64,
    },

    /// A backend-specific storage error (connection, serialization, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}

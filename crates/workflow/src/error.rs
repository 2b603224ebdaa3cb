use renewal_storage::StorageError;

use crate::config::ConfigError;

/// Errors returned by the renewal workflow.
#[derive(Debug, thiserror::Error)]
pub enum RenewalError {
    /// A precondition the operator can fix. The message is shown verbatim.
    #[error("{0}")]
    Validation(String),

    /// A collaborator the workflow needs is not available.
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(ConfigError),
}

impl RenewalError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        RenewalError::Validation(message.into())
    }
}

impl From<ConfigError> for RenewalError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::MissingDependency(name) => RenewalError::MissingDependency(name),
            other => RenewalError::Config(other),
        }
    }
}

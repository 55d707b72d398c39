//! Error types for the store

use crate::config::ConfigError;
use crate::ledger::LedgerError;
use crate::persist::PersistError;
use summits_model::{Aspect, ModelError};

/// Store-level errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Graph operation failed
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Ledger call failed; local state is unchanged
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Missing permission, raised before any ledger call
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The same aspect of the same entity is already being committed
    #[error("{aspect} commit already in flight for {entity}")]
    CommitInFlight {
        /// Aim or flow
        entity: String,
        /// Aspect being committed
        aspect: Aspect,
    },

    /// Operation needs a published entity
    #[error("not published: {0}")]
    NotPublished(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Local persistence error
    #[error("persistence error: {0}")]
    Persist(#[from] PersistError),
}

impl StoreError {
    /// Check if repeating the operation later may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Ledger(LedgerError::Provider(_)) | Self::CommitInFlight { .. }
        )
    }

    /// Check if the ledger refused the operation
    #[inline]
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Ledger(LedgerError::Rejected(_)) | Self::PermissionDenied(_))
    }
}

/// Result alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(StoreError::from(LedgerError::Provider("timeout".into())).is_retryable());
        assert!(!StoreError::from(LedgerError::Rejected("no".into())).is_retryable());
        assert!(StoreError::CommitInFlight {
            entity: "aim#1".into(),
            aspect: Aspect::Data
        }
        .is_retryable());
        assert!(StoreError::PermissionDenied("x".into()).is_rejection());
    }

    #[test]
    fn messages_name_the_aspect() {
        let err = StoreError::CommitInFlight {
            entity: "aim#3".into(),
            aspect: Aspect::Members,
        };
        assert_eq!(err.to_string(), "members commit already in flight for aim#3");
    }
}

//! Error types for the entity model

use crate::ids::{AimId, FlowKey};

/// Model-level errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Malformed ledger address
    #[error("invalid address: {0:?}")]
    InvalidAddress(String),

    /// Malformed `#rrggbb` colour
    #[error("invalid color: {0:?}")]
    InvalidColor(String),

    /// No duration unit recognised
    #[error("invalid effort: {0:?}")]
    InvalidEffort(String),

    /// Aim id not in the graph
    #[error("unknown aim: {0}")]
    UnknownAim(AimId),

    /// Flow not in the graph
    #[error("unknown flow: {0}")]
    UnknownFlow(FlowKey),

    /// Flow endpoints must differ
    #[error("aim {0} cannot flow into itself")]
    SelfFlow(AimId),

    /// Flow already present
    #[error("flow already exists: {0}")]
    DuplicateFlow(FlowKey),
}

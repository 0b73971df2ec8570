//! Error types for the reconciliation engine.

use thiserror::Error;

/// Errors that can occur while applying events.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Record decode error in table '{table}' id '{id}': {reason}")]
    Decode {
        table: String,
        id: String,
        reason: String,
    },

    #[error("No pending {kind} commit for hash {hash}")]
    MissingCorrelation { kind: String, hash: String },

    #[error("Missing prerequisite {entity} '{id}': {reason}")]
    MissingPrerequisite {
        entity: String,
        id: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

impl EngineError {
    /// Returns `true` if the error is a missing-correlation (non-fatal under
    /// the default policy).
    pub fn is_missing_correlation(&self) -> bool {
        matches!(self, Self::MissingCorrelation { .. })
    }
}

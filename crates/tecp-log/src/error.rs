//! Error types for the transparency-log stage.

use std::time::Duration;
use thiserror::Error;

/// Errors a log client or the inclusion stage can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogError {
    /// The log could not be reached or refused to answer.
    #[error("log unavailable: {0}")]
    Unavailable(String),

    /// The log did not answer within the configured bound.
    #[error("log query timed out after {0:?}")]
    Timeout(Duration),

    /// The caller cancelled the query.
    #[error("log query cancelled")]
    Cancelled,

    /// The proof is malformed or does not verify.
    #[error("invalid inclusion proof: {0}")]
    InvalidProof(String),

    /// The proof refers to a root the log does not recognize.
    #[error("log root mismatch: {0}")]
    RootMismatch(String),
}

impl LogError {
    /// Whether this is a service problem rather than a problem with the proof.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            LogError::Unavailable(_) | LogError::Timeout(_) | LogError::Cancelled
        )
    }
}

/// Result type for log operations.
pub type Result<T> = std::result::Result<T, LogError>;

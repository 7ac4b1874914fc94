//! Error types for policy handling.

use thiserror::Error;

/// Errors raised while loading a catalog or running a policy runtime.
///
/// Policy violations are not errors; they are findings in a
/// [`PolicyDecision`](crate::PolicyDecision).
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("duplicate policy id: {0}")]
    DuplicatePolicy(String),

    #[error("invalid policy definition: {0}")]
    InvalidDefinition(String),

    #[error("policy runtime failed: {0}")]
    Runtime(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;

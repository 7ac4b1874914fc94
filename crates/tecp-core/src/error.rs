//! Error types for TECP core.
//!
//! Caller-input problems and internal faults are [`CoreError`]s. Problems
//! found while verifying an untrusted receipt are not errors; they are
//! reported as [`Finding`]s inside a verification result.

use thiserror::Error;

use crate::profile::Profile;
use crate::result::Finding;

/// Errors raised by signing, key handling, and encoding.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid key format: {0}")]
    KeyFormat(String),

    #[error("public key does not match private key")]
    KeyMismatch,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("nonce too short: need at least {min} bytes, got {got}")]
    NonceTooShort { min: usize, got: usize },

    #[error("profile {0} requires at least one policy id")]
    PolicyIdsRequired(Profile),

    #[error("unknown profile: {0}")]
    UnknownProfile(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Structured findings produced by the schema stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("receipt failed schema validation with {} finding(s)", .0.len())]
pub struct SchemaErrors(pub Vec<Finding>);

impl SchemaErrors {
    /// Iterate over the individual findings.
    pub fn iter(&self) -> impl Iterator<Item = &Finding> {
        self.0.iter()
    }

    pub fn into_findings(self) -> Vec<Finding> {
        self.0
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

//! Error types for the TECP facade.

use tecp_core::{CoreError, Finding};
use tecp_log::LogError;
use tecp_policy::PolicyError;
use thiserror::Error;

/// Errors that can occur during TECP operations.
///
/// Verification findings are never errors; they live in the
/// [`VerificationResult`](tecp_core::VerificationResult).
#[derive(Debug, Error)]
pub enum TecpError {
    /// Signing, encoding, or key error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Transparency-log error.
    #[error("log error: {0}")]
    Log(#[from] LogError),

    /// Policy catalog or runtime error.
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    /// The policy runtime refused the computation.
    #[error("policy runtime denied the computation: {} violation(s)", .0.len())]
    PolicyDenied(Vec<Finding>),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A signing operation was requested on an instance without a key.
    #[error("no signing key configured")]
    NoSigner,
}

/// Result type for TECP operations.
pub type Result<T> = std::result::Result<T, TecpError>;

//! # TECP
//!
//! The unified API for TECP receipts: compact, self-certifying signatures
//! over a computation's code reference, input, output, and declared
//! policies.
//!
//! ## Overview
//!
//! - **Receipts**: signed by the computation's own Ed25519 key over a
//!   deterministic CBOR encoding of eight core fields
//! - **Verification**: schema, freshness, and signature checks reported as
//!   structured findings, never as errors
//! - **Profiles**: freshness windows and policy requirements (`tecp-lite`,
//!   `tecp-v0.1`, `tecp-strict`)
//! - **Transparency logs**: optional, timeout-bounded and cancellable
//!   inclusion checks
//! - **Policies**: a runtime interface consulted before signing
//!
//! ## Usage
//!
//! ```rust
//! use tecp::{Keypair, ReceiptRequest, Tecp, TecpConfig};
//!
//! let tecp = Tecp::new(TecpConfig::default()).with_signer(Keypair::generate());
//!
//! let receipt = tecp
//!     .create_receipt(
//!         ReceiptRequest::new("git:abc123", b"hello", b"HELLO").policy("no_retention"),
//!     )
//!     .unwrap();
//!
//! let result = tecp.verify(&receipt).unwrap();
//! assert!(result.valid);
//! ```
//!
//! ## Re-exports
//!
//! - `tecp::core` - encoder, crypto, receipt model, signer, verifier
//! - `tecp::log` - transparency-log client and verification stage
//! - `tecp::policy` - policy catalog and runtime

pub mod client;
pub mod config;
pub mod error;

// Re-export component crates
pub use tecp_core as core;
pub use tecp_log as log;
pub use tecp_policy as policy;

// Re-export main types for convenience
pub use client::Tecp;
pub use config::TecpConfig;
pub use error::{Result, TecpError};

// Re-export commonly used core types
pub use tecp_core::{
    ErrorCode, Extensions, Finding, Keypair, Profile, PublicKey, Receipt, ReceiptRequest,
    ReceiptSigner, ReceiptVerifier, VerificationResult,
};

//! # TECP Log
//!
//! Transparency-log support for TECP receipts.
//!
//! ## Overview
//!
//! A receipt may carry a `log_inclusion` extension pointing at a leaf in an
//! append-only transparency log. This crate provides:
//!
//! - [`LogClient`] - the async interface a log implementation exposes
//! - [`check_inclusion`] - one query, bounded by a timeout and a cancellation token
//! - [`verify_with_log`] - full verification including the log stage
//! - [`memory::MemoryLog`] - an in-memory log for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tecp_core::{Receipt, ReceiptVerifier};
//! use tecp_log::{memory::MemoryLog, verify_receipt_with_log, LogCheckOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! async fn example(receipt: &Receipt) {
//!     let log = MemoryLog::new();
//!     let result = verify_receipt_with_log(
//!         &ReceiptVerifier::default(),
//!         &log,
//!         receipt,
//!         LogCheckOptions::default(),
//!         &CancellationToken::new(),
//!     )
//!     .await
//!     .unwrap();
//!     println!("valid: {}", result.valid);
//! }
//! ```

pub mod client;
pub mod error;
pub mod stage;

pub use client::{memory, InclusionResponse, LogClient};
pub use error::{LogError, Result};
pub use stage::{
    apply_outcome, check_inclusion, inclusion_proof, verify_receipt_with_log, verify_with_log,
    InclusionOutcome, LogCheckOptions, DEFAULT_LOG_TIMEOUT,
};

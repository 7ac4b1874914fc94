//! # TECP Core
//!
//! Pure primitives for TECP receipts: canonical encoding, signing, and
//! verification.
//!
//! This crate contains no I/O and no async code. It is pure computation
//! over cryptographic data structures.
//!
//! ## Key Types
//!
//! - [`Receipt`] - A signed attestation binding code, input, output, time, and policies
//! - [`ReceiptSigner`] - Creates receipts with one Ed25519 key
//! - [`ReceiptVerifier`] - Checks schema, freshness, and signature of untrusted receipts
//! - [`Profile`] - Freshness limits and policy requirements
//! - [`VerificationResult`] - Structured findings with stable [`ErrorCode`]s
//!
//! ## Canonicalization
//!
//! The signature covers a deterministic CBOR encoding of exactly eight
//! fields. See the [`canonical`] module.

pub mod canonical;
pub mod clock;
pub mod codes;
pub mod crypto;
pub mod error;
pub mod profile;
pub mod receipt;
pub mod result;
pub mod schema;
pub mod signer;
pub mod verifier;

pub use canonical::{canonical_encode, signable_bytes};
pub use clock::now_millis;
pub use codes::ErrorCode;
pub use crypto::{Keypair, PublicKey, Sha256Hash, Signature};
pub use error::{CoreError, Result, SchemaErrors};
pub use profile::Profile;
pub use receipt::{
    Extensions, KeyErasure, LogInclusion, Receipt, SignableFields, MAX_RECEIPT_SIZE_BYTES,
    MIN_NONCE_LEN, TECP_VERSION,
};
pub use result::{
    Finding, LogStatus, Performance, SchemaStatus, SignatureStatus, TimestampStatus,
    VerificationDetails, VerificationResult,
};
pub use signer::{ReceiptRequest, ReceiptSigner};
pub use verifier::{classify_timestamp, ReceiptVerifier};

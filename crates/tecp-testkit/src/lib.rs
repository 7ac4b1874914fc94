//! # TECP Testkit
//!
//! Testing utilities for TECP receipts.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: fixed inputs with the exact signable bytes and
//!   signatures every implementation must reproduce
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Helper structs for setting up test scenarios
//!
//! ## Golden Vectors
//!
//! ```rust
//! use tecp_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, signature) in verify_all_vectors() {
//!     assert!(matches, "{name}: {signature}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use tecp_testkit::generators::{receipt_from_params, ReceiptParams};
//!
//! proptest! {
//!     #[test]
//!     fn signing_is_deterministic(params: ReceiptParams) {
//!         let r1 = receipt_from_params(&params).unwrap();
//!         let r2 = receipt_from_params(&params).unwrap();
//!         prop_assert_eq!(r1.sig(), r2.sig());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use tecp_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let receipt = fixture.make_receipt(b"input", b"output").unwrap();
//! assert_eq!(receipt.pubkey(), &fixture.public_key());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{flip_bit, init_tracing, multi_party_fixtures, TestFixture, FIXTURE_TS};
pub use generators::{receipt_from_params, ReceiptParams};
pub use vectors::{all_vectors, generate_receipt_from_vector, verify_all_vectors, GoldenVector};

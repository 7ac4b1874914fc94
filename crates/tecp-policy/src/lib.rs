//! # TECP Policy
//!
//! Policy ids declared by receipts, and the runtime that enforces them.
//!
//! A receipt only *declares* policies; verifying a receipt never evaluates
//! them. Enforcement happens before signing, in whatever runtime executed
//! the computation. This crate provides:
//!
//! - [`PolicyCatalog`] - the set of known policy definitions
//! - [`PolicyRuntime`] - the interface an enforcing runtime implements
//! - [`AllowListRuntime`] - a configurable runtime with no external engine
//!
//! ```rust
//! use serde_json::Map;
//! use tecp_policy::{AllowListRules, AllowListRuntime, PolicyCatalog, PolicyRequest, PolicyRuntime};
//!
//! let runtime = AllowListRuntime::new(PolicyCatalog::builtin(), AllowListRules::default());
//! let policy_ids = vec!["no_retention".to_string()];
//! let decision = runtime
//!     .evaluate(&PolicyRequest {
//!         policy_ids: &policy_ids,
//!         input: b"payload",
//!         environment: &Map::new(),
//!         max_duration: None,
//!     })
//!     .unwrap();
//! assert!(decision.allowed);
//! ```

pub mod catalog;
pub mod error;
pub mod runtime;

pub use catalog::{EnforcementLevel, PolicyCatalog, PolicyDefinition};
pub use error::{PolicyError, Result};
pub use runtime::{AllowListRules, AllowListRuntime, PolicyDecision, PolicyRequest, PolicyRuntime};

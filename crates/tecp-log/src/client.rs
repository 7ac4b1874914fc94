//! Transparency-log client abstraction.
//!
//! The client answers one question: is the leaf described by a receipt's
//! `log_inclusion` extension part of the log? Implementations may talk to
//! an HTTP log, a local mirror, or anything else.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tecp_core::LogInclusion;

use crate::error::Result;

/// Answer from a log about one inclusion proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionResponse {
    pub included: bool,
}

/// Client for a transparency log.
///
/// Implementations must be thread-safe (Send + Sync). They should not
/// retry internally; the caller bounds each query with a timeout.
#[async_trait]
pub trait LogClient: Send + Sync {
    /// Check whether `proof` describes a leaf included in the log.
    async fn check_inclusion(&self, proof: &LogInclusion) -> Result<InclusionResponse>;
}

/// A simple in-memory log for testing.
pub mod memory {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::RwLock;

    use crate::error::LogError;

    /// In-memory log keyed by root.
    ///
    /// Knows a set of leaf indices per root. Can be taken offline or given
    /// artificial latency to exercise the timeout path.
    pub struct MemoryLog {
        leaves: RwLock<HashMap<String, HashSet<u64>>>,
        online: AtomicBool,
        latency: Option<Duration>,
    }

    impl MemoryLog {
        pub fn new() -> Self {
            Self {
                leaves: RwLock::new(HashMap::new()),
                online: AtomicBool::new(true),
                latency: None,
            }
        }

        /// Delay every answer by `latency`.
        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = Some(latency);
            self
        }

        /// Record a leaf under a root.
        pub async fn append(&self, log_root: impl Into<String>, leaf_index: u64) {
            self.leaves
                .write()
                .await
                .entry(log_root.into())
                .or_default()
                .insert(leaf_index);
        }

        pub fn set_online(&self, online: bool) {
            self.online.store(online, Ordering::SeqCst);
        }
    }

    impl Default for MemoryLog {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl LogClient for MemoryLog {
        async fn check_inclusion(&self, proof: &LogInclusion) -> Result<InclusionResponse> {
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            if !self.online.load(Ordering::SeqCst) {
                return Err(LogError::Unavailable("memory log is offline".into()));
            }
            if proof.merkle_proof.is_empty() {
                return Err(LogError::InvalidProof("empty merkle proof".into()));
            }

            let leaves = self.leaves.read().await;
            match leaves.get(&proof.log_root) {
                Some(indices) => Ok(InclusionResponse {
                    included: indices.contains(&proof.leaf_index),
                }),
                None => Err(LogError::RootMismatch(format!(
                    "unknown root {}",
                    proof.log_root
                ))),
            }
        }
    }
}

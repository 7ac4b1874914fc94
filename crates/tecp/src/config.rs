//! Configuration for a [`Tecp`](crate::Tecp) instance.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tecp_core::Profile;
use tecp_log::{LogCheckOptions, DEFAULT_LOG_TIMEOUT};

use crate::error::{Result, TecpError};

/// Configuration for TECP signing and verification.
///
/// Every field is optional in JSON:
///
/// ```json
/// { "profile": "tecp-strict", "require_log": true, "log_timeout_ms": 2000 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TecpConfig {
    /// Freshness and policy profile used by both signer and verifier.
    pub profile: Profile,
    /// Treat log problems as verification failures.
    pub require_log: bool,
    /// Bound on a single transparency-log query.
    pub log_timeout_ms: u64,
}

impl Default for TecpConfig {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            require_log: false,
            log_timeout_ms: DEFAULT_LOG_TIMEOUT.as_millis() as u64,
        }
    }
}

impl TecpConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| TecpError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn validate(&self) -> Result<()> {
        if self.log_timeout_ms == 0 {
            return Err(TecpError::Config("log_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn log_timeout(&self) -> Duration {
        Duration::from_millis(self.log_timeout_ms)
    }

    pub fn log_options(&self) -> LogCheckOptions {
        LogCheckOptions {
            timeout: self.log_timeout(),
            require_log: self.require_log,
        }
    }
}

//! Verification profiles.
//!
//! A profile is a named bundle of freshness limits and policy requirements.
//! Signers use it for defaults and guards; verifiers use it to pick bounds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// A named verification profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Profile {
    /// Relaxed limits for development and long-lived artifacts.
    #[serde(rename = "tecp-lite")]
    Lite,
    /// The baseline protocol profile.
    #[default]
    #[serde(rename = "tecp-v0.1")]
    V01,
    /// Tight freshness and mandatory policy declarations.
    #[serde(rename = "tecp-strict")]
    Strict,
}

impl Profile {
    pub const ALL: [Profile; 3] = [Profile::Lite, Profile::V01, Profile::Strict];

    /// The profile's wire name.
    pub const fn name(self) -> &'static str {
        match self {
            Profile::Lite => "tecp-lite",
            Profile::V01 => "tecp-v0.1",
            Profile::Strict => "tecp-strict",
        }
    }

    /// Maximum accepted age of a receipt, in milliseconds.
    pub const fn max_age_ms(self) -> i64 {
        match self {
            Profile::Lite => 7 * DAY_MS,
            Profile::V01 => DAY_MS,
            Profile::Strict => HOUR_MS,
        }
    }

    /// Maximum tolerated distance into the future, in milliseconds.
    pub const fn max_skew_ms(self) -> i64 {
        match self {
            Profile::Lite => 15 * MINUTE_MS,
            Profile::V01 => 5 * MINUTE_MS,
            Profile::Strict => MINUTE_MS,
        }
    }

    /// Whether a receipt may declare no policies at all.
    pub const fn allows_empty_policy_ids(self) -> bool {
        !matches!(self, Profile::Strict)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Profile {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Profile::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| CoreError::UnknownProfile(s.to_string()))
    }
}

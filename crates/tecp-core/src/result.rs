//! Verification results and findings.
//!
//! Verifying attacker-controlled input never fails with an error. Every
//! problem is recorded as a [`Finding`] and every check reports a status.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codes::ErrorCode;
use crate::profile::Profile;

/// A single problem found during verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub code: ErrorCode,
    pub message: String,
    /// The receipt field the finding is about, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl Finding {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    /// Attach the field this finding is about.
    pub fn on(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{} [{}]: {}", self.code, field, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureStatus {
    Valid,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampStatus {
    #[serde(rename = "OK")]
    Ok,
    Skew,
    Expired,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaStatus {
    #[serde(rename = "OK")]
    Ok,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogStatus {
    #[serde(rename = "Not checked")]
    NotChecked,
    Included,
    #[serde(rename = "Not included")]
    NotIncluded,
    Missing,
    Unavailable,
}

/// Per-check status of one verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationDetails {
    pub signature: SignatureStatus,
    pub timestamp: TimestampStatus,
    pub schema: SchemaStatus,
    pub transparency_log: LogStatus,
}

impl Default for VerificationDetails {
    fn default() -> Self {
        Self {
            signature: SignatureStatus::Invalid,
            timestamp: TimestampStatus::Ok,
            schema: SchemaStatus::Ok,
            transparency_log: LogStatus::NotChecked,
        }
    }
}

/// Observability numbers; never influence validity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Performance {
    pub verification_time_us: u64,
    pub receipt_size_bytes: usize,
}

/// Outcome of verifying one receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub valid: bool,
    pub errors: Vec<Finding>,
    /// Advisory problems: malformed extensions, a failed optional log check.
    #[serde(default)]
    pub warnings: Vec<Finding>,
    pub details: VerificationDetails,
    pub profile: Profile,
    pub performance: Performance,
}

impl VerificationResult {
    /// Record an additional finding. Any finding makes the result invalid.
    pub fn push(&mut self, finding: Finding) {
        self.valid = false;
        self.errors.push(finding);
    }

    /// Record an advisory finding. Validity is unchanged.
    pub fn warn(&mut self, finding: Finding) {
        self.warnings.push(finding);
    }

    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|f| f.code == code)
    }

    /// Codes of all findings, in report order.
    pub fn codes(&self) -> Vec<ErrorCode> {
        self.errors.iter().map(|f| f.code).collect()
    }

    /// Whether the receipt is larger than the advisory size limit.
    pub fn is_oversized(&self) -> bool {
        self.performance.receipt_size_bytes > crate::receipt::MAX_RECEIPT_SIZE_BYTES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        let details = VerificationDetails::default();
        let json = serde_json::to_value(details).unwrap();
        assert_eq!(json["signature"], "Invalid");
        assert_eq!(json["timestamp"], "OK");
        assert_eq!(json["schema"], "OK");
        assert_eq!(json["transparency_log"], "Not checked");
    }

    #[test]
    fn test_push_invalidates() {
        let mut result = VerificationResult {
            valid: true,
            errors: vec![],
            warnings: vec![],
            details: VerificationDetails::default(),
            profile: Profile::default(),
            performance: Performance::default(),
        };
        result.push(Finding::new(ErrorCode::LogMissing, "no proof").on("log_inclusion"));

        assert!(!result.valid);
        assert!(result.has_code(ErrorCode::LogMissing));
        assert_eq!(result.codes(), vec![ErrorCode::LogMissing]);
        assert_eq!(
            result.errors[0].to_string(),
            "E-LOG-001 [log_inclusion]: no proof"
        );
    }

    #[test]
    fn test_warn_keeps_validity() {
        let mut result = VerificationResult {
            valid: true,
            errors: vec![],
            warnings: vec![],
            details: VerificationDetails::default(),
            profile: Profile::default(),
            performance: Performance::default(),
        };
        result.warn(Finding::new(ErrorCode::LogUnavailable, "offline").on("log_inclusion"));

        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert!(!result.has_code(ErrorCode::LogUnavailable));
        assert_eq!(result.warnings[0].code, ErrorCode::LogUnavailable);
    }
}

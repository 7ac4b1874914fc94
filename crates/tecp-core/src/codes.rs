//! Stable error codes shared by every TECP implementation.
//!
//! The string form (`E-SIG-001`, ...) is the interchange representation
//! and must never change.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A stable, cross-implementation error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCode {
    /// Signature missing, undecodable, or of the wrong length.
    SigFormat,
    /// Ed25519 verification failed.
    SigMismatch,
    /// Embedded public key is malformed.
    SigPublicKey,
    /// Timestamp missing or not an integer.
    TsFormat,
    /// Timestamp is further in the future than the profile tolerates.
    TsSkew,
    /// Receipt is older than the profile's maximum age.
    TsExpired,
    SchemaMissingField,
    SchemaInvalidType,
    SchemaInvalidFormat,
    SchemaUnknownVersion,
    LogMissing,
    LogInvalidProof,
    LogRootMismatch,
    LogUnavailable,
    PolicyUnknown,
    PolicyFailed,
    PolicyRequirements,
}

impl ErrorCode {
    /// Every code, in table order.
    pub const ALL: [ErrorCode; 17] = [
        ErrorCode::SigFormat,
        ErrorCode::SigMismatch,
        ErrorCode::SigPublicKey,
        ErrorCode::TsFormat,
        ErrorCode::TsSkew,
        ErrorCode::TsExpired,
        ErrorCode::SchemaMissingField,
        ErrorCode::SchemaInvalidType,
        ErrorCode::SchemaInvalidFormat,
        ErrorCode::SchemaUnknownVersion,
        ErrorCode::LogMissing,
        ErrorCode::LogInvalidProof,
        ErrorCode::LogRootMismatch,
        ErrorCode::LogUnavailable,
        ErrorCode::PolicyUnknown,
        ErrorCode::PolicyFailed,
        ErrorCode::PolicyRequirements,
    ];

    /// The wire form of the code.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::SigFormat => "E-SIG-001",
            ErrorCode::SigMismatch => "E-SIG-002",
            ErrorCode::SigPublicKey => "E-SIG-003",
            ErrorCode::TsFormat => "E-TS-001",
            ErrorCode::TsSkew => "E-TS-002",
            ErrorCode::TsExpired => "E-TS-003",
            ErrorCode::SchemaMissingField => "E-SCHEMA-001",
            ErrorCode::SchemaInvalidType => "E-SCHEMA-002",
            ErrorCode::SchemaInvalidFormat => "E-SCHEMA-003",
            ErrorCode::SchemaUnknownVersion => "E-SCHEMA-004",
            ErrorCode::LogMissing => "E-LOG-001",
            ErrorCode::LogInvalidProof => "E-LOG-002",
            ErrorCode::LogRootMismatch => "E-LOG-003",
            ErrorCode::LogUnavailable => "E-LOG-004",
            ErrorCode::PolicyUnknown => "E-POLICY-001",
            ErrorCode::PolicyFailed => "E-POLICY-002",
            ErrorCode::PolicyRequirements => "E-POLICY-003",
        }
    }

    /// Short human-readable meaning.
    pub const fn description(self) -> &'static str {
        match self {
            ErrorCode::SigFormat => "Invalid signature format",
            ErrorCode::SigMismatch => "Signature verification failed",
            ErrorCode::SigPublicKey => "Public key format invalid",
            ErrorCode::TsFormat => "Timestamp format invalid",
            ErrorCode::TsSkew => "Clock skew exceeded",
            ErrorCode::TsExpired => "Receipt expired",
            ErrorCode::SchemaMissingField => "Missing required field",
            ErrorCode::SchemaInvalidType => "Invalid field type",
            ErrorCode::SchemaInvalidFormat => "Invalid field format",
            ErrorCode::SchemaUnknownVersion => "Unknown receipt version",
            ErrorCode::LogMissing => "Log inclusion proof missing",
            ErrorCode::LogInvalidProof => "Log inclusion proof invalid",
            ErrorCode::LogRootMismatch => "Root hash mismatch",
            ErrorCode::LogUnavailable => "Log service unavailable",
            ErrorCode::PolicyUnknown => "Unknown policy ID",
            ErrorCode::PolicyFailed => "Policy validation failed",
            ErrorCode::PolicyRequirements => "Policy requirements not met",
        }
    }

    /// Parse the wire form.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        ErrorCode::from_code(&code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown error code: {code}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for code in ErrorCode::ALL {
            assert!(seen.insert(code.as_str()), "duplicate {code}");
        }
    }

    #[test]
    fn test_parse_roundtrip() {
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::from_code(code.as_str()), Some(code));
        }
        assert_eq!(ErrorCode::from_code("E-SIG-999"), None);
    }

    #[test]
    fn test_serde_uses_wire_form() {
        let json = serde_json::to_string(&ErrorCode::TsExpired).unwrap();
        assert_eq!(json, "\"E-TS-003\"");

        let parsed: ErrorCode = serde_json::from_str("\"E-SCHEMA-004\"").unwrap();
        assert_eq!(parsed, ErrorCode::SchemaUnknownVersion);

        assert!(serde_json::from_str::<ErrorCode>("\"E-NOPE\"").is_err());
    }
}

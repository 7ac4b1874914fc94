//! Receipt verification.
//!
//! The verifier is keyless: it checks a receipt against the public key the
//! receipt itself carries. Three checks always run, independently of each
//! other:
//!
//! 1. Schema (see [`crate::schema`])
//! 2. Timestamp freshness against the active profile
//! 3. Ed25519 signature over the re-derived canonical bytes
//!
//! A receipt is valid iff none of them produced a finding. Transparency-log
//! inclusion is checked by an async stage outside this crate; here its
//! status is always [`LogStatus::NotChecked`].

use serde_json::{Map, Value};
use std::time::Instant;

use crate::canonical::keys;
use crate::clock::now_millis;
use crate::codes::ErrorCode;
use crate::crypto::{decode_base64, PublicKey, Signature, SIGNATURE_LEN};
use crate::error::{CoreError, Result};
use crate::profile::Profile;
use crate::receipt::{Receipt, SignableFields};
use crate::result::{
    Finding, LogStatus, Performance, SchemaStatus, SignatureStatus, TimestampStatus,
    VerificationDetails, VerificationResult,
};
use crate::schema;

/// Classify a timestamp against `now` under a profile's limits.
///
/// Exactly `max_skew` ahead or exactly `max_age` behind is still fresh.
pub fn classify_timestamp(ts: i64, now: i64, profile: Profile) -> TimestampStatus {
    let (ts, now) = (i128::from(ts), i128::from(now));
    if ts > now + i128::from(profile.max_skew_ms()) {
        TimestampStatus::Skew
    } else if now - ts > i128::from(profile.max_age_ms()) {
        TimestampStatus::Expired
    } else {
        TimestampStatus::Ok
    }
}

/// Stateless receipt verifier bound to one profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReceiptVerifier {
    profile: Profile,
}

impl ReceiptVerifier {
    pub const fn new(profile: Profile) -> Self {
        Self { profile }
    }

    pub const fn profile(&self) -> Profile {
        self.profile
    }

    /// Verify a typed receipt against the current time.
    pub fn verify(&self, receipt: &Receipt) -> Result<VerificationResult> {
        self.verify_json(&receipt.to_json_value()?)
    }

    /// Verify an untrusted wire-form receipt against the current time.
    pub fn verify_json(&self, raw: &Value) -> Result<VerificationResult> {
        self.verify_json_at(raw, now_millis())
    }

    /// Verify an untrusted wire-form receipt against an explicit clock.
    ///
    /// Findings never surface as `Err`; an `Err` means an internal fault.
    pub fn verify_json_at(&self, raw: &Value, now_ms: i64) -> Result<VerificationResult> {
        let started = Instant::now();
        let mut errors = Vec::new();

        let schema = match schema::validate(raw, self.profile) {
            Ok(_) => SchemaStatus::Ok,
            Err(findings) => {
                errors.extend(findings.into_findings());
                SchemaStatus::Invalid
            }
        };
        let timestamp = self.check_timestamp(raw, now_ms, &mut errors);
        let signature = check_signature(raw, &mut errors)?;

        let receipt_size_bytes = serde_json::to_vec(raw)?.len();
        let result = VerificationResult {
            valid: errors.is_empty(),
            errors,
            warnings: schema::extension_warnings(raw),
            details: VerificationDetails {
                signature,
                timestamp,
                schema,
                transparency_log: LogStatus::NotChecked,
            },
            profile: self.profile,
            performance: Performance {
                verification_time_us: started.elapsed().as_micros() as u64,
                receipt_size_bytes,
            },
        };

        tracing::debug!(
            valid = result.valid,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            profile = %self.profile,
            "verified receipt"
        );

        Ok(result)
    }

    fn check_timestamp(
        &self,
        raw: &Value,
        now_ms: i64,
        errors: &mut Vec<Finding>,
    ) -> TimestampStatus {
        let Some(ts) = raw.get(keys::TS).and_then(Value::as_i64) else {
            errors.push(
                Finding::new(ErrorCode::TsFormat, "timestamp missing or not an integer")
                    .on(keys::TS),
            );
            return TimestampStatus::Invalid;
        };

        let status = classify_timestamp(ts, now_ms, self.profile);
        match status {
            TimestampStatus::Skew => errors.push(
                Finding::new(
                    ErrorCode::TsSkew,
                    format!(
                        "timestamp is {} ms ahead of verifier clock, limit {} ms",
                        i128::from(ts) - i128::from(now_ms),
                        self.profile.max_skew_ms()
                    ),
                )
                .on(keys::TS),
            ),
            TimestampStatus::Expired => errors.push(
                Finding::new(
                    ErrorCode::TsExpired,
                    format!(
                        "receipt is {} ms old, limit {} ms",
                        i128::from(now_ms) - i128::from(ts),
                        self.profile.max_age_ms()
                    ),
                )
                .on(keys::TS),
            ),
            TimestampStatus::Ok | TimestampStatus::Invalid => {}
        }
        status
    }
}

/// Re-derive the signed bytes from the raw receipt and check the signature.
fn check_signature(raw: &Value, errors: &mut Vec<Finding>) -> Result<SignatureStatus> {
    let Some(map) = raw.as_object() else {
        errors.push(Finding::new(ErrorCode::SigFormat, "receipt is not an object"));
        return Ok(SignatureStatus::Invalid);
    };

    let pubkey = match bytes_field(map, keys::PUBKEY)
        .and_then(|b| PublicKey::try_from(b.as_slice()).ok())
    {
        Some(pubkey) => pubkey,
        None => {
            errors.push(
                Finding::new(
                    ErrorCode::SigPublicKey,
                    "public key missing, not base64, or not 32 bytes",
                )
                .on(keys::PUBKEY),
            );
            return Ok(SignatureStatus::Invalid);
        }
    };

    let sig = match bytes_field(map, keys::SIG)
        .and_then(|b| Signature::try_from(b.as_slice()).ok())
    {
        Some(sig) => sig,
        None => {
            errors.push(
                Finding::new(
                    ErrorCode::SigFormat,
                    format!("signature missing, not base64, or not {SIGNATURE_LEN} bytes"),
                )
                .on(keys::SIG),
            );
            return Ok(SignatureStatus::Invalid);
        }
    };

    let fields = match signable_fields(map, &pubkey) {
        Ok(fields) => fields,
        Err(field) => {
            errors.push(
                Finding::new(
                    ErrorCode::SigFormat,
                    format!("signed field `{field}` cannot be extracted"),
                )
                .on(field),
            );
            return Ok(SignatureStatus::Invalid);
        }
    };

    let message = fields.canonical_bytes()?;
    match pubkey.verify(&message, &sig) {
        Ok(()) => Ok(SignatureStatus::Valid),
        Err(CoreError::InvalidPublicKey) => {
            errors.push(
                Finding::new(ErrorCode::SigPublicKey, "public key is not a valid Ed25519 point")
                    .on(keys::PUBKEY),
            );
            Ok(SignatureStatus::Invalid)
        }
        Err(_) => {
            errors.push(Finding::new(
                ErrorCode::SigMismatch,
                "signature does not match signed fields",
            ));
            Ok(SignatureStatus::Invalid)
        }
    }
}

fn bytes_field(map: &Map<String, Value>, field: &str) -> Option<Vec<u8>> {
    map.get(field)
        .and_then(Value::as_str)
        .and_then(|s| decode_base64(s).ok())
}

/// Extract the eight signed fields, or the name of the first one that
/// cannot be read.
fn signable_fields(
    map: &Map<String, Value>,
    pubkey: &PublicKey,
) -> std::result::Result<SignableFields, &'static str> {
    let text = |field: &'static str| {
        map.get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(field)
    };
    let bytes = |field: &'static str| bytes_field(map, field).ok_or(field);

    let policy_ids = map
        .get(keys::POLICY_IDS)
        .and_then(Value::as_array)
        .and_then(|items| {
            items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or(keys::POLICY_IDS)?;

    Ok(SignableFields {
        version: text(keys::VERSION)?,
        code_ref: text(keys::CODE_REF)?,
        ts: map.get(keys::TS).and_then(Value::as_i64).ok_or(keys::TS)?,
        nonce: bytes(keys::NONCE)?,
        input_hash: bytes(keys::INPUT_HASH)?,
        output_hash: bytes(keys::OUTPUT_HASH)?,
        policy_ids,
        pubkey: pubkey.as_bytes().to_vec(),
    })
}

//! Schema stage: untrusted JSON map to typed [`Receipt`].
//!
//! Runs before any cryptographic step and reports every structural problem
//! it finds rather than stopping at the first one.
//!
//! - missing required field: `E-SCHEMA-001`
//! - wrong JSON type: `E-SCHEMA-002`
//! - bad base64, wrong length, or a policy list the profile forbids: `E-SCHEMA-003`
//! - version other than [`TECP_VERSION`]: `E-SCHEMA-004`
//!
//! Only the nine core fields can fail validation. Extensions are unsigned,
//! so a malformed one is kept as an opaque value and reported by
//! [`extension_warnings`] instead.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::canonical::keys;
use crate::codes::ErrorCode;
use crate::crypto::{
    decode_base64, PublicKey, Sha256Hash, Signature, HASH_LEN, PUBLIC_KEY_LEN, SIGNATURE_LEN,
};
use crate::error::SchemaErrors;
use crate::profile::Profile;
use crate::receipt::{
    Extensions, KeyErasure, LogInclusion, Receipt, MIN_NONCE_LEN, TECP_VERSION,
};
use crate::result::Finding;

/// Required top-level fields, in wire order.
pub const REQUIRED_FIELDS: [&str; 9] = [
    keys::VERSION,
    keys::CODE_REF,
    keys::TS,
    keys::NONCE,
    keys::INPUT_HASH,
    keys::OUTPUT_HASH,
    keys::POLICY_IDS,
    keys::SIG,
    keys::PUBKEY,
];

/// Validate an untrusted receipt map under `profile`.
pub fn validate(raw: &Value, profile: Profile) -> Result<Receipt, SchemaErrors> {
    let Some(map) = raw.as_object() else {
        return Err(SchemaErrors(vec![Finding::new(
            ErrorCode::SchemaInvalidType,
            format!("receipt must be a JSON object, got {}", json_type(raw)),
        )]));
    };

    let mut findings = Vec::new();

    let version = text(map, keys::VERSION, &mut findings);
    if let Some(v) = &version {
        if v != TECP_VERSION {
            findings.push(
                Finding::new(
                    ErrorCode::SchemaUnknownVersion,
                    format!("unsupported version {v:?}, expected {TECP_VERSION:?}"),
                )
                .on(keys::VERSION),
            );
        }
    }

    let code_ref = text(map, keys::CODE_REF, &mut findings);
    let ts = integer(map, keys::TS, &mut findings);
    let nonce = nonce(map, &mut findings);
    let input_hash = fixed::<HASH_LEN>(map, keys::INPUT_HASH, &mut findings).map(Sha256Hash);
    let output_hash = fixed::<HASH_LEN>(map, keys::OUTPUT_HASH, &mut findings).map(Sha256Hash);
    let policy_ids = policy_ids(map, profile, &mut findings);
    let sig = fixed::<SIGNATURE_LEN>(map, keys::SIG, &mut findings).map(Signature);
    let pubkey = fixed::<PUBLIC_KEY_LEN>(map, keys::PUBKEY, &mut findings).map(PublicKey);
    let extensions = extensions(map);

    if !findings.is_empty() {
        return Err(SchemaErrors(findings));
    }

    match (version, code_ref, ts, nonce, input_hash, output_hash, policy_ids, sig, pubkey) {
        (
            Some(version),
            Some(code_ref),
            Some(ts),
            Some(nonce),
            Some(input_hash),
            Some(output_hash),
            Some(policy_ids),
            Some(sig),
            Some(pubkey),
        ) => Ok(Receipt {
            version,
            code_ref,
            ts,
            nonce,
            input_hash,
            output_hash,
            policy_ids,
            sig,
            pubkey,
            extensions,
        }),
        _ => Err(SchemaErrors(findings)),
    }
}

/// Look up a required field, recording `E-SCHEMA-001` if absent.
fn required<'a>(
    map: &'a Map<String, Value>,
    field: &str,
    findings: &mut Vec<Finding>,
) -> Option<&'a Value> {
    let value = map.get(field);
    if value.is_none() {
        findings.push(
            Finding::new(
                ErrorCode::SchemaMissingField,
                format!("missing required field `{field}`"),
            )
            .on(field),
        );
    }
    value
}

fn wrong_type(field: &str, expected: &str, got: &Value) -> Finding {
    Finding::new(
        ErrorCode::SchemaInvalidType,
        format!("`{field}` must be {expected}, got {}", json_type(got)),
    )
    .on(field)
}

fn text(map: &Map<String, Value>, field: &str, findings: &mut Vec<Finding>) -> Option<String> {
    match required(map, field, findings)? {
        Value::String(s) => Some(s.clone()),
        other => {
            findings.push(wrong_type(field, "a string", other));
            None
        }
    }
}

fn integer(map: &Map<String, Value>, field: &str, findings: &mut Vec<Finding>) -> Option<i64> {
    let value = required(map, field, findings)?;
    let n = value.as_i64();
    if n.is_none() {
        findings.push(wrong_type(field, "a signed 64-bit integer", value));
    }
    n
}

/// Decode a base64 string field.
fn binary(map: &Map<String, Value>, field: &str, findings: &mut Vec<Finding>) -> Option<Vec<u8>> {
    let encoded = text(map, field, findings)?;
    match decode_base64(&encoded) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            findings.push(
                Finding::new(
                    ErrorCode::SchemaInvalidFormat,
                    format!("`{field}` is not valid base64: {e}"),
                )
                .on(field),
            );
            None
        }
    }
}

fn fixed<const N: usize>(
    map: &Map<String, Value>,
    field: &str,
    findings: &mut Vec<Finding>,
) -> Option<[u8; N]> {
    let bytes = binary(map, field, findings)?;
    let len = bytes.len();
    let arr: Option<[u8; N]> = bytes.try_into().ok();
    if arr.is_none() {
        findings.push(
            Finding::new(
                ErrorCode::SchemaInvalidFormat,
                format!("`{field}` must decode to {N} bytes, got {len}"),
            )
            .on(field),
        );
    }
    arr
}

fn nonce(map: &Map<String, Value>, findings: &mut Vec<Finding>) -> Option<Vec<u8>> {
    let bytes = binary(map, keys::NONCE, findings)?;
    if bytes.len() < MIN_NONCE_LEN {
        findings.push(
            Finding::new(
                ErrorCode::SchemaInvalidFormat,
                format!(
                    "`nonce` must decode to at least {MIN_NONCE_LEN} bytes, got {}",
                    bytes.len()
                ),
            )
            .on(keys::NONCE),
        );
        return None;
    }
    Some(bytes)
}

fn policy_ids(
    map: &Map<String, Value>,
    profile: Profile,
    findings: &mut Vec<Finding>,
) -> Option<Vec<String>> {
    let items = match required(map, keys::POLICY_IDS, findings)? {
        Value::Array(items) => items,
        other => {
            findings.push(wrong_type(keys::POLICY_IDS, "an array of strings", other));
            return None;
        }
    };

    let mut ids = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match item {
            Value::String(s) => ids.push(s.clone()),
            other => {
                findings.push(wrong_type(&format!("policy_ids[{i}]"), "a string", other));
                return None;
            }
        }
    }

    if ids.is_empty() && !profile.allows_empty_policy_ids() {
        findings.push(
            Finding::new(
                ErrorCode::SchemaInvalidFormat,
                format!("profile {profile} requires at least one policy id"),
            )
            .on(keys::POLICY_IDS),
        );
        return None;
    }
    Some(ids)
}

/// Advisory findings for extensions whose shape is not the documented one.
///
/// These never affect validity.
pub fn extension_warnings(raw: &Value) -> Vec<Finding> {
    let Some(map) = raw.as_object() else {
        return Vec::new();
    };
    map.iter()
        .filter(|(key, value)| is_extension_key(key) && !value.is_null())
        .filter_map(|(key, value)| check_extension(key, value).err())
        .collect()
}

fn check_extension(key: &str, value: &Value) -> Result<(), Finding> {
    match key {
        "key_erasure" => typed::<KeyErasure>(key, value).map(drop),
        "log_inclusion" => typed::<LogInclusion>(key, value).map(drop),
        _ => object(key, value).map(drop),
    }
}

/// Collect extension maps and unknown fields. A `null` extension is absent.
fn extensions(map: &Map<String, Value>) -> Extensions {
    let mut ext = Extensions::default();

    for (key, value) in map {
        if REQUIRED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        if value.is_null() && is_extension_key(key) {
            continue;
        }
        let parsed = match key.as_str() {
            "key_erasure" => {
                typed::<KeyErasure>(key, value).map(|v| ext.key_erasure = Some(v))
            }
            "log_inclusion" => {
                typed::<LogInclusion>(key, value).map(|v| ext.log_inclusion = Some(v))
            }
            "environment" => object(key, value).map(|v| ext.environment = Some(v)),
            "anchors" => object(key, value).map(|v| ext.anchors = Some(v)),
            "ext" => object(key, value).map(|v| ext.ext = Some(v)),
            _ => {
                ext.extra.insert(key.clone(), value.clone());
                Ok(())
            }
        };
        if let Err(finding) = parsed {
            tracing::warn!(
                field = %key,
                "keeping malformed extension as opaque: {}",
                finding.message
            );
            ext.extra.insert(key.clone(), value.clone());
        }
    }
    ext
}

fn is_extension_key(key: &str) -> bool {
    matches!(
        key,
        "key_erasure" | "log_inclusion" | "environment" | "anchors" | "ext"
    )
}

fn object(field: &str, value: &Value) -> Result<Map<String, Value>, Finding> {
    match value {
        Value::Object(m) => Ok(m.clone()),
        other => Err(wrong_type(field, "an object", other)),
    }
}

fn typed<T: DeserializeOwned>(field: &str, value: &Value) -> Result<T, Finding> {
    if !value.is_object() {
        return Err(wrong_type(field, "an object", value));
    }
    serde_json::from_value(value.clone()).map_err(|e| {
        Finding::new(ErrorCode::SchemaInvalidFormat, format!("`{field}`: {e}")).on(field)
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

//! Canonical CBOR encoding for deterministic signing.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers and lengths use the smallest valid encoding
//! - Definite lengths only
//! - No floats and no tags (timestamps are i64 milliseconds)
//!
//! Signer and verifier must produce identical bytes for the same receipt
//! fields on every platform, or legitimate receipts fail verification.

use ciborium::value::{Integer, Value};

use crate::error::{CoreError, Result};
use crate::receipt::SignableFields;

/// Field names of the signed map.
pub mod keys {
    pub const VERSION: &str = "version";
    pub const CODE_REF: &str = "code_ref";
    pub const TS: &str = "ts";
    pub const NONCE: &str = "nonce";
    pub const INPUT_HASH: &str = "input_hash";
    pub const OUTPUT_HASH: &str = "output_hash";
    pub const POLICY_IDS: &str = "policy_ids";
    pub const PUBKEY: &str = "pubkey";
    pub const SIG: &str = "sig";
}

/// Encode the eight signable fields to the exact bytes that get signed.
pub fn signable_bytes(fields: &SignableFields) -> Result<Vec<u8>> {
    canonical_encode(&signable_value(fields))
}

/// Convert the signable fields to a CBOR map.
///
/// Binary fields become byte strings of the decoded bytes, never base64 text.
pub fn signable_value(fields: &SignableFields) -> Value {
    let text = |s: &str| Value::Text(s.to_string());

    Value::Map(vec![
        (text(keys::VERSION), text(&fields.version)),
        (text(keys::CODE_REF), text(&fields.code_ref)),
        (text(keys::TS), Value::Integer(fields.ts.into())),
        (text(keys::NONCE), Value::Bytes(fields.nonce.clone())),
        (text(keys::INPUT_HASH), Value::Bytes(fields.input_hash.clone())),
        (text(keys::OUTPUT_HASH), Value::Bytes(fields.output_hash.clone())),
        (
            text(keys::POLICY_IDS),
            Value::Array(fields.policy_ids.iter().map(|id| text(id)).collect()),
        ),
        (text(keys::PUBKEY), Value::Bytes(fields.pubkey.clone())),
    ])
}

/// Encode a CBOR value to canonical bytes.
///
/// Fails on floats, tags, and maps with duplicate keys.
pub fn canonical_encode(value: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value)?;
    Ok(buf)
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) -> Result<()> {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Text(s) => encode_text(buf, s),
        Value::Array(arr) => encode_array(buf, arr)?,
        Value::Map(entries) => encode_map_canonical(buf, entries)?,
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        Value::Float(_) => {
            return Err(CoreError::EncodingError(
                "floats are not allowed in canonical encoding".into(),
            ))
        }
        Value::Tag(tag, _) => {
            return Err(CoreError::EncodingError(format!(
                "tag {tag} is not allowed in canonical encoding"
            )))
        }
        _ => {
            return Err(CoreError::EncodingError(
                "unsupported CBOR value type".into(),
            ))
        }
    }
    Ok(())
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: Integer) {
    let n = i128::from(i);

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // -1 encodes as 0, -2 as 1, ...
        encode_uint(buf, 1, (-1 - n) as u64);
    }
}

/// Encode an unsigned argument with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode an array (major type 4). Element order is preserved.
fn encode_array(buf: &mut Vec<u8>, arr: &[Value]) -> Result<()> {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value_to(buf, item)?;
    }
    Ok(())
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) -> Result<()> {
    let mut pairs = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        let mut key_buf = Vec::new();
        encode_value_to(&mut key_buf, k)?;
        pairs.push((key_buf, v));
    }

    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    if pairs.windows(2).any(|w| w[0].0 == w[1].0) {
        return Err(CoreError::EncodingError("duplicate map key".into()));
    }

    encode_uint(buf, 5, pairs.len() as u64);
    for (key_bytes, value) in pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value)?;
    }
    Ok(())
}

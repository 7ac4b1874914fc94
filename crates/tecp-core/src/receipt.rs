//! Receipt: a signed attestation of one computation.
//!
//! A receipt binds a code reference, the hashes of the input and output,
//! a timestamp, a nonce, and a declared policy list under the signer's key.
//! It is immutable once created. Extensions are advisory metadata that are
//! never signed and can be replaced with [`Receipt::with_extensions`].

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

use crate::canonical::{keys, signable_bytes};
use crate::crypto::{encode_base64, PublicKey, Sha256Hash, Signature};
use crate::error::Result;

/// The protocol version tag written into every receipt.
pub const TECP_VERSION: &str = "TECP-0.1";

/// Minimum nonce length accepted from callers and verifiers.
pub const MIN_NONCE_LEN: usize = 16;

/// Nonce length generated when the caller does not supply one.
pub const DEFAULT_NONCE_LEN: usize = 16;

/// Size above which a receipt is considered oversized. Reported, not enforced.
pub const MAX_RECEIPT_SIZE_BYTES: usize = 8192;

/// Known `key_erasure` schemes.
pub const KEY_ERASURE_TEE: &str = "counter+seal@tee";
pub const KEY_ERASURE_SOFTWARE: &str = "sw-sim";

/// Top-level keys with a fixed meaning. None of them may appear in
/// [`Extensions::extra`].
pub const RESERVED_KEYS: [&str; 14] = [
    keys::VERSION,
    keys::CODE_REF,
    keys::TS,
    keys::NONCE,
    keys::INPUT_HASH,
    keys::OUTPUT_HASH,
    keys::POLICY_IDS,
    keys::SIG,
    keys::PUBKEY,
    "key_erasure",
    "environment",
    "log_inclusion",
    "anchors",
    "ext",
];

/// The eight fields covered by the signature, as raw bytes.
///
/// Lengths are not enforced here: a verifier re-extracts these from an
/// untrusted receipt and must be able to encode whatever it finds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignableFields {
    pub version: String,
    pub code_ref: String,
    pub ts: i64,
    pub nonce: Vec<u8>,
    pub input_hash: Vec<u8>,
    pub output_hash: Vec<u8>,
    pub policy_ids: Vec<String>,
    pub pubkey: Vec<u8>,
}

impl SignableFields {
    /// The canonical bytes that the signature covers.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        signable_bytes(self)
    }
}

/// Evidence that the signing key was erased after use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyErasure {
    /// One of [`KEY_ERASURE_TEE`], [`KEY_ERASURE_SOFTWARE`], or an opaque scheme.
    pub scheme: String,
    /// Base64 evidence blob, passed through untouched.
    pub evidence: String,
}

/// A transparency-log inclusion proof attached to a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogInclusion {
    pub leaf_index: u64,
    pub merkle_proof: Vec<String>,
    pub log_root: String,
}

/// Unsigned extension maps carried alongside the signed fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extensions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_erasure: Option<KeyErasure>,

    /// Execution environment, commonly `region` and `provider`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Map<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_inclusion: Option<LogInclusion>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchors: Option<Map<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<Map<String, Value>>,

    /// Unknown top-level keys, preserved as-is.
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key_erasure(mut self, key_erasure: KeyErasure) -> Self {
        self.key_erasure = Some(key_erasure);
        self
    }

    pub fn with_environment(mut self, environment: Map<String, Value>) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn with_log_inclusion(mut self, log_inclusion: LogInclusion) -> Self {
        self.log_inclusion = Some(log_inclusion);
        self
    }

    pub fn with_anchors(mut self, anchors: Map<String, Value>) -> Self {
        self.anchors = Some(anchors);
        self
    }

    pub fn with_ext(mut self, ext: Map<String, Value>) -> Self {
        self.ext = Some(ext);
        self
    }

    /// Add an unknown top-level field.
    ///
    /// Returns `false` and leaves the map unchanged if `key` is reserved.
    pub fn insert_extra(&mut self, key: impl Into<String>, value: Value) -> bool {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            return false;
        }
        self.extra.insert(key, value);
        true
    }

    /// Unknown top-level fields.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn is_empty(&self) -> bool {
        self.key_erasure.is_none()
            && self.environment.is_none()
            && self.log_inclusion.is_none()
            && self.anchors.is_none()
            && self.ext.is_none()
            && self.extra.is_empty()
    }
}

/// A signed receipt.
///
/// Core fields are private; receipts come from a signer or from the schema
/// stage, so a `Receipt` is always structurally well-formed. It is not
/// necessarily authentic: run it through a verifier for that.
#[derive(Clone, PartialEq, Serialize)]
pub struct Receipt {
    pub(crate) version: String,
    pub(crate) code_ref: String,
    pub(crate) ts: i64,
    #[serde(serialize_with = "serialize_base64")]
    pub(crate) nonce: Vec<u8>,
    pub(crate) input_hash: Sha256Hash,
    pub(crate) output_hash: Sha256Hash,
    pub(crate) policy_ids: Vec<String>,
    pub(crate) sig: Signature,
    pub(crate) pubkey: PublicKey,
    #[serde(flatten)]
    pub(crate) extensions: Extensions,
}

impl Receipt {
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn code_ref(&self) -> &str {
        &self.code_ref
    }

    /// Signer-claimed timestamp in Unix milliseconds.
    pub fn ts(&self) -> i64 {
        self.ts
    }

    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    pub fn input_hash(&self) -> &Sha256Hash {
        &self.input_hash
    }

    pub fn output_hash(&self) -> &Sha256Hash {
        &self.output_hash
    }

    /// Declared policies, in signed order.
    pub fn policy_ids(&self) -> &[String] {
        &self.policy_ids
    }

    pub fn sig(&self) -> &Signature {
        &self.sig
    }

    pub fn pubkey(&self) -> &PublicKey {
        &self.pubkey
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Return a copy of this receipt with different extensions.
    ///
    /// The signature stays valid because extensions are not signed.
    pub fn with_extensions(&self, extensions: Extensions) -> Self {
        Self {
            extensions,
            ..self.clone()
        }
    }

    /// The eight signed fields.
    pub fn signable_fields(&self) -> SignableFields {
        SignableFields {
            version: self.version.clone(),
            code_ref: self.code_ref.clone(),
            ts: self.ts,
            nonce: self.nonce.clone(),
            input_hash: self.input_hash.0.to_vec(),
            output_hash: self.output_hash.0.to_vec(),
            policy_ids: self.policy_ids.clone(),
            pubkey: self.pubkey.0.to_vec(),
        }
    }

    /// Canonical bytes covered by the signature.
    pub fn signable_bytes(&self) -> Result<Vec<u8>> {
        self.signable_fields().canonical_bytes()
    }

    /// The JSON wire form.
    pub fn to_json_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialized size of the JSON wire form.
    pub fn size_bytes(&self) -> Result<usize> {
        Ok(serde_json::to_vec(self)?.len())
    }
}

impl fmt::Debug for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receipt")
            .field("code_ref", &self.code_ref)
            .field("ts", &self.ts)
            .field("policy_ids", &self.policy_ids)
            .field("input_hash", &self.input_hash)
            .field("output_hash", &self.output_hash)
            .field("pubkey", &self.pubkey)
            .finish_non_exhaustive()
    }
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&encode_base64(bytes))
}

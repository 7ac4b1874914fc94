//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use serde_json::Value;
use std::sync::Once;

use tecp::{Keypair, Profile, PublicKey, Receipt, ReceiptRequest, ReceiptSigner, Tecp, TecpConfig};
use tecp_core::crypto::{decode_base64, encode_base64};

/// Fixed timestamp used by fixture receipts (2025-01-14T16:00:00Z).
pub const FIXTURE_TS: i64 = 1_736_870_400_000;

/// A test fixture with a keypair and a signer.
pub struct TestFixture {
    pub keypair: Keypair,
    pub profile: Profile,
}

impl TestFixture {
    /// Create a new test fixture with a random keypair.
    pub fn new() -> Self {
        Self {
            keypair: Keypair::generate(),
            profile: Profile::default(),
        }
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self {
            keypair: Keypair::from_seed(&seed),
            profile: Profile::default(),
        }
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    pub fn signer(&self) -> ReceiptSigner {
        ReceiptSigner::from_keypair(self.keypair.clone()).with_profile(self.profile)
    }

    /// A `Tecp` instance signing with this fixture's key.
    pub fn tecp(&self) -> Tecp {
        let config = TecpConfig {
            profile: self.profile,
            ..TecpConfig::default()
        };
        Tecp::new(config).with_signer(self.keypair.clone())
    }

    /// Sign a receipt over `input`/`output` at [`FIXTURE_TS`] with a fixed nonce.
    pub fn make_receipt(&self, input: &[u8], output: &[u8]) -> tecp::core::Result<Receipt> {
        self.signer().create_receipt(
            ReceiptRequest::new("git:abc123", input, output)
                .policy("no_retention")
                .timestamp(FIXTURE_TS)
                .nonce(vec![0x5a; 16]),
        )
    }

    /// Sign a receipt at the current time with a fresh nonce.
    pub fn make_fresh_receipt(&self, input: &[u8], output: &[u8]) -> tecp::core::Result<Receipt> {
        self.signer()
            .create_receipt(ReceiptRequest::new("git:abc123", input, output).policy("no_retention"))
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple test fixtures for multi-party tests.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            TestFixture::with_seed(seed)
        })
        .collect()
}

/// Flip one bit of a base64 field in a wire-form receipt.
///
/// Returns `false` when the field is absent, not base64, or empty.
pub fn flip_bit(raw: &mut Value, field: &str, byte: usize, bit: u8) -> bool {
    let Some(mut bytes) = raw
        .get(field)
        .and_then(Value::as_str)
        .and_then(|s| decode_base64(s).ok())
    else {
        return false;
    };
    if bytes.is_empty() {
        return false;
    }
    let i = byte % bytes.len();
    bytes[i] ^= 1 << (bit % 8);
    raw[field] = Value::from(encode_base64(&bytes));
    true
}

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Honors `RUST_LOG`. Safe to call from every test.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tecp::ErrorCode;

    #[test]
    fn test_fixture_receipt_verifies() {
        init_tracing();
        let fixture = TestFixture::with_seed([0x42; 32]);
        let receipt = fixture.make_fresh_receipt(b"hello", b"HELLO").unwrap();

        assert_eq!(receipt.pubkey(), &fixture.public_key());
        assert!(fixture.tecp().verify(&receipt).unwrap().valid);
    }

    #[test]
    fn test_fixture_receipts_are_deterministic() {
        let fixture = TestFixture::with_seed([0x01; 32]);
        let r1 = fixture.make_receipt(b"a", b"b").unwrap();
        let r2 = fixture.make_receipt(b"a", b"b").unwrap();
        assert_eq!(r1, r2);
        assert_eq!(r1.ts(), FIXTURE_TS);
    }

    #[test]
    fn test_flip_bit() {
        let fixture = TestFixture::with_seed([0x02; 32]);
        let mut raw = fixture.make_receipt(b"a", b"b").unwrap().to_json_value().unwrap();
        let original = raw.clone();

        assert!(flip_bit(&mut raw, "input_hash", 40, 9));
        assert_ne!(raw, original);
        assert!(!flip_bit(&mut raw, "code_ref", 0, 0));
        assert!(!flip_bit(&mut raw, "missing", 0, 0));

        let result = fixture
            .tecp()
            .verifier()
            .verify_json_at(&raw, FIXTURE_TS)
            .unwrap();
        assert_eq!(result.codes(), vec![ErrorCode::SigMismatch]);
    }

    #[test]
    fn test_multi_party() {
        let parties = multi_party_fixtures(3);

        let pks: Vec<_> = parties.iter().map(|p| p.public_key()).collect();
        assert_ne!(pks[0], pks[1]);
        assert_ne!(pks[1], pks[2]);
        assert_ne!(pks[0], pks[2]);
    }

    #[test]
    fn test_strict_fixture_requires_policies() {
        let fixture = TestFixture::with_seed([0x03; 32]).with_profile(Profile::Strict);
        let err = fixture
            .signer()
            .create_receipt(ReceiptRequest::new("git:abc123", b"", b""))
            .unwrap_err();
        assert!(matches!(err, tecp::core::CoreError::PolicyIdsRequired(Profile::Strict)));
    }
}

//! Receipt signing.
//!
//! ```rust
//! use tecp_core::{Keypair, ReceiptRequest, ReceiptSigner};
//!
//! let signer = ReceiptSigner::from_keypair(Keypair::generate());
//! let receipt = signer
//!     .create_receipt(
//!         ReceiptRequest::new("git:abc123", b"hello", b"HELLO").policy("no_retention"),
//!     )
//!     .unwrap();
//! assert_eq!(receipt.policy_ids(), ["no_retention".to_string()]);
//! ```

use rand::rngs::OsRng;
use rand::RngCore;

use crate::clock::now_millis;
use crate::crypto::{Keypair, PublicKey, Sha256Hash, Signature, SIGNATURE_LEN};
use crate::error::{CoreError, Result};
use crate::profile::Profile;
use crate::receipt::{Extensions, Receipt, DEFAULT_NONCE_LEN, MIN_NONCE_LEN, TECP_VERSION};

/// Arguments for one [`ReceiptSigner::create_receipt`] call.
///
/// Timestamp and nonce default to the wall clock and fresh OS entropy.
/// Supplying both makes signing fully deterministic.
#[derive(Debug, Clone)]
pub struct ReceiptRequest<'a> {
    code_ref: String,
    input: &'a [u8],
    output: &'a [u8],
    policy_ids: Vec<String>,
    extensions: Extensions,
    timestamp: Option<i64>,
    nonce: Option<Vec<u8>>,
}

impl<'a> ReceiptRequest<'a> {
    pub fn new(code_ref: impl Into<String>, input: &'a [u8], output: &'a [u8]) -> Self {
        Self {
            code_ref: code_ref.into(),
            input,
            output,
            policy_ids: Vec::new(),
            extensions: Extensions::default(),
            timestamp: None,
            nonce: None,
        }
    }

    /// Replace the declared policies. Order is preserved and signed.
    pub fn policy_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Append one declared policy.
    pub fn policy(mut self, id: impl Into<String>) -> Self {
        self.policy_ids.push(id.into());
        self
    }

    pub fn extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    /// Use a fixed timestamp (Unix milliseconds).
    pub fn timestamp(mut self, ts: i64) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// Use a fixed nonce. Must be at least [`MIN_NONCE_LEN`] bytes.
    pub fn nonce(mut self, nonce: impl Into<Vec<u8>>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Policies declared so far, in signing order.
    pub fn declared_policies(&self) -> &[String] {
        &self.policy_ids
    }

    pub fn input(&self) -> &'a [u8] {
        self.input
    }
}

/// Signs receipts with one Ed25519 key.
///
/// The signer holds no mutable state and can be shared across threads.
#[derive(Debug, Clone)]
pub struct ReceiptSigner {
    keypair: Keypair,
    profile: Profile,
}

impl ReceiptSigner {
    /// Create a signer from raw key bytes.
    ///
    /// Both keys must be 32 bytes and the public key must belong to the
    /// private key.
    pub fn new(private_key: &[u8], public_key: &[u8]) -> Result<Self> {
        Ok(Self::from_keypair(Keypair::from_key_bytes(
            private_key,
            public_key,
        )?))
    }

    pub fn from_keypair(keypair: Keypair) -> Self {
        Self {
            keypair,
            profile: Profile::default(),
        }
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    /// Hash the payloads, sign the eight core fields, and attach extensions.
    ///
    /// Nothing is signed unless every input is acceptable.
    pub fn create_receipt(&self, request: ReceiptRequest<'_>) -> Result<Receipt> {
        let ReceiptRequest {
            code_ref,
            input,
            output,
            policy_ids,
            extensions,
            timestamp,
            nonce,
        } = request;

        if policy_ids.is_empty() && !self.profile.allows_empty_policy_ids() {
            return Err(CoreError::PolicyIdsRequired(self.profile));
        }

        let nonce = match nonce {
            Some(nonce) if nonce.len() < MIN_NONCE_LEN => {
                return Err(CoreError::NonceTooShort {
                    min: MIN_NONCE_LEN,
                    got: nonce.len(),
                });
            }
            Some(nonce) => nonce,
            None => fresh_nonce(),
        };
        let ts = timestamp.unwrap_or_else(now_millis);

        let mut receipt = Receipt {
            version: TECP_VERSION.to_string(),
            code_ref,
            ts,
            nonce,
            input_hash: Sha256Hash::hash(input),
            output_hash: Sha256Hash::hash(output),
            policy_ids,
            sig: Signature([0u8; SIGNATURE_LEN]),
            pubkey: self.keypair.public_key(),
            extensions,
        };

        let message = receipt.signable_bytes()?;
        receipt.sig = self.keypair.sign(&message)?;

        tracing::debug!(
            code_ref = %receipt.code_ref,
            ts = receipt.ts,
            policies = receipt.policy_ids.len(),
            "signed receipt"
        );

        Ok(receipt)
    }
}

fn fresh_nonce() -> Vec<u8> {
    let mut nonce = vec![0u8; DEFAULT_NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

#[cfg(test)]
mod tests {
    use super::*;

    fn golden_signer() -> ReceiptSigner {
        ReceiptSigner::from_keypair(Keypair::from_seed(&[0x42; 32]))
    }

    fn golden_request() -> ReceiptRequest<'static> {
        ReceiptRequest::new("git:abc123", b"hello", b"HELLO")
            .policy("no_retention")
            .timestamp(1_736_870_400_000)
            .nonce((0u8..16).collect::<Vec<_>>())
    }

    #[test]
    fn test_golden_signature() {
        let receipt = golden_signer().create_receipt(golden_request()).unwrap();
        assert_eq!(
            receipt.sig().to_hex(),
            "6608e0c70addde87fe2f634775ab51e8a994527d515dd20bc53fd85aff320cf5\
             196b45279c69b95d34ea00651a0deae40ed41f8f5a55490bf3ba24d1a09f990c"
        );
        assert_eq!(receipt.signable_bytes().unwrap().len(), 230);
    }

    #[test]
    fn test_deterministic_with_fixed_inputs() {
        let signer = golden_signer();
        let r1 = signer.create_receipt(golden_request()).unwrap();
        let r2 = signer.create_receipt(golden_request()).unwrap();
        assert_eq!(r1, r2);
    }

    #[test]
    fn test_defaults_fill_nonce_and_time() {
        let before = now_millis();
        let receipt = golden_signer()
            .create_receipt(ReceiptRequest::new("c", b"", b""))
            .unwrap();
        let after = now_millis();

        assert_eq!(receipt.nonce().len(), DEFAULT_NONCE_LEN);
        assert!(receipt.ts() >= before && receipt.ts() <= after);
        assert!(receipt.policy_ids().is_empty());

        let again = golden_signer()
            .create_receipt(ReceiptRequest::new("c", b"", b""))
            .unwrap();
        assert_ne!(receipt.nonce(), again.nonce());
    }

    #[test]
    fn test_signature_verifies_against_embedded_key() {
        let receipt = golden_signer().create_receipt(golden_request()).unwrap();
        let message = receipt.signable_bytes().unwrap();
        receipt.pubkey().verify(&message, receipt.sig()).unwrap();
    }

    #[test]
    fn test_new_validates_keys() {
        let seed = [0x42u8; 32];
        let public = Keypair::from_seed(&seed).public_key();

        assert!(ReceiptSigner::new(&seed, public.as_bytes()).is_ok());
        assert!(matches!(
            ReceiptSigner::new(&seed[..16], public.as_bytes()),
            Err(CoreError::KeyFormat(_))
        ));
        assert!(matches!(
            ReceiptSigner::new(&seed, &public.as_bytes()[..31]),
            Err(CoreError::KeyFormat(_))
        ));
        assert!(matches!(
            ReceiptSigner::new(&[0x01; 32], public.as_bytes()),
            Err(CoreError::KeyMismatch)
        ));
    }

    #[test]
    fn test_short_nonce_rejected() {
        let err = golden_signer()
            .create_receipt(ReceiptRequest::new("c", b"", b"").nonce(vec![0u8; 15]))
            .unwrap_err();
        assert!(matches!(err, CoreError::NonceTooShort { min: 16, got: 15 }));
    }

    #[test]
    fn test_longer_nonce_accepted() {
        let receipt = golden_signer()
            .create_receipt(ReceiptRequest::new("c", b"", b"").nonce(vec![9u8; 24]))
            .unwrap();
        assert_eq!(receipt.nonce().len(), 24);
    }

    #[test]
    fn test_strict_profile_requires_policies() {
        let signer = golden_signer().with_profile(Profile::Strict);
        assert!(matches!(
            signer.create_receipt(ReceiptRequest::new("c", b"", b"")),
            Err(CoreError::PolicyIdsRequired(Profile::Strict))
        ));
        assert!(signer
            .create_receipt(ReceiptRequest::new("c", b"", b"").policy("no_retention"))
            .is_ok());
    }

    #[test]
    fn test_policy_order_is_signed() {
        let signer = golden_signer();
        let base = ReceiptRequest::new("c", b"i", b"o")
            .timestamp(1)
            .nonce(vec![0u8; 16]);

        let ab = signer
            .create_receipt(base.clone().policy_ids(["a", "b"]))
            .unwrap();
        let ba = signer.create_receipt(base.policy_ids(["b", "a"])).unwrap();
        assert_ne!(ab.sig(), ba.sig());
    }
}

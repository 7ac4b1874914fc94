//! Golden test vectors for deterministic verification.
//!
//! Each vector pins the exact signable bytes and signature another
//! implementation must reproduce from the same inputs.

use tecp_core::{Keypair, Receipt, ReceiptRequest, ReceiptSigner, Result};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Seed for deterministic key generation.
    pub seed: [u8; 32],
    pub code_ref: &'static str,
    pub input: &'static [u8],
    pub output: &'static [u8],
    pub policy_ids: &'static [&'static str],
    pub nonce: &'static [u8],
    pub timestamp: i64,
    /// Expected canonical signable bytes (hex).
    pub expected_message: &'static str,
    /// Expected Ed25519 signature (hex).
    pub expected_signature: &'static str,
}

const SEQUENTIAL_16: [u8; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];

const SEQUENTIAL_24: [u8; 24] = [
    0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x1b, 0x1c, 0x1d, 0x1e,
    0x1f, 0x20, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27,
];

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "hello world with one policy",
            seed: [0x42; 32],
            code_ref: "git:abc123",
            input: b"hello",
            output: b"HELLO",
            policy_ids: &["no_retention"],
            nonce: &SEQUENTIAL_16,
            timestamp: 1_736_870_400_000,
            expected_message: concat!(
                "a86274731b00000194658b1000656e6f6e636550000102030405060708090a0b0c0d0e0f",
                "667075626b657958202152f8d19b791d24453242e15f2eab6cb7cffa7b6a5ed30097960e",
                "069881db126776657273696f6e68544543502d302e3168636f64655f7265666a6769743a",
                "6162633132336a696e7075745f6861736858202cf24dba5fb0a30e26e83b2ac5b9e29e1b",
                "161e5c1fa7425e73043362938b98246a706f6c6963795f696473816c6e6f5f726574656e",
                "74696f6e6b6f75747075745f6861736858203733cd977ff8eb18b987357e22ced99f4609",
                "7f31ecb239e878ae63760e83e4d5",
            ),
            expected_signature: concat!(
                "6608e0c70addde87fe2f634775ab51e8a994527d515dd20bc53fd85aff320cf5",
                "196b45279c69b95d34ea00651a0deae40ed41f8f5a55490bf3ba24d1a09f990c",
            ),
        },
        GoldenVector {
            name: "empty payloads at the epoch",
            seed: [0x01; 32],
            code_ref: "build:empty",
            input: b"",
            output: b"",
            policy_ids: &[],
            nonce: &[0xff; 16],
            timestamp: 0,
            expected_message: concat!(
                "a862747300656e6f6e636550ffffffffffffffffffffffffffffffff667075626b657958",
                "208a88e3dd7409f195fd52db2d3cba5d72ca6709bf1d94121bf3748801b40f6f5c677665",
                "7273696f6e68544543502d302e3168636f64655f7265666b6275696c643a656d7074796a",
                "696e7075745f686173685820e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934c",
                "a495991b7852b8556a706f6c6963795f696473806b6f75747075745f686173685820e3b0",
                "c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
            ),
            expected_signature: concat!(
                "3d2db99c35126c1da1fd9a2da9bc5d62a3d2271493ae7a7d106aabe189fece81",
                "7a7ec4486e9899256f7f8248fd733154fd517aee2f7e9ae9fe459cc8207bc90b",
            ),
        },
        GoldenVector {
            name: "three policies, long nonce, pre-epoch",
            seed: [0x07; 32],
            code_ref: "oci:sha256:feed",
            input: b"in",
            output: b"out",
            policy_ids: &["ttl_60s", "no_retention", "eu_region"],
            nonce: &SEQUENTIAL_24,
            timestamp: -1,
            expected_message: concat!(
                "a862747320656e6f6e63655818101112131415161718191a1b1c1d1e1f20212223242526",
                "27667075626b65795820ea4a6c63e29c520abef5507b132ec5f9954776aebebe7b92421e",
                "ea691446d22c6776657273696f6e68544543502d302e3168636f64655f7265666f6f6369",
                "3a7368613235363a666565646a696e7075745f686173685820582967534d0f909d196b97",
                "f9e6921342777aea87b46fa52df165389db1fb8ccf6a706f6c6963795f69647383677474",
                "6c5f3630736c6e6f5f726574656e74696f6e6965755f726567696f6e6b6f75747075745f",
                "686173685820762069bc07a6e1b5df123a5ae7bd91c10daa04694fbaa17fba0cd6a8dcce",
                "8f22",
            ),
            expected_signature: concat!(
                "e2f4b7d1a0ccd3558dd722a069216c50abec0cd405b388ee11373ee2e3552c0f",
                "64efb4f268aef620293e3130088de5a10fc9e0d8b32c775ca5cb879b55e82001",
            ),
        },
        GoldenVector {
            name: "same policies, different order",
            seed: [0x07; 32],
            code_ref: "oci:sha256:feed",
            input: b"in",
            output: b"out",
            policy_ids: &["no_retention", "ttl_60s", "eu_region"],
            nonce: &SEQUENTIAL_24,
            timestamp: -1,
            expected_message: concat!(
                "a862747320656e6f6e63655818101112131415161718191a1b1c1d1e1f20212223242526",
                "27667075626b65795820ea4a6c63e29c520abef5507b132ec5f9954776aebebe7b92421e",
                "ea691446d22c6776657273696f6e68544543502d302e3168636f64655f7265666f6f6369",
                "3a7368613235363a666565646a696e7075745f686173685820582967534d0f909d196b97",
                "f9e6921342777aea87b46fa52df165389db1fb8ccf6a706f6c6963795f696473836c6e6f",
                "5f726574656e74696f6e6774746c5f3630736965755f726567696f6e6b6f75747075745f",
                "686173685820762069bc07a6e1b5df123a5ae7bd91c10daa04694fbaa17fba0cd6a8dcce",
                "8f22",
            ),
            expected_signature: concat!(
                "cb05fc7ff3932dc8781dac01fe79be75a8496198d40dd52133567b13bff098ff",
                "7c690afa0897f531909c178fe3252ae72c48f3f7a8df7c71c864da81a9b73c01",
            ),
        },
    ]
}

/// Sign the receipt a golden vector describes.
pub fn generate_receipt_from_vector(vector: &GoldenVector) -> Result<Receipt> {
    let request = ReceiptRequest::new(vector.code_ref, vector.input, vector.output)
        .policy_ids(vector.policy_ids.iter().copied())
        .timestamp(vector.timestamp)
        .nonce(vector.nonce);

    ReceiptSigner::from_keypair(Keypair::from_seed(&vector.seed)).create_receipt(request)
}

/// Check every vector against its expected message and signature.
///
/// Returns `(name, matches, actual signature hex)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let Ok(receipt) = generate_receipt_from_vector(v) else {
                return (v.name.to_string(), false, String::new());
            };
            let message = receipt
                .signable_bytes()
                .map(hex::encode)
                .unwrap_or_default();
            let signature = receipt.sig().to_hex();
            let matches = message == v.expected_message && signature == v.expected_signature;
            (v.name.to_string(), matches, signature)
        })
        .collect()
}

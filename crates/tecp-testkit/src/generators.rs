//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{Map, Value};

use tecp_core::{Keypair, Profile, Receipt, ReceiptRequest, ReceiptSigner, MIN_NONCE_LEN};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a nonce of acceptable length.
pub fn nonce() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), MIN_NONCE_LEN..=64)
}

/// Generate a policy identifier.
pub fn policy_id() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,23}".prop_map(String::from)
}

/// Generate an ordered policy list, possibly empty, possibly with repeats.
pub fn policy_ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(policy_id(), 0..6)
}

/// Generate a code reference.
pub fn code_ref() -> impl Strategy<Value = String> {
    prop_oneof![
        "git:[0-9a-f]{7,40}",
        "oci:sha256:[0-9a-f]{64}",
        "[ -~]{0,64}",
    ]
    .prop_map(String::from)
}

/// Generate any timestamp, including pre-epoch and extreme values.
pub fn timestamp() -> impl Strategy<Value = i64> {
    any::<i64>()
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate an open extension map of string values.
pub fn extension_map() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-z]{1,12}", "[ -~]{0,32}", 0..5).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect()
    })
}

/// Parameters for generating a receipt.
#[derive(Debug, Clone)]
pub struct ReceiptParams {
    pub keypair: Keypair,
    pub code_ref: String,
    pub input: Vec<u8>,
    pub output: Vec<u8>,
    pub policy_ids: Vec<String>,
    pub nonce: Vec<u8>,
    pub timestamp: i64,
}

impl Arbitrary for ReceiptParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            any::<[u8; 32]>(), // seed
            code_ref(),
            payload(512),
            payload(512),
            policy_ids(),
            nonce(),
            timestamp(),
        )
            .prop_map(
                |(seed, code_ref, input, output, policy_ids, nonce, timestamp)| ReceiptParams {
                    keypair: Keypair::from_seed(&seed),
                    code_ref,
                    input,
                    output,
                    policy_ids,
                    nonce,
                    timestamp,
                },
            )
            .boxed()
    }
}

/// Sign a receipt from parameters.
pub fn receipt_from_params(params: &ReceiptParams) -> tecp_core::Result<Receipt> {
    ReceiptSigner::from_keypair(params.keypair.clone())
        .with_profile(Profile::Lite)
        .create_receipt(
            ReceiptRequest::new(params.code_ref.clone(), &params.input, &params.output)
                .policy_ids(params.policy_ids.iter().cloned())
                .timestamp(params.timestamp)
                .nonce(params.nonce.clone()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ciborium::value::Value as Cbor;
    use tecp_core::crypto::{decode_base64, encode_base64};
    use tecp_core::{canonical_encode, ErrorCode, ReceiptVerifier};

    fn verify_at_own_time(raw: &Value, ts: i64) -> tecp_core::VerificationResult {
        ReceiptVerifier::new(Profile::Lite)
            .verify_json_at(raw, ts)
            .unwrap()
    }

    fn cbor_map(entries: &[(String, i64)]) -> Cbor {
        Cbor::Map(
            entries
                .iter()
                .map(|(k, v)| (Cbor::Text(k.clone()), Cbor::Integer((*v).into())))
                .collect(),
        )
    }

    proptest! {
        #[test]
        fn test_signing_is_deterministic(params: ReceiptParams) {
            let r1 = receipt_from_params(&params).unwrap();
            let r2 = receipt_from_params(&params).unwrap();

            prop_assert_eq!(r1.signable_bytes().unwrap(), r2.signable_bytes().unwrap());
            prop_assert_eq!(r1.sig(), r2.sig());
        }

        #[test]
        fn test_round_trip_is_valid(params: ReceiptParams) {
            let receipt = receipt_from_params(&params).unwrap();
            let raw = receipt.to_json_value().unwrap();

            let result = verify_at_own_time(&raw, params.timestamp);
            prop_assert!(result.valid, "{:?}", result.errors);
            prop_assert!(result.errors.is_empty());
        }

        #[test]
        fn test_tampering_breaks_signature_only(
            params: ReceiptParams,
            field in 0usize..6,
            byte in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let receipt = receipt_from_params(&params).unwrap();
            let mut raw = receipt.to_json_value().unwrap();

            let flip = |raw: &mut Value, key: &str| {
                let mut bytes = decode_base64(raw[key].as_str().unwrap()).unwrap();
                let i = byte.index(bytes.len());
                bytes[i] ^= 1 << bit;
                raw[key] = Value::from(encode_base64(&bytes));
            };
            match field {
                0 => flip(&mut raw, "nonce"),
                1 => flip(&mut raw, "input_hash"),
                2 => flip(&mut raw, "output_hash"),
                3 => flip(&mut raw, "sig"),
                4 => {
                    let code_ref = format!("{}!", params.code_ref);
                    raw["code_ref"] = Value::from(code_ref);
                }
                _ => raw["policy_ids"]
                    .as_array_mut()
                    .unwrap()
                    .push(Value::from("injected")),
            }

            let result = verify_at_own_time(&raw, params.timestamp);
            prop_assert!(!result.valid);
            prop_assert_eq!(result.codes(), vec![ErrorCode::SigMismatch]);
        }

        #[test]
        fn test_extensions_never_affect_validity(
            params: ReceiptParams,
            environment in extension_map(),
            ext in extension_map(),
        ) {
            let receipt = receipt_from_params(&params).unwrap();
            let mut raw = receipt.to_json_value().unwrap();
            raw["environment"] = Value::Object(environment);
            raw["ext"] = Value::Object(ext);

            let result = verify_at_own_time(&raw, params.timestamp);
            prop_assert!(result.valid, "{:?}", result.errors);
        }

        #[test]
        fn test_encoding_ignores_insertion_order(
            entries in prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..8),
        ) {
            let forward: Vec<(String, i64)> = entries.into_iter().collect();
            let mut backward = forward.clone();
            backward.reverse();

            prop_assert_eq!(
                canonical_encode(&cbor_map(&forward)).unwrap(),
                canonical_encode(&cbor_map(&backward)).unwrap()
            );
        }

        #[test]
        fn test_different_inputs_encode_differently(
            a in prop::collection::btree_map("[a-z]{1,4}", any::<i64>(), 0..4),
            b in prop::collection::btree_map("[a-z]{1,4}", any::<i64>(), 0..4),
        ) {
            prop_assume!(a != b);
            let a: Vec<(String, i64)> = a.into_iter().collect();
            let b: Vec<(String, i64)> = b.into_iter().collect();

            prop_assert_ne!(
                canonical_encode(&cbor_map(&a)).unwrap(),
                canonical_encode(&cbor_map(&b)).unwrap()
            );
        }

        #[test]
        fn test_payload_changes_hash(
            keypair in keypair(),
            p1 in payload(100),
            p2 in payload(100),
        ) {
            prop_assume!(p1 != p2);
            let signer = ReceiptSigner::from_keypair(keypair);
            let make = |input: &[u8]| {
                signer
                    .create_receipt(
                        ReceiptRequest::new("git:abc123", input, b"")
                            .timestamp(1000)
                            .nonce(vec![0u8; 16]),
                    )
                    .unwrap()
            };

            let r1 = make(p1.as_slice());
            let r2 = make(p2.as_slice());
            prop_assert_ne!(r1.input_hash(), r2.input_hash());
            prop_assert_ne!(r1.sig(), r2.sig());
        }
    }
}

//! The transparency-log verification stage.
//!
//! Runs after the synchronous checks and merges its outcome into the
//! [`VerificationResult`]. The query is the only suspension point of
//! verification: it is bounded by a timeout and can be cancelled.
//!
//! Unless the log is required, the outcome is advisory: it sets
//! `details.transparency_log` and lands in `warnings`, never in `errors`.
//! When required:
//!
//! | outcome | status | finding |
//! |---|---|---|
//! | no `log_inclusion` | Missing | `E-LOG-001` |
//! | leaf not included or proof malformed | NotIncluded | `E-LOG-002` |
//! | unknown root | NotIncluded | `E-LOG-003` |
//! | unavailable, timed out, cancelled | Unavailable | `E-LOG-004` |

use serde_json::Value;
use std::time::{Duration, Instant};
use tecp_core::{
    ErrorCode, Finding, LogInclusion, LogStatus, Receipt, ReceiptVerifier, VerificationResult,
};
use tokio_util::sync::CancellationToken;

use crate::client::LogClient;
use crate::error::LogError;

/// Wire key of the inclusion proof extension.
pub const LOG_INCLUSION_KEY: &str = "log_inclusion";

/// Default bound on a single log query.
pub const DEFAULT_LOG_TIMEOUT: Duration = Duration::from_secs(5);

/// Options for the log stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogCheckOptions {
    pub timeout: Duration,
    /// Escalate log problems to findings that invalidate the receipt.
    pub require_log: bool,
}

impl Default for LogCheckOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_LOG_TIMEOUT,
            require_log: false,
        }
    }
}

/// What the log said about one proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InclusionOutcome {
    Included,
    NotIncluded,
    Failed(LogError),
}

/// Read the inclusion proof from an untrusted receipt.
///
/// `None` when the extension is absent or null.
pub fn inclusion_proof(raw: &Value) -> Option<Result<LogInclusion, LogError>> {
    let value = raw.get(LOG_INCLUSION_KEY).filter(|v| !v.is_null())?;
    Some(
        serde_json::from_value(value.clone())
            .map_err(|e| LogError::InvalidProof(format!("malformed log_inclusion: {e}"))),
    )
}

/// Ask the log about one proof, bounded by `timeout` and `cancel`.
///
/// An already-cancelled token wins over an immediate answer.
pub async fn check_inclusion<C>(
    client: &C,
    proof: &LogInclusion,
    timeout: Duration,
    cancel: &CancellationToken,
) -> InclusionOutcome
where
    C: LogClient + ?Sized,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => InclusionOutcome::Failed(LogError::Cancelled),
        answer = tokio::time::timeout(timeout, client.check_inclusion(proof)) => match answer {
            Ok(Ok(response)) if response.included => InclusionOutcome::Included,
            Ok(Ok(_)) => InclusionOutcome::NotIncluded,
            Ok(Err(e)) => InclusionOutcome::Failed(e),
            Err(_) => InclusionOutcome::Failed(LogError::Timeout(timeout)),
        },
    }
}

/// Merge a log outcome into `result`.
///
/// `outcome` is `None` when the receipt carries no inclusion proof.
pub fn apply_outcome(
    result: &mut VerificationResult,
    outcome: Option<InclusionOutcome>,
    require_log: bool,
) {
    let (status, finding) = match outcome {
        None if require_log => (
            LogStatus::Missing,
            Some(Finding::new(
                ErrorCode::LogMissing,
                "log inclusion proof is required but absent",
            )),
        ),
        None => (LogStatus::NotChecked, None),
        Some(InclusionOutcome::Included) => (LogStatus::Included, None),
        Some(InclusionOutcome::NotIncluded) => (
            LogStatus::NotIncluded,
            Some(Finding::new(
                ErrorCode::LogInvalidProof,
                "leaf is not included in the log",
            )),
        ),
        Some(InclusionOutcome::Failed(e)) if e.is_unavailable() => (
            LogStatus::Unavailable,
            Some(Finding::new(ErrorCode::LogUnavailable, e.to_string())),
        ),
        Some(InclusionOutcome::Failed(e @ LogError::RootMismatch(_))) => (
            LogStatus::NotIncluded,
            Some(Finding::new(ErrorCode::LogRootMismatch, e.to_string())),
        ),
        Some(InclusionOutcome::Failed(e)) => (
            LogStatus::NotIncluded,
            Some(Finding::new(ErrorCode::LogInvalidProof, e.to_string())),
        ),
    };

    result.details.transparency_log = status;
    let Some(finding) = finding.map(|f| f.on(LOG_INCLUSION_KEY)) else {
        return;
    };
    if require_log {
        result.push(finding);
    } else {
        tracing::warn!(code = %finding.code, "advisory log check failed: {}", finding.message);
        result.warn(finding);
    }
}

/// Run the synchronous checks, then the log stage, on an untrusted receipt.
pub async fn verify_with_log<C>(
    verifier: &ReceiptVerifier,
    client: &C,
    raw: &Value,
    options: LogCheckOptions,
    cancel: &CancellationToken,
) -> tecp_core::Result<VerificationResult>
where
    C: LogClient + ?Sized,
{
    let started = Instant::now();
    let mut result = verifier.verify_json(raw)?;

    let outcome = match inclusion_proof(raw) {
        None => None,
        Some(Err(e)) => Some(InclusionOutcome::Failed(e)),
        Some(Ok(proof)) => Some(check_inclusion(client, &proof, options.timeout, cancel).await),
    };
    apply_outcome(&mut result, outcome, options.require_log);

    result.performance.verification_time_us = started.elapsed().as_micros() as u64;
    tracing::debug!(
        valid = result.valid,
        log = ?result.details.transparency_log,
        "verified receipt with log"
    );
    Ok(result)
}

/// Typed counterpart of [`verify_with_log`].
pub async fn verify_receipt_with_log<C>(
    verifier: &ReceiptVerifier,
    client: &C,
    receipt: &Receipt,
    options: LogCheckOptions,
    cancel: &CancellationToken,
) -> tecp_core::Result<VerificationResult>
where
    C: LogClient + ?Sized,
{
    let raw = receipt.to_json_value()?;
    verify_with_log(verifier, client, &raw, options, cancel).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::memory::MemoryLog;
    use serde_json::json;
    use tecp_core::{Extensions, Keypair, ReceiptRequest, ReceiptSigner};

    fn receipt(proof: Option<LogInclusion>) -> Receipt {
        let mut ext = Extensions::new();
        if let Some(proof) = proof {
            ext = ext.with_log_inclusion(proof);
        }
        ReceiptSigner::from_keypair(Keypair::from_seed(&[0x11; 32]))
            .create_receipt(
                ReceiptRequest::new("git:abc123", b"in", b"out")
                    .policy("no_retention")
                    .extensions(ext),
            )
            .unwrap()
    }

    fn proof(leaf_index: u64) -> LogInclusion {
        LogInclusion {
            leaf_index,
            merkle_proof: vec!["h0".into()],
            log_root: "root".into(),
        }
    }

    async fn log_with_leaf(leaf_index: u64) -> MemoryLog {
        let log = MemoryLog::new();
        log.append("root", leaf_index).await;
        log
    }

    fn required() -> LogCheckOptions {
        LogCheckOptions {
            require_log: true,
            ..LogCheckOptions::default()
        }
    }

    #[tokio::test]
    async fn test_included() {
        let log = log_with_leaf(9).await;
        let result = verify_receipt_with_log(
            &ReceiptVerifier::default(),
            &log,
            &receipt(Some(proof(9))),
            required(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(result.valid, "{:?}", result.errors);
        assert_eq!(result.details.transparency_log, LogStatus::Included);
    }

    #[tokio::test]
    async fn test_absent_proof() {
        let log = MemoryLog::new();
        let cancel = CancellationToken::new();
        let verifier = ReceiptVerifier::default();
        let receipt = receipt(None);

        let advisory = verify_receipt_with_log(
            &verifier,
            &log,
            &receipt,
            LogCheckOptions::default(),
            &cancel,
        )
        .await
        .unwrap();
        assert!(advisory.valid);
        assert_eq!(advisory.details.transparency_log, LogStatus::NotChecked);

        let strict = verify_receipt_with_log(&verifier, &log, &receipt, required(), &cancel)
            .await
            .unwrap();
        assert!(!strict.valid);
        assert_eq!(strict.details.transparency_log, LogStatus::Missing);
        assert_eq!(strict.codes(), vec![ErrorCode::LogMissing]);
    }

    #[tokio::test]
    async fn test_not_included() {
        let log = log_with_leaf(1).await;
        let receipt = receipt(Some(proof(2)));
        let cancel = CancellationToken::new();
        let verifier = ReceiptVerifier::default();

        let advisory = verify_receipt_with_log(
            &verifier,
            &log,
            &receipt,
            LogCheckOptions::default(),
            &cancel,
        )
        .await
        .unwrap();
        assert!(advisory.valid);
        assert_eq!(advisory.details.transparency_log, LogStatus::NotIncluded);

        let strict = verify_receipt_with_log(&verifier, &log, &receipt, required(), &cancel)
            .await
            .unwrap();
        assert_eq!(strict.codes(), vec![ErrorCode::LogInvalidProof]);
    }

    #[tokio::test]
    async fn test_root_mismatch() {
        let log = MemoryLog::new();
        log.append("other-root", 2).await;

        let result = verify_receipt_with_log(
            &ReceiptVerifier::default(),
            &log,
            &receipt(Some(proof(2))),
            required(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(result.codes(), vec![ErrorCode::LogRootMismatch]);
    }

    #[tokio::test]
    async fn test_unavailable_is_not_a_crypto_failure() {
        let log = log_with_leaf(2).await;
        log.set_online(false);
        let receipt = receipt(Some(proof(2)));
        let cancel = CancellationToken::new();
        let verifier = ReceiptVerifier::default();

        let advisory = verify_receipt_with_log(
            &verifier,
            &log,
            &receipt,
            LogCheckOptions::default(),
            &cancel,
        )
        .await
        .unwrap();
        assert!(advisory.valid);
        assert_eq!(advisory.details.transparency_log, LogStatus::Unavailable);
        assert!(advisory.errors.is_empty());
        assert_eq!(advisory.warnings.len(), 1);
        assert_eq!(advisory.warnings[0].code, ErrorCode::LogUnavailable);

        let strict = verify_receipt_with_log(&verifier, &log, &receipt, required(), &cancel)
            .await
            .unwrap();
        assert_eq!(strict.codes(), vec![ErrorCode::LogUnavailable]);
        assert_eq!(
            strict.details.signature,
            tecp_core::SignatureStatus::Valid
        );
    }

    #[tokio::test]
    async fn test_timeout() {
        let log = log_with_leaf(2).await.with_latency(Duration::from_millis(500));
        let options = LogCheckOptions {
            timeout: Duration::from_millis(20),
            require_log: true,
        };

        let result = verify_receipt_with_log(
            &ReceiptVerifier::default(),
            &log,
            &receipt(Some(proof(2))),
            options,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(result.details.transparency_log, LogStatus::Unavailable);
        assert_eq!(result.codes(), vec![ErrorCode::LogUnavailable]);
    }

    #[tokio::test]
    async fn test_cancelled() {
        let log = log_with_leaf(2).await.with_latency(Duration::from_secs(30));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = check_inclusion(&log, &proof(2), Duration::from_secs(60), &cancel).await;
        assert_eq!(outcome, InclusionOutcome::Failed(LogError::Cancelled));
    }

    #[tokio::test]
    async fn test_malformed_proof() {
        let log = MemoryLog::new();
        let mut raw = receipt(None).to_json_value().unwrap();
        raw["log_inclusion"] = json!({"leaf_index": "nine"});

        let result = verify_with_log(
            &ReceiptVerifier::default(),
            &log,
            &raw,
            required(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(result.details.transparency_log, LogStatus::NotIncluded);
        assert_eq!(result.codes(), vec![ErrorCode::LogInvalidProof]);
        // The schema stage only warns about the unsigned extension
        assert_eq!(result.details.schema, tecp_core::SchemaStatus::Ok);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.code == ErrorCode::SchemaInvalidFormat));

        let advisory = verify_with_log(
            &ReceiptVerifier::default(),
            &log,
            &raw,
            LogCheckOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert!(advisory.valid, "{:?}", advisory.errors);
        assert!(advisory
            .warnings
            .iter()
            .any(|w| w.code == ErrorCode::LogInvalidProof));
    }

    #[test]
    fn test_inclusion_proof_extraction() {
        assert!(inclusion_proof(&json!({})).is_none());
        assert!(inclusion_proof(&json!({"log_inclusion": null})).is_none());

        let parsed = inclusion_proof(&json!({
            "log_inclusion": {"leaf_index": 1, "merkle_proof": ["x"], "log_root": "r"}
        }))
        .unwrap()
        .unwrap();
        assert_eq!(parsed.leaf_index, 1);
    }
}

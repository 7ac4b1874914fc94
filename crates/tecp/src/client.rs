//! The `Tecp` entry point.
//!
//! Ties a signer, a verifier, and the optional log and policy collaborators
//! to one [`TecpConfig`].

use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use tecp_core::{
    Keypair, PublicKey, Receipt, ReceiptRequest, ReceiptSigner, ReceiptVerifier,
    VerificationResult,
};
use tecp_log::{apply_outcome, inclusion_proof, InclusionOutcome, LogClient, LogError};
use tecp_policy::{PolicyDecision, PolicyRequest, PolicyRuntime};

use crate::config::TecpConfig;
use crate::error::{Result, TecpError};

/// Signs and verifies receipts under one configuration.
///
/// Every collaborator is optional. Without a signer the instance only
/// verifies; without a log client the log stage reports the log as
/// unavailable; without a policy runtime no policies are enforced.
#[derive(Clone)]
pub struct Tecp {
    config: TecpConfig,
    signer: Option<ReceiptSigner>,
    verifier: ReceiptVerifier,
    log: Option<Arc<dyn LogClient>>,
    policy: Option<Arc<dyn PolicyRuntime>>,
}

impl Tecp {
    /// Create a verify-only instance.
    pub fn new(config: TecpConfig) -> Self {
        Self {
            verifier: ReceiptVerifier::new(config.profile),
            config,
            signer: None,
            log: None,
            policy: None,
        }
    }

    /// Attach a signing key. The signer adopts the configured profile.
    pub fn with_signer(mut self, keypair: Keypair) -> Self {
        self.signer = Some(ReceiptSigner::from_keypair(keypair).with_profile(self.config.profile));
        self
    }

    pub fn with_log_client(mut self, client: Arc<dyn LogClient>) -> Self {
        self.log = Some(client);
        self
    }

    pub fn with_policy_runtime(mut self, runtime: Arc<dyn PolicyRuntime>) -> Self {
        self.policy = Some(runtime);
        self
    }

    pub fn config(&self) -> &TecpConfig {
        &self.config
    }

    pub fn verifier(&self) -> &ReceiptVerifier {
        &self.verifier
    }

    /// Public key of the attached signer, if any.
    pub fn public_key(&self) -> Option<PublicKey> {
        self.signer.as_ref().map(ReceiptSigner::public_key)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Signing
    // ─────────────────────────────────────────────────────────────────────────

    /// Sign a receipt with the attached key.
    pub fn create_receipt(&self, request: ReceiptRequest<'_>) -> Result<Receipt> {
        let signer = self.signer.as_ref().ok_or(TecpError::NoSigner)?;
        Ok(signer.create_receipt(request)?)
    }

    /// Ask the policy runtime about a computation.
    ///
    /// With no runtime attached every request is allowed.
    pub fn enforce_policies(
        &self,
        policy_ids: &[String],
        input: &[u8],
        environment: &Map<String, Value>,
        max_duration: Option<Duration>,
    ) -> Result<PolicyDecision> {
        let Some(runtime) = &self.policy else {
            return Ok(PolicyDecision {
                allowed: true,
                ..PolicyDecision::default()
            });
        };
        let decision = runtime.evaluate(&PolicyRequest {
            policy_ids,
            input,
            environment,
            max_duration,
        })?;
        Ok(decision)
    }

    /// Enforce the request's policies, then sign.
    ///
    /// Nothing is signed when the runtime denies the computation.
    pub fn create_receipt_enforced(
        &self,
        request: ReceiptRequest<'_>,
        environment: &Map<String, Value>,
    ) -> Result<Receipt> {
        let decision = self.enforce_policies(
            request.declared_policies(),
            request.input(),
            environment,
            None,
        )?;
        if !decision.allowed {
            tracing::warn!(
                violations = decision.violations.len(),
                "policy runtime denied receipt"
            );
            return Err(TecpError::PolicyDenied(decision.violations));
        }
        self.create_receipt(request)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Verification
    // ─────────────────────────────────────────────────────────────────────────

    /// Verify a typed receipt without the log stage.
    pub fn verify(&self, receipt: &Receipt) -> Result<VerificationResult> {
        Ok(self.verifier.verify(receipt)?)
    }

    /// Verify an untrusted wire-form receipt without the log stage.
    pub fn verify_json(&self, raw: &Value) -> Result<VerificationResult> {
        Ok(self.verifier.verify_json(raw)?)
    }

    /// Verify a typed receipt including the log stage.
    pub async fn verify_with_log(
        &self,
        receipt: &Receipt,
        cancel: &CancellationToken,
    ) -> Result<VerificationResult> {
        let raw = receipt.to_json_value()?;
        self.verify_json_with_log(&raw, cancel).await
    }

    /// Verify an untrusted wire-form receipt including the log stage.
    pub async fn verify_json_with_log(
        &self,
        raw: &Value,
        cancel: &CancellationToken,
    ) -> Result<VerificationResult> {
        let options = self.config.log_options();
        if let Some(client) = &self.log {
            return Ok(
                tecp_log::verify_with_log(&self.verifier, client.as_ref(), raw, options, cancel)
                    .await?,
            );
        }

        let mut result = self.verifier.verify_json(raw)?;
        let outcome = inclusion_proof(raw).map(|proof| {
            InclusionOutcome::Failed(match proof {
                Ok(_) => LogError::Unavailable("no log client configured".into()),
                Err(e) => e,
            })
        });
        apply_outcome(&mut result, outcome, options.require_log);
        Ok(result)
    }
}

impl std::fmt::Debug for Tecp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tecp")
            .field("config", &self.config)
            .field("public_key", &self.public_key())
            .field("log", &self.log.is_some())
            .field("policy", &self.policy.is_some())
            .finish()
    }
}

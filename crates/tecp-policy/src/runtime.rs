//! Policy runtime interface.
//!
//! The calling layer asks a runtime whether a computation may proceed under
//! the policies a receipt is about to declare. The `PolicyRuntime` trait
//! defines that interface. `AllowListRuntime` is a JSON-configurable
//! implementation that needs no external engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tecp_core::{ErrorCode, Finding};

use crate::catalog::PolicyCatalog;
use crate::error::Result;

/// What a runtime is asked to judge.
#[derive(Debug, Clone, Copy)]
pub struct PolicyRequest<'a> {
    pub policy_ids: &'a [String],
    pub input: &'a [u8],
    /// Execution environment, as in a receipt's `environment` extension.
    pub environment: &'a Map<String, Value>,
    /// Upper bound on processing time the caller intends to allow.
    pub max_duration: Option<Duration>,
}

/// A runtime's answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub allowed: bool,
    pub violations: Vec<Finding>,
    /// Runtime-specific record of what was checked.
    #[serde(default)]
    pub evidence: Map<String, Value>,
}

/// Evaluates policies for a computation.
pub trait PolicyRuntime: Send + Sync {
    fn evaluate(&self, request: &PolicyRequest<'_>) -> Result<PolicyDecision>;
}

/// Rules checked by [`AllowListRuntime`].
///
/// Every field is optional in JSON; absent rules are skipped, not failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowListRules {
    /// Policies every request must declare (`E-POLICY-003`).
    #[serde(default)]
    pub required_policies: Vec<String>,
    /// Allowed string values per environment key (`E-POLICY-002`).
    #[serde(default)]
    pub allowed_environment: BTreeMap<String, Vec<String>>,
    /// Largest accepted input (`E-POLICY-002`).
    #[serde(default)]
    pub max_input_bytes: Option<usize>,
    /// Longest processing time a request may ask for (`E-POLICY-002`).
    #[serde(default)]
    pub max_duration_ms: Option<u64>,
}

impl AllowListRules {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Checks declared policies against a catalog and a fixed rule set.
///
/// Unknown ids are reported as `E-POLICY-001`.
#[derive(Debug, Clone, Default)]
pub struct AllowListRuntime {
    catalog: PolicyCatalog,
    rules: AllowListRules,
}

impl AllowListRuntime {
    pub fn new(catalog: PolicyCatalog, rules: AllowListRules) -> Self {
        Self { catalog, rules }
    }

    pub fn catalog(&self) -> &PolicyCatalog {
        &self.catalog
    }

    pub fn rules(&self) -> &AllowListRules {
        &self.rules
    }
}

impl PolicyRuntime for AllowListRuntime {
    fn evaluate(&self, request: &PolicyRequest<'_>) -> Result<PolicyDecision> {
        let mut violations = self.catalog.check_known(request.policy_ids);

        for required in &self.rules.required_policies {
            if !request.policy_ids.contains(required) {
                violations.push(
                    Finding::new(
                        ErrorCode::PolicyRequirements,
                        format!("required policy {required:?} is not declared"),
                    )
                    .on("policy_ids"),
                );
            }
        }

        for (key, allowed) in &self.rules.allowed_environment {
            let actual = request.environment.get(key).and_then(Value::as_str);
            if !actual.is_some_and(|v| allowed.iter().any(|a| a == v)) {
                violations.push(
                    Finding::new(
                        ErrorCode::PolicyFailed,
                        format!("environment {key}={actual:?} is not one of {allowed:?}"),
                    )
                    .on(format!("environment.{key}")),
                );
            }
        }

        if let Some(max) = self.rules.max_input_bytes {
            if request.input.len() > max {
                violations.push(Finding::new(
                    ErrorCode::PolicyFailed,
                    format!("input is {} bytes, limit {max}", request.input.len()),
                ));
            }
        }

        if let (Some(max_ms), Some(asked)) = (self.rules.max_duration_ms, request.max_duration) {
            if asked.as_millis() > u128::from(max_ms) {
                violations.push(Finding::new(
                    ErrorCode::PolicyFailed,
                    format!("requested duration {asked:?} exceeds {max_ms} ms"),
                ));
            }
        }

        let mut evidence = Map::new();
        evidence.insert("runtime".into(), Value::from("allow-list"));
        evidence.insert(
            "checked".into(),
            Value::from(request.policy_ids.to_vec()),
        );

        if !violations.is_empty() {
            tracing::debug!(violations = violations.len(), "policy check failed");
        }

        Ok(PolicyDecision {
            allowed: violations.is_empty(),
            violations,
            evidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn runtime(rules: AllowListRules) -> AllowListRuntime {
        AllowListRuntime::new(PolicyCatalog::builtin(), rules)
    }

    fn codes(decision: &PolicyDecision) -> Vec<ErrorCode> {
        decision.violations.iter().map(|f| f.code).collect()
    }

    #[test]
    fn test_allows_known_policies() {
        let policy_ids = ids(&["no_retention"]);
        let environment = Map::new();
        let decision = runtime(AllowListRules::default())
            .evaluate(&PolicyRequest {
                policy_ids: &policy_ids,
                input: b"hello",
                environment: &environment,
                max_duration: None,
            })
            .unwrap();

        assert!(decision.allowed);
        assert!(decision.violations.is_empty());
        assert_eq!(decision.evidence["checked"], json!(["no_retention"]));
    }

    #[test]
    fn test_unknown_and_missing_policies() {
        let rules = AllowListRules {
            required_policies: ids(&["no_retention"]),
            ..AllowListRules::default()
        };
        let policy_ids = ids(&["mystery"]);
        let environment = Map::new();
        let decision = runtime(rules)
            .evaluate(&PolicyRequest {
                policy_ids: &policy_ids,
                input: b"",
                environment: &environment,
                max_duration: None,
            })
            .unwrap();

        assert!(!decision.allowed);
        assert_eq!(
            codes(&decision),
            vec![ErrorCode::PolicyUnknown, ErrorCode::PolicyRequirements]
        );
    }

    #[test]
    fn test_environment_and_limits() {
        let rules = AllowListRules::from_json(
            r#"{"allowed_environment": {"region": ["eu-west-1", "eu-central-1"]},
                "max_input_bytes": 4, "max_duration_ms": 1000}"#,
        )
        .unwrap();
        let rt = runtime(rules);
        let policy_ids = ids(&["no_retention"]);

        let eu = env(json!({"region": "eu-west-1"}));
        let ok = rt
            .evaluate(&PolicyRequest {
                policy_ids: &policy_ids,
                input: b"abcd",
                environment: &eu,
                max_duration: Some(Duration::from_millis(1000)),
            })
            .unwrap();
        assert!(ok.allowed, "{:?}", ok.violations);

        let us = env(json!({"region": "us-east-1"}));
        let bad = rt
            .evaluate(&PolicyRequest {
                policy_ids: &policy_ids,
                input: b"abcde",
                environment: &us,
                max_duration: Some(Duration::from_secs(2)),
            })
            .unwrap();
        assert_eq!(codes(&bad), vec![ErrorCode::PolicyFailed; 3]);
        assert_eq!(bad.violations[0].field.as_deref(), Some("environment.region"));
    }

    #[test]
    fn test_missing_environment_key_fails() {
        let rules = AllowListRules {
            allowed_environment: BTreeMap::from([("provider".into(), ids(&["aws"]))]),
            ..AllowListRules::default()
        };
        let policy_ids = ids(&["no_retention"]);
        let environment = Map::new();
        let decision = runtime(rules)
            .evaluate(&PolicyRequest {
                policy_ids: &policy_ids,
                input: b"",
                environment: &environment,
                max_duration: None,
            })
            .unwrap();
        assert_eq!(codes(&decision), vec![ErrorCode::PolicyFailed]);
    }
}

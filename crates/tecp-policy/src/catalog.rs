//! Catalog of known policy definitions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tecp_core::{ErrorCode, Finding};

use crate::error::{PolicyError, Result};

/// How strictly a policy is meant to be enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnforcementLevel {
    Advisory,
    Required,
    Strict,
}

/// A policy that receipts may declare in `policy_ids`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub compliance_frameworks: Vec<String>,
    pub enforcement_level: EnforcementLevel,
    /// Runtime-specific settings, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, Value>>,
}

/// The set of policy ids a deployment knows about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyCatalog {
    definitions: BTreeMap<String, PolicyDefinition>,
}

impl PolicyCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog shipped with the crate.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.definitions.insert(
            "no_retention".into(),
            PolicyDefinition {
                id: "no_retention".into(),
                name: "No Retention".into(),
                description: "Input and output are not retained after the computation completes"
                    .into(),
                compliance_frameworks: vec!["GDPR".into()],
                enforcement_level: EnforcementLevel::Required,
                parameters: None,
            },
        );
        catalog
    }

    /// Parse a JSON array of definitions.
    pub fn from_json(json: &str) -> Result<Self> {
        let definitions: Vec<PolicyDefinition> = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for definition in definitions {
            catalog.register(definition)?;
        }
        Ok(catalog)
    }

    /// Load a JSON array of definitions from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Add a definition. Ids must be unique and non-empty.
    pub fn register(&mut self, definition: PolicyDefinition) -> Result<()> {
        if definition.id.trim().is_empty() {
            return Err(PolicyError::InvalidDefinition("empty policy id".into()));
        }
        if self.definitions.contains_key(&definition.id) {
            return Err(PolicyError::DuplicatePolicy(definition.id));
        }
        self.definitions.insert(definition.id.clone(), definition);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&PolicyDefinition> {
        self.definitions.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.definitions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Definitions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &PolicyDefinition> {
        self.definitions.values()
    }

    /// Report every declared id the catalog does not know (`E-POLICY-001`).
    pub fn check_known(&self, policy_ids: &[String]) -> Vec<Finding> {
        policy_ids
            .iter()
            .enumerate()
            .filter(|(_, id)| !self.contains(id))
            .map(|(i, id)| {
                Finding::new(ErrorCode::PolicyUnknown, format!("unknown policy id {id:?}"))
                    .on(format!("policy_ids[{i}]"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn definition(id: &str, level: EnforcementLevel) -> PolicyDefinition {
        PolicyDefinition {
            id: id.into(),
            name: id.into(),
            description: String::new(),
            compliance_frameworks: vec![],
            enforcement_level: level,
            parameters: None,
        }
    }

    #[test]
    fn test_builtin_knows_no_retention() {
        let catalog = PolicyCatalog::builtin();
        let def = catalog.get("no_retention").unwrap();
        assert_eq!(def.enforcement_level, EnforcementLevel::Required);
        assert!(catalog.check_known(&["no_retention".into()]).is_empty());
    }

    #[test]
    fn test_check_known_reports_unknown_ids() {
        let catalog = PolicyCatalog::builtin();
        let found = catalog.check_known(&["no_retention".into(), "made_up".into()]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, ErrorCode::PolicyUnknown);
        assert_eq!(found[0].field.as_deref(), Some("policy_ids[1]"));
    }

    #[test]
    fn test_register_rejects_duplicates_and_empty_ids() {
        let mut catalog = PolicyCatalog::new();
        catalog
            .register(definition("eu_region", EnforcementLevel::Strict))
            .unwrap();
        assert!(matches!(
            catalog.register(definition("eu_region", EnforcementLevel::Advisory)),
            Err(PolicyError::DuplicatePolicy(id)) if id == "eu_region"
        ));
        assert!(matches!(
            catalog.register(definition("  ", EnforcementLevel::Advisory)),
            Err(PolicyError::InvalidDefinition(_))
        ));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_from_json() {
        let catalog = PolicyCatalog::from_json(
            r#"[
                {"id": "ttl_60s", "name": "TTL", "description": "Delete within 60s",
                 "enforcement_level": "strict", "parameters": {"ttl_ms": 60000}},
                {"id": "no_pii", "name": "No PII", "description": "",
                 "compliance_frameworks": ["HIPAA"], "enforcement_level": "advisory"}
            ]"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        let ttl = catalog.get("ttl_60s").unwrap();
        assert_eq!(ttl.enforcement_level, EnforcementLevel::Strict);
        assert_eq!(ttl.parameters.as_ref().unwrap()["ttl_ms"], 60000);
        assert_eq!(
            catalog.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(),
            vec!["no_pii", "ttl_60s"]
        );
    }

    #[test]
    fn test_from_json_rejects_bad_level() {
        let err = PolicyCatalog::from_json(
            r#"[{"id": "x", "name": "x", "description": "", "enforcement_level": "maybe"}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::Json(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "no_network", "name": "No Network", "description": "", "enforcement_level": "required"}}]"#
        )
        .unwrap();

        let catalog = PolicyCatalog::from_file(file.path()).unwrap();
        assert!(catalog.contains("no_network"));
    }
}

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use softsearch_core::errors::{ErrorInfo, SwsError};
use softsearch_core::{ExceptionRule, SoftwareChoice, Substitution, ROLE_COMPILER, ROLE_MPI};

const RESERVED_KEYS: [&str; 5] = ["input", "ranks", "spec", "app name", "max wall time"];

/// Role candidates and exception rules read from a configuration document.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleDocument {
    pub roles: IndexMap<String, Vec<SoftwareChoice>>,
    pub rules: Vec<ExceptionRule>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    exceptions: Vec<RawException>,
    #[serde(flatten)]
    roles: IndexMap<String, Vec<SoftwareChoice>>,
}

#[derive(Debug, Deserialize)]
struct RawException {
    #[serde(rename = "where")]
    clause: WhereClause,
    #[serde(default)]
    substitution: Vec<IndexMap<String, SoftwareChoice>>,
}

#[derive(Debug, Deserialize)]
struct WhereClause {
    pattern: Vec<String>,
}

impl RoleDocument {
    /// Parses a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, SwsError> {
        let raw: RawDocument = serde_json::from_str(text).map_err(|err| {
            SwsError::Config(ErrorInfo::new("document-json", err.to_string()))
        })?;
        Self::from_raw(raw)
    }

    /// Parses a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, SwsError> {
        let raw: RawDocument = serde_yaml::from_str(text).map_err(|err| {
            SwsError::Config(ErrorInfo::new("document-yaml", err.to_string()))
        })?;
        Self::from_raw(raw)
    }

    /// Loads a document, choosing YAML for `.yaml`/`.yml` files and JSON otherwise.
    pub fn load(path: &Path) -> Result<Self, SwsError> {
        let text = fs::read_to_string(path).map_err(|err| {
            SwsError::Config(
                ErrorInfo::new("document-read", err.to_string()).with_path(path),
            )
        })?;
        let parsed = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            _ => Self::from_json_str(&text),
        };
        parsed.map_err(|err| match err {
            SwsError::Config(info) => SwsError::Config(info.with_path(path)),
            other => other,
        })
    }

    fn from_raw(raw: RawDocument) -> Result<Self, SwsError> {
        for required in [ROLE_COMPILER, ROLE_MPI] {
            if !raw.roles.contains_key(required) {
                return Err(SwsError::Config(
                    ErrorInfo::new("document-missing-role", "required role is absent")
                        .with_context("role", required),
                ));
            }
        }
        if let Some(reserved) = raw.roles.keys().find(|key| RESERVED_KEYS.contains(&key.as_str())) {
            return Err(SwsError::Config(
                ErrorInfo::new("document-reserved-role", "role name clashes with a descriptor field")
                    .with_context("role", reserved.clone()),
            ));
        }
        let roles = raw
            .roles
            .into_iter()
            .map(|(role, choices)| {
                let bound = choices
                    .into_iter()
                    .map(|choice| choice.in_role(role.clone()))
                    .collect();
                (role, bound)
            })
            .collect();
        let rules = raw.exceptions.into_iter().map(into_rule).collect();
        Ok(Self { roles, rules })
    }
}

fn into_rule(raw: RawException) -> ExceptionRule {
    let substitutions = raw
        .substitution
        .into_iter()
        .flat_map(|entry| entry.into_iter())
        .map(|(role, replacement)| Substitution {
            replacement: replacement.in_role(role.clone()),
            role,
        })
        .collect();
    ExceptionRule::substitute(raw.clause.pattern, substitutions)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "compiler": [{"name": "gcc", "version": "8.3.1", "module": "gcc/8.3.1"}],
        "mpi": [{"name": "openmpi", "version": "4.0.5"}, {"name": "mvapich2", "version": "2.3.4"}],
        "blas": [{"name": "openblas", "version": "0.3.12", "variants": ["+ilp64"]}],
        "exceptions": [
            {"where": {"pattern": ["gcc/8.3.1", "mvapich2"]}, "substitution": [{"mpi": {"name": "mvapich2", "version": "2.2"}}]},
            {"where": {"pattern": ["openblas"]}}
        ]
    }"#;

    #[test]
    fn roles_keep_document_order_and_bind_role_names() {
        let doc = RoleDocument::from_json_str(DOC).unwrap();
        let keys: Vec<&str> = doc.roles.keys().map(String::as_str).collect();
        assert_eq!(keys, ["compiler", "mpi", "blas"]);
        assert_eq!(doc.roles["mpi"][1].role, "mpi");
        assert!(doc.roles["blas"][0].variant_flags.contains("+ilp64"));
    }

    #[test]
    fn exceptions_become_rules() {
        let doc = RoleDocument::from_json_str(DOC).unwrap();
        assert_eq!(doc.rules.len(), 2);
        assert_eq!(doc.rules[0].substitutions[0].role, "mpi");
        assert_eq!(doc.rules[0].substitutions[0].replacement.version, "2.2");
        assert!(doc.rules[1].is_rejection());
    }

    #[test]
    fn missing_mpi_role_is_rejected() {
        let err = RoleDocument::from_json_str(r#"{"compiler": []}"#).unwrap_err();
        assert_eq!(err.info().code, "document-missing-role");
    }

    #[test]
    fn reserved_role_names_are_rejected() {
        let err = RoleDocument::from_json_str(r#"{"compiler": [], "mpi": [], "ranks": []}"#)
            .unwrap_err();
        assert_eq!(err.info().code, "document-reserved-role");
    }

    #[test]
    fn yaml_documents_parse() {
        let yaml = "compiler:\n  - name: gcc\n    version: 9.4.0\nmpi:\n  - name: openmpi\n    version: 4.1.0\n";
        let doc = RoleDocument::from_yaml_str(yaml).unwrap();
        assert_eq!(doc.roles["compiler"][0].package_spec(), "gcc@9.4.0");
        assert!(doc.rules.is_empty());
    }
}

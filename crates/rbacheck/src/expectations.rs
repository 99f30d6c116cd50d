//! Expectation loader: the authorization matrix a cluster is checked against.
//!
//! ```yaml
//! config:
//!   kind:
//!     serviceaccount:
//!       system:serviceaccount:ci:deployer:
//!         cluster: ci-deployer
//!     group:
//!       developers:
//!         cluster: dev-readonly
//!         namespaces:
//!           team-*: dev
//!           shared-tools: dev-readonly
//! ```
//!
//! Source order is kept throughout so the transcript of a run is reproducible.

use std::path::Path;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::definitions::DefinitionStore;
use crate::error::{LoadError, read_file};
use crate::model::{
    AuthorizationLabel, Identity, IdentityKind, NamespaceSelector, ScopeKind, ScopeSelector,
};
use crate::ordered::OrderedMap;

#[derive(Debug, Deserialize)]
struct ExpectationsFile {
    config: RawConfig,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    kind: OrderedMap<IdentityKind, OrderedMap<String, RawAuthorizations>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAuthorizations {
    #[serde(default)]
    cluster: Option<AuthorizationLabel>,
    #[serde(default)]
    namespaces: OrderedMap<String, AuthorizationLabel>,
}

/// One scope of an identity's expectations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeExpectation {
    pub selector: ScopeSelector,
    pub label: AuthorizationLabel,
}

/// Everything expected of one identity: the cluster scope first, then each
/// namespace selector in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectationEntry {
    pub identity: Identity,
    pub scopes: Vec<ScopeExpectation>,
}

/// A scope/label pair the expectations use but the definitions lack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageGap {
    pub scope: ScopeKind,
    pub label: AuthorizationLabel,
}

/// The loaded expectation matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expectations {
    entries: Vec<ExpectationEntry>,
}

impl Expectations {
    pub fn new(entries: Vec<ExpectationEntry>) -> Self {
        Self { entries }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = read_file(path)?;
        Self::from_yaml_str(&text, &format!("expectations file {}", path.display()))
    }

    /// Parses an expectations document. `origin` names it in error messages.
    pub fn from_yaml_str(text: &str, origin: &str) -> Result<Self, LoadError> {
        let file: ExpectationsFile =
            serde_yaml::from_str(text).map_err(|source| LoadError::Parse {
                origin: origin.to_string(),
                source,
            })?;
        let invalid = |reason: String| LoadError::Invalid {
            origin: origin.to_string(),
            reason,
        };

        let mut entries = Vec::new();
        for (kind, identities) in file.config.kind {
            for (name, raw) in identities {
                if name.trim().is_empty() {
                    return Err(invalid(format!("empty {kind} name")));
                }

                let mut scopes = Vec::with_capacity(raw.namespaces.0.len() + 1);
                if let Some(label) = raw.cluster {
                    scopes.push(ScopeExpectation {
                        selector: ScopeSelector::Cluster,
                        label,
                    });
                }
                for (selector, label) in raw.namespaces {
                    if selector.trim().is_empty() {
                        return Err(invalid(format!("empty namespace selector for {kind} {name}")));
                    }
                    scopes.push(ScopeExpectation {
                        selector: ScopeSelector::Namespace(NamespaceSelector::parse(&selector)),
                        label,
                    });
                }

                entries.push(ExpectationEntry {
                    identity: Identity::new(kind, name),
                    scopes,
                });
            }
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ExpectationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Scope/label pairs referenced here that `definitions` does not cover,
    /// in first-reference order without duplicates.
    pub fn coverage_gaps(&self, definitions: &DefinitionStore) -> Vec<CoverageGap> {
        let mut gaps: Vec<CoverageGap> = Vec::new();
        for scope in self.entries.iter().flat_map(|entry| &entry.scopes) {
            let gap = CoverageGap {
                scope: scope.selector.kind(),
                label: scope.label.clone(),
            };
            if !definitions.covers(gap.scope, &gap.label) && !gaps.contains(&gap) {
                gaps.push(gap);
            }
        }
        gaps
    }

    /// Renders the matrix back to YAML in the input layout.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        let mut kinds = Mapping::new();
        for entry in &self.entries {
            let mut authorizations = Mapping::new();
            let mut namespaces = Mapping::new();
            for scope in &entry.scopes {
                let label = Value::from(scope.label.as_str());
                match &scope.selector {
                    ScopeSelector::Cluster => {
                        authorizations.insert(Value::from("cluster"), label);
                    }
                    ScopeSelector::Namespace(selector) => {
                        namespaces.insert(Value::from(selector.as_str()), label);
                    }
                }
            }
            if !namespaces.is_empty() {
                authorizations.insert(Value::from("namespaces"), Value::Mapping(namespaces));
            }

            let identities = kinds
                .entry(Value::from(entry.identity.kind.as_str()))
                .or_insert_with(|| Value::Mapping(Mapping::new()));
            if let Value::Mapping(identities) = identities {
                identities.insert(
                    Value::from(entry.identity.name.as_str()),
                    Value::Mapping(authorizations),
                );
            }
        }

        let mut config = Mapping::new();
        config.insert(Value::from("kind"), Value::Mapping(kinds));
        let mut root = Mapping::new();
        root.insert(Value::from("config"), Value::Mapping(config));
        serde_yaml::to_string(&root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Outcome, ProbeTemplate};

    const EXPECTATIONS: &str = r"
config:
  kind:
    serviceaccount:
      system:serviceaccount:ci:deployer:
        cluster: ci-deployer
    group:
      developers:
        namespaces:
          team-*: dev
          shared-tools: dev-readonly
        cluster: dev-readonly
      auditors:
        cluster: audit
";

    fn expectations() -> Expectations {
        Expectations::from_yaml_str(EXPECTATIONS, "test expectations").unwrap()
    }

    #[test]
    fn test_entries_follow_source_order() {
        let expectations = expectations();
        let names: Vec<_> = expectations
            .entries()
            .iter()
            .map(|e| e.identity.to_string())
            .collect();
        assert_eq!(
            names,
            [
                "serviceaccount system:serviceaccount:ci:deployer",
                "group developers",
                "group auditors",
            ]
        );
    }

    #[test]
    fn test_cluster_scope_comes_first() {
        let expectations = expectations();
        let developers = &expectations.entries()[1];
        let scopes: Vec<_> = developers.scopes.iter().map(|s| s.selector.to_string()).collect();
        assert_eq!(
            scopes,
            ["cluster", "namespace team-*", "namespace shared-tools"]
        );
        assert!(matches!(
            &developers.scopes[1].selector,
            ScopeSelector::Namespace(NamespaceSelector::Pattern(p)) if p == "team-*"
        ));
    }

    #[test]
    fn test_rejects_unknown_identity_kind() {
        let err = Expectations::from_yaml_str(
            "config:\n  kind:\n    user:\n      alice:\n        cluster: ro\n",
            "bad",
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn test_rejects_unknown_scope_key() {
        let err = Expectations::from_yaml_str(
            "config:\n  kind:\n    group:\n      devs:\n        clusters: ro\n",
            "bad",
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn test_rejects_repeated_identity() {
        let err = Expectations::from_yaml_str(
            "config:\n  kind:\n    serviceaccount:\n      sa-a:\n        cluster: ro\n      sa-a:\n        cluster: rw\n",
            "bad",
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
        assert!(err.to_string().contains("duplicate key \"sa-a\""), "{err}");
    }

    #[test]
    fn test_rejects_repeated_namespace_selector() {
        let err = Expectations::from_yaml_str(
            "config:\n  kind:\n    group:\n      devs:\n        namespaces:\n          team-*: dev\n          team-*: ops\n",
            "bad",
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate key \"team-*\""), "{err}");
    }

    #[test]
    fn test_rejects_malformed_yaml() {
        let err = Expectations::from_yaml_str("config: [unclosed", "bad").unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn test_empty_kind_table() {
        let expectations = Expectations::from_yaml_str("config:\n  kind:\n", "empty").unwrap();
        assert!(expectations.is_empty());
    }

    #[test]
    fn test_coverage_gaps() {
        let mut definitions = DefinitionStore::default();
        definitions.insert(
            ScopeKind::Cluster,
            AuthorizationLabel::new("dev-readonly"),
            vec![ProbeTemplate::new("get pods", Outcome::Yes)],
        );
        let gaps = expectations().coverage_gaps(&definitions);
        let described: Vec<_> = gaps.iter().map(|g| format!("{}/{}", g.scope, g.label)).collect();
        assert_eq!(
            described,
            [
                "cluster/ci-deployer",
                "namespaces/dev",
                "namespaces/dev-readonly",
                "cluster/audit",
            ]
        );
    }

    #[test]
    fn test_yaml_echo_reloads_identically() {
        let expectations = expectations();
        let echoed = expectations.to_yaml().unwrap();
        let reloaded = Expectations::from_yaml_str(&echoed, "echo").unwrap();
        assert_eq!(reloaded, expectations);
    }
}

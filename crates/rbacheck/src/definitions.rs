//! Definition store: the reusable library of probe templates.
//!
//! ```yaml
//! cluster:
//!   dev-readonly:
//!     - command: get namespaces
//!       expected: "yes"
//!     - command: delete namespaces
//!       expected: "no"
//! namespaces:
//!   dev:
//!     - command: get certificates
//!       expected: "yes"
//!       api-resource-exists: certificates
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::{LoadError, read_file};
use crate::model::{AuthorizationLabel, ProbeTemplate, ScopeKind};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DefinitionsFile {
    #[serde(default)]
    cluster: HashMap<AuthorizationLabel, Vec<ProbeTemplate>>,
    #[serde(default)]
    namespaces: HashMap<AuthorizationLabel, Vec<ProbeTemplate>>,
}

/// Probe templates keyed by scope kind and authorization label.
///
/// Templates are immutable once loaded; [`DefinitionStore::lookup`] hands out
/// owned copies.
#[derive(Debug, Clone, Default)]
pub struct DefinitionStore {
    cluster: HashMap<AuthorizationLabel, Vec<ProbeTemplate>>,
    namespaces: HashMap<AuthorizationLabel, Vec<ProbeTemplate>>,
}

impl DefinitionStore {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = read_file(path)?;
        Self::from_yaml_str(&text, &format!("definitions file {}", path.display()))
    }

    /// Parses a definitions document. `origin` names it in error messages.
    pub fn from_yaml_str(text: &str, origin: &str) -> Result<Self, LoadError> {
        let file: DefinitionsFile =
            serde_yaml::from_str(text).map_err(|source| LoadError::Parse {
                origin: origin.to_string(),
                source,
            })?;

        for (scope, table) in [
            (ScopeKind::Cluster, &file.cluster),
            (ScopeKind::Namespaces, &file.namespaces),
        ] {
            for (label, templates) in table {
                if let Some(blank) = templates.iter().find(|t| t.command.trim().is_empty()) {
                    return Err(LoadError::Invalid {
                        origin: origin.to_string(),
                        reason: format!(
                            "{scope}/{label} has a template with an empty command (expected {})",
                            blank.expected
                        ),
                    });
                }
            }
        }

        Ok(Self {
            cluster: file.cluster,
            namespaces: file.namespaces,
        })
    }

    /// Adds (or replaces) the templates for one scope/label pair.
    pub fn insert(
        &mut self,
        scope: ScopeKind,
        label: AuthorizationLabel,
        templates: Vec<ProbeTemplate>,
    ) {
        self.table_mut(scope).insert(label, templates);
    }

    /// Returns a fresh copy of the templates for `scope`/`label`.
    ///
    /// An unknown pair yields no templates and a warning; definitions may
    /// simply not cover every combination the expectations mention.
    pub fn lookup(&self, scope: ScopeKind, label: &AuthorizationLabel) -> Vec<ProbeTemplate> {
        match self.table(scope).get(label) {
            Some(templates) => templates.clone(),
            None => {
                warn!(%scope, %label, "No definitions for this scope and label");
                Vec::new()
            }
        }
    }

    pub fn covers(&self, scope: ScopeKind, label: &AuthorizationLabel) -> bool {
        self.table(scope).contains_key(label)
    }

    /// Number of templates across every label.
    pub fn template_count(&self) -> usize {
        self.cluster
            .values()
            .chain(self.namespaces.values())
            .map(Vec::len)
            .sum()
    }

    fn table(&self, scope: ScopeKind) -> &HashMap<AuthorizationLabel, Vec<ProbeTemplate>> {
        match scope {
            ScopeKind::Cluster => &self.cluster,
            ScopeKind::Namespaces => &self.namespaces,
        }
    }

    fn table_mut(
        &mut self,
        scope: ScopeKind,
    ) -> &mut HashMap<AuthorizationLabel, Vec<ProbeTemplate>> {
        match scope {
            ScopeKind::Cluster => &mut self.cluster,
            ScopeKind::Namespaces => &mut self.namespaces,
        }
    }
}

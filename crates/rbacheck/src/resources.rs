//! Resource existence filter.
//!
//! Templates may name a resource kind that only some clusters have (a CRD, an
//! optional API). Those templates are dropped when the kind is absent instead
//! of failing against a cluster that cannot serve them.

use std::collections::BTreeSet;

use tracing::info;

use crate::error::EngineError;
use crate::model::ProbeTemplate;
use crate::oracle::ClusterOracle;

/// Lowercase resource-kind tokens present in the cluster.
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    kinds: BTreeSet<String>,
}

impl ResourceFilter {
    pub fn new<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            kinds: kinds.into_iter().map(|k| k.as_ref().to_lowercase()).collect(),
        }
    }

    /// Gathers the resource kinds once from the cluster.
    pub fn discover<O: ClusterOracle + ?Sized>(oracle: &O) -> Result<Self, EngineError> {
        let kinds = oracle.list_resource_kinds().map_err(EngineError::Discovery)?;
        info!(count = kinds.len(), oracle = oracle.name(), "Discovered API resources");
        Ok(Self::new(kinds))
    }

    pub fn is_present(&self, kind: &str) -> bool {
        self.kinds.contains(&kind.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Keeps the templates whose resource guard (if any) is present.
    pub fn retain_applicable(&self, mut templates: Vec<ProbeTemplate>) -> Vec<ProbeTemplate> {
        templates.retain(|template| match &template.resource_guard {
            Some(kind) if !self.is_present(kind) => {
                info!(
                    resource = %kind,
                    command = %template.command,
                    "API resource does not exist in this cluster, skipping"
                );
                false
            }
            _ => true,
        });
        templates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Outcome;
    use crate::testing::ScriptedOracle;

    #[test]
    fn test_guard_is_case_insensitive() {
        let filter = ResourceFilter::new(["Pods", "certificates"]);
        assert!(filter.is_present("pods"));
        assert!(filter.is_present("Certificates"));
        assert!(!filter.is_present("issuers"));
    }

    #[test]
    fn test_retain_applicable_keeps_order() {
        let filter = ResourceFilter::new(["pods"]);
        let templates = vec![
            ProbeTemplate::new("get pods", Outcome::Yes).guarded_by("pods"),
            ProbeTemplate::new("get issuers", Outcome::No).guarded_by("issuers"),
            ProbeTemplate::new("get secrets", Outcome::No),
        ];
        let kept: Vec<_> = filter
            .retain_applicable(templates)
            .into_iter()
            .map(|t| t.command)
            .collect();
        assert_eq!(kept, ["get pods", "get secrets"]);
    }

    #[test]
    fn test_discover() {
        let oracle = ScriptedOracle::new().with_resource_kinds(["pods", "rolebindings"]);
        let filter = ResourceFilter::discover(&oracle).unwrap();
        assert_eq!(filter.len(), 2);
        assert!(filter.is_present("rolebindings"));
    }

    #[test]
    fn test_discover_failure_is_fatal() {
        let oracle = ScriptedOracle::new().failing_discovery();
        assert!(matches!(
            ResourceFilter::discover(&oracle),
            Err(EngineError::Discovery(_))
        ));
    }
}

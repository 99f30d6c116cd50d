//! Namespace resolution and temporary namespace lifecycle.
//!
//! A literal selector is used as-is when the namespace exists and skipped
//! otherwise. A pattern selector (`team-*`) is served by a temporary namespace
//! created on first use, named after the pattern plus a timestamp, and reused
//! for every later reference in the same run.
//!
//! The resolver owns the registry of temporary namespaces. Whatever is still
//! registered when the resolver is dropped gets deleted, so an aborted run
//! does not leave namespaces behind.

use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{debug, error, info, warn};

use crate::cancel::CancelToken;
use crate::error::EngineError;
use crate::model::{NamespaceSelector, ResolvedScope, WILDCARD};
use crate::oracle::ClusterOracle;

/// RoleBinding the policy controller creates in every new namespace.
pub const DEFAULT_READINESS_ROLE_BINDING: &str = "valstro:groups:dev-n:cluster-admin";

/// How long to wait for a fresh namespace to receive its access bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessWait {
    pub role_binding: String,
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for ReadinessWait {
    fn default() -> Self {
        Self {
            role_binding: DEFAULT_READINESS_ROLE_BINDING.to_string(),
            attempts: 20,
            interval: Duration::from_secs(1),
        }
    }
}

/// Outcome of resolving one namespace selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ResolvedScope),
    /// The literal namespace is not in this cluster.
    Skip,
}

/// Pattern selector to provisioned namespace, in creation order.
#[derive(Debug, Clone, Default)]
pub struct TemporaryNamespaceRegistry {
    entries: Vec<(String, String)>,
}

impl TemporaryNamespaceRegistry {
    pub fn get(&self, selector: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(pattern, _)| pattern == selector)
            .map(|(_, namespace)| namespace.as_str())
    }

    fn insert(&mut self, selector: String, namespace: String) {
        self.entries.push((selector, namespace));
    }

    fn drain(&mut self) -> Vec<(String, String)> {
        std::mem::take(&mut self.entries)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, namespace)| namespace.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A temporary namespace whose deletion failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupFailure {
    pub namespace: String,
    pub error: String,
}

/// Result of deleting every temporary namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Teardown {
    pub deleted: Vec<String>,
    pub failures: Vec<CleanupFailure>,
}

/// Builds the temporary namespace name for a pattern, e.g.
/// `team-*` at 2024-03-01 12:00:00 becomes `team-20240301120000`.
pub fn temporary_name(pattern: &str, now: DateTime<Local>) -> String {
    format!(
        "{}{}",
        pattern.replace(WILDCARD, ""),
        now.format("%Y%m%d%H%M%S")
    )
}

/// Resolves namespace selectors against the cluster.
pub struct NamespaceResolver<'o, O: ClusterOracle + ?Sized> {
    oracle: &'o O,
    registry: TemporaryNamespaceRegistry,
    readiness: ReadinessWait,
    cancel: CancelToken,
    clock: fn() -> DateTime<Local>,
}

impl<'o, O: ClusterOracle + ?Sized> NamespaceResolver<'o, O> {
    pub fn new(oracle: &'o O) -> Self {
        Self {
            oracle,
            registry: TemporaryNamespaceRegistry::default(),
            readiness: ReadinessWait::default(),
            cancel: CancelToken::new(),
            clock: Local::now,
        }
    }

    pub fn with_readiness(mut self, readiness: ReadinessWait) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Local>) -> Self {
        self.clock = clock;
        self
    }

    pub fn registry(&self) -> &TemporaryNamespaceRegistry {
        &self.registry
    }

    /// Resolves a selector to a concrete namespace, or to a skip.
    ///
    /// Only a failed namespace creation is an error.
    pub fn resolve(&mut self, selector: &NamespaceSelector) -> Result<Resolution, EngineError> {
        match selector {
            NamespaceSelector::Literal(name) => Ok(self.resolve_literal(name)),
            NamespaceSelector::Pattern(pattern) => self.resolve_pattern(pattern),
        }
    }

    fn resolve_literal(&self, name: &str) -> Resolution {
        match self.oracle.namespace_exists(name) {
            Ok(true) => Resolution::Resolved(ResolvedScope::Namespace(name.to_string())),
            Ok(false) => {
                info!(
                    namespace = %name,
                    "Namespace does not exist in this cluster and will be ignored"
                );
                Resolution::Skip
            }
            Err(e) => {
                warn!(namespace = %name, error = %e, "Could not check namespace, ignoring it");
                Resolution::Skip
            }
        }
    }

    fn resolve_pattern(&mut self, pattern: &str) -> Result<Resolution, EngineError> {
        if let Some(namespace) = self.registry.get(pattern) {
            debug!(%pattern, %namespace, "Reusing temporary namespace");
            return Ok(Resolution::Resolved(ResolvedScope::Namespace(
                namespace.to_string(),
            )));
        }

        let namespace = temporary_name(pattern, (self.clock)());
        info!(%pattern, %namespace, "Creating temporary namespace");
        self.oracle
            .create_namespace(&namespace)
            .map_err(|source| EngineError::NamespaceCreation {
                namespace: namespace.clone(),
                source,
            })?;
        // Registered before waiting so an interrupted wait still cleans up.
        self.registry.insert(pattern.to_string(), namespace.clone());

        self.wait_for_readiness(&namespace);
        Ok(Resolution::Resolved(ResolvedScope::Namespace(namespace)))
    }

    /// Polls for the readiness RoleBinding. Never fails: a namespace that
    /// never becomes ready shows up as discrepancies downstream.
    fn wait_for_readiness(&self, namespace: &str) -> bool {
        let ReadinessWait {
            role_binding,
            attempts,
            interval,
        } = &self.readiness;
        info!(
            %namespace,
            %role_binding,
            attempts,
            "Waiting for the policy controller to create the RoleBinding"
        );

        for attempt in 1..=*attempts {
            if self.cancel.is_cancelled() {
                warn!(%namespace, attempt, "Readiness wait cancelled");
                return false;
            }
            match self.oracle.role_binding_exists(role_binding, namespace) {
                Ok(true) => {
                    info!(%namespace, %role_binding, attempt, "RoleBinding is present");
                    return true;
                }
                Ok(false) => debug!(%namespace, attempt, "Waiting..."),
                Err(e) => debug!(%namespace, attempt, error = %e, "RoleBinding check failed"),
            }
            if attempt < *attempts {
                thread::sleep(*interval);
            }
        }

        warn!(
            %namespace,
            %role_binding,
            attempts,
            "RoleBinding did not appear, probing anyway"
        );
        false
    }

    /// Deletes every temporary namespace. Failures are logged and returned,
    /// never raised.
    pub fn teardown(&mut self) -> Teardown {
        let mut teardown = Teardown::default();
        for (pattern, namespace) in self.registry.drain() {
            info!(%pattern, %namespace, "Deleting temporary namespace");
            match self.oracle.delete_namespace(&namespace) {
                Ok(()) => {
                    info!(%namespace, "Temporary namespace deleted");
                    teardown.deleted.push(namespace);
                }
                Err(e) => {
                    error!(%namespace, error = %e, "Failed to delete temporary namespace");
                    teardown.failures.push(CleanupFailure {
                        namespace,
                        error: e.to_string(),
                    });
                }
            }
        }
        teardown
    }
}

impl<O: ClusterOracle + ?Sized> Drop for NamespaceResolver<'_, O> {
    fn drop(&mut self) {
        if !self.registry.is_empty() {
            warn!(
                count = self.registry.len(),
                "Releasing temporary namespaces left by an unfinished run"
            );
            self.teardown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedOracle;
    use chrono::TimeZone;

    fn fixed_clock() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn quick_wait() -> ReadinessWait {
        ReadinessWait {
            interval: Duration::ZERO,
            ..ReadinessWait::default()
        }
    }

    fn resolver(oracle: &ScriptedOracle) -> NamespaceResolver<'_, ScriptedOracle> {
        NamespaceResolver::new(oracle)
            .with_readiness(quick_wait())
            .with_clock(fixed_clock)
    }

    #[test]
    fn test_temporary_name() {
        assert_eq!(temporary_name("team-*", fixed_clock()), "team-20240301120000");
        assert_eq!(temporary_name("*", fixed_clock()), "20240301120000");
    }

    #[test]
    fn test_literal_existing_namespace() {
        let oracle = ScriptedOracle::new().with_namespace("payments");
        let mut resolver = resolver(&oracle);
        let resolution = resolver
            .resolve(&NamespaceSelector::parse("payments"))
            .unwrap();
        assert_eq!(
            resolution,
            Resolution::Resolved(ResolvedScope::Namespace("payments".to_string()))
        );
        assert!(oracle.created().is_empty());
    }

    #[test]
    fn test_literal_missing_namespace_is_skipped() {
        let oracle = ScriptedOracle::new();
        let mut resolver = resolver(&oracle);
        let resolution = resolver
            .resolve(&NamespaceSelector::parse("payments"))
            .unwrap();
        assert_eq!(resolution, Resolution::Skip);
    }

    #[test]
    fn test_pattern_is_provisioned_once() {
        let oracle = ScriptedOracle::new().role_binding_ready_after(1);
        let mut resolver = resolver(&oracle);
        let selector = NamespaceSelector::parse("team-*");

        let first = resolver.resolve(&selector).unwrap();
        let second = resolver.resolve(&selector).unwrap();

        assert_eq!(first, second);
        assert_eq!(oracle.created(), ["team-20240301120000"]);
        assert_eq!(oracle.role_binding_polls(), 1);
    }

    #[test]
    fn test_readiness_wait_is_bounded() {
        let oracle = ScriptedOracle::new();
        let mut resolver = resolver(&oracle);
        let resolution = resolver.resolve(&NamespaceSelector::parse("team-*")).unwrap();
        assert!(matches!(resolution, Resolution::Resolved(_)));
        assert_eq!(oracle.role_binding_polls(), 20);
        assert!(oracle.role_binding_checks().iter().all(|(binding, namespace)| {
            binding == DEFAULT_READINESS_ROLE_BINDING && namespace == "team-20240301120000"
        }));
    }

    #[test]
    fn test_readiness_polls_configured_binding_in_new_namespace() {
        let oracle = ScriptedOracle::new().role_binding_ready_after(2);
        let mut resolver = resolver(&oracle).with_readiness(ReadinessWait {
            role_binding: "platform:tenant-admin".to_string(),
            attempts: 5,
            interval: Duration::ZERO,
        });
        resolver.resolve(&NamespaceSelector::parse("ops-*")).unwrap();

        let expected = ("platform:tenant-admin".to_string(), "ops-20240301120000".to_string());
        assert_eq!(oracle.role_binding_checks(), [expected.clone(), expected]);
    }

    #[test]
    fn test_readiness_stops_when_binding_appears() {
        let oracle = ScriptedOracle::new().role_binding_ready_after(3);
        let mut resolver = resolver(&oracle);
        resolver.resolve(&NamespaceSelector::parse("team-*")).unwrap();
        assert_eq!(oracle.role_binding_polls(), 3);
    }

    #[test]
    fn test_cancelled_wait_stops_polling() {
        let oracle = ScriptedOracle::new();
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut resolver = resolver(&oracle).with_cancel_token(cancel);
        resolver.resolve(&NamespaceSelector::parse("team-*")).unwrap();
        assert_eq!(oracle.role_binding_polls(), 0);
        assert_eq!(resolver.registry().len(), 1);
    }

    #[test]
    fn test_create_failure_is_fatal() {
        let oracle = ScriptedOracle::new().failing_creates();
        let mut resolver = resolver(&oracle);
        let err = resolver
            .resolve(&NamespaceSelector::parse("team-*"))
            .unwrap_err();
        assert!(matches!(err, EngineError::NamespaceCreation { .. }));
        assert!(resolver.registry().is_empty());
    }

    #[test]
    fn test_teardown_reports_failures() {
        let oracle = ScriptedOracle::new()
            .role_binding_ready_after(1)
            .failing_deletes();
        let mut resolver = resolver(&oracle);
        resolver.resolve(&NamespaceSelector::parse("team-*")).unwrap();

        let teardown = resolver.teardown();
        assert!(teardown.deleted.is_empty());
        assert_eq!(teardown.failures.len(), 1);
        assert_eq!(teardown.failures[0].namespace, "team-20240301120000");
        assert!(resolver.registry().is_empty());
    }

    #[test]
    fn test_drop_releases_namespaces() {
        let oracle = ScriptedOracle::new().role_binding_ready_after(1);
        {
            let mut resolver = resolver(&oracle);
            resolver.resolve(&NamespaceSelector::parse("team-*")).unwrap();
            resolver.resolve(&NamespaceSelector::parse("ops-*")).unwrap();
        }
        assert_eq!(
            oracle.deleted(),
            ["team-20240301120000", "ops-20240301120000"]
        );
    }

    #[test]
    fn test_explicit_teardown_is_not_repeated_on_drop() {
        let oracle = ScriptedOracle::new().role_binding_ready_after(1);
        {
            let mut resolver = resolver(&oracle);
            resolver.resolve(&NamespaceSelector::parse("team-*")).unwrap();
            assert_eq!(resolver.teardown().deleted.len(), 1);
        }
        assert_eq!(oracle.deleted().len(), 1);
    }
}

//! Reconciliation: drives a full verification pass and produces the report.

use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::compiler::compile;
use crate::definitions::DefinitionStore;
use crate::error::EngineError;
use crate::expectations::Expectations;
use crate::model::{Discrepancy, ResolvedScope, ScopeSelector};
use crate::namespaces::{CleanupFailure, NamespaceResolver, ReadinessWait, Resolution};
use crate::oracle::ClusterOracle;
use crate::resources::ResourceFilter;
use crate::runner::{ProbeObserver, run};

/// Final state of a run, mapped onto the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every probe matched.
    Passed,
    /// At least one discrepancy, or the run was interrupted.
    Failed,
}

impl RunStatus {
    pub fn exit_code(self) -> u8 {
        match self {
            RunStatus::Passed => 0,
            RunStatus::Failed => 1,
        }
    }
}

/// Everything a run observed.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub probes_run: usize,
    pub discrepancies: Vec<Discrepancy>,
    /// Literal namespaces that are not in this cluster.
    pub skipped_namespaces: Vec<String>,
    /// Temporary namespaces created and deleted during the run.
    pub temporary_namespaces: Vec<String>,
    pub cleanup_failures: Vec<CleanupFailure>,
    pub cancelled: bool,
}

impl Report {
    /// Cleanup failures are reported but never change the status.
    pub fn status(&self) -> RunStatus {
        if self.discrepancies.is_empty() && !self.cancelled {
            RunStatus::Passed
        } else {
            RunStatus::Failed
        }
    }
}

/// Runs every expectation against the cluster.
pub struct Verifier<'a, O: ClusterOracle + ?Sized> {
    oracle: &'a O,
    definitions: &'a DefinitionStore,
    resources: &'a ResourceFilter,
    readiness: ReadinessWait,
    cancel: CancelToken,
}

impl<'a, O: ClusterOracle + ?Sized> Verifier<'a, O> {
    pub fn new(
        oracle: &'a O,
        definitions: &'a DefinitionStore,
        resources: &'a ResourceFilter,
    ) -> Self {
        Self {
            oracle,
            definitions,
            resources,
            readiness: ReadinessWait::default(),
            cancel: CancelToken::new(),
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

    /// Processes every entry in source order, then deletes the temporary
    /// namespaces.
    ///
    /// Only a failed namespace creation aborts; the resolver still deletes
    /// whatever it had created when it is dropped on that path.
    pub fn run_all(
        &self,
        expectations: &Expectations,
        observer: &mut dyn ProbeObserver,
    ) -> Result<Report, EngineError> {
        let mut resolver = NamespaceResolver::new(self.oracle)
            .with_readiness(self.readiness.clone())
            .with_cancel_token(self.cancel.clone());
        let mut report = Report::default();

        for entry in expectations.entries() {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            info!(identity = %entry.identity, scopes = entry.scopes.len(), "Checking identity");
            observer.identity_started(&entry.identity);

            let mut probes = Vec::new();
            for scope in &entry.scopes {
                let resolved = match &scope.selector {
                    ScopeSelector::Cluster => ResolvedScope::Cluster,
                    ScopeSelector::Namespace(selector) => match resolver.resolve(selector)? {
                        Resolution::Resolved(resolved) => resolved,
                        Resolution::Skip => {
                            report.skipped_namespaces.push(selector.to_string());
                            continue;
                        }
                    },
                };

                let templates = self.definitions.lookup(scope.selector.kind(), &scope.label);
                let templates = self.resources.retain_applicable(templates);
                probes.extend(compile(&entry.identity, &resolved, templates));
            }

            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            report.probes_run += probes.len();
            report
                .discrepancies
                .extend(run(self.oracle, probes, observer));
        }

        if report.cancelled {
            warn!("Run interrupted, remaining expectations were not checked");
        }

        let teardown = resolver.teardown();
        report.temporary_namespaces = teardown.deleted;
        report
            .temporary_namespaces
            .extend(teardown.failures.iter().map(|f| f.namespace.clone()));
        report.cleanup_failures = teardown.failures;

        info!(
            probes = report.probes_run,
            discrepancies = report.discrepancies.len(),
            "Run complete"
        );
        Ok(report)
    }
}

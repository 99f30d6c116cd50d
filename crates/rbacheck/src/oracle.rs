//! The cluster collaborator every verification pass talks to.
//!
//! The engine never decides RBAC questions itself. It asks a [`ClusterOracle`]
//! and compares the answer against the expectation. [`KubectlOracle`] shells
//! out to `kubectl`; `ScriptedOracle` (behind the `testing` feature) answers
//! from memory for tests.
//!
//! [`KubectlOracle`]: crate::kubectl::KubectlOracle

use std::collections::BTreeSet;

use crate::model::CompiledProbe;

/// Narrow interface to a live (or simulated) cluster.
///
/// Methods take `&self`; implementations that record calls use interior
/// mutability. Calls are made strictly sequentially.
pub trait ClusterOracle {
    /// Evaluates a probe and returns the raw textual answer (`yes` / `no`).
    fn check_permission(&self, probe: &CompiledProbe) -> Result<String, OracleError>;

    fn namespace_exists(&self, name: &str) -> Result<bool, OracleError>;

    fn create_namespace(&self, name: &str) -> Result<(), OracleError>;

    fn delete_namespace(&self, name: &str) -> Result<(), OracleError>;

    fn role_binding_exists(&self, name: &str, namespace: &str) -> Result<bool, OracleError>;

    /// Lowercase resource-kind tokens known to the cluster (e.g. `pods`).
    fn list_resource_kinds(&self) -> Result<BTreeSet<String>, OracleError>;

    /// Name of this oracle (for logging).
    fn name(&self) -> &'static str;
}

/// Errors that can occur while talking to the cluster.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// The command could not be started at all.
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// The command ran but reported failure.
    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// Scripted failure from an in-memory oracle.
    #[error("Simulated failure: {0}")]
    Simulated(String),
}

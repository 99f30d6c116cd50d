//! # rbacheck: Kubernetes RBAC verification
//!
//! Checks that a cluster's RBAC policy matches an expected authorization
//! matrix by impersonating service accounts and groups and asking the cluster
//! `can-i` questions whose answers are known in advance.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────┐   ┌────────────────────┐
//! │  Expectations      │   │  DefinitionStore   │
//! │  (kind, identity)  │   │  (scope, label)    │
//! │   → scope → label  │   │   → [templates]    │
//! └─────────┬──────────┘   └─────────┬──────────┘
//!           │                        │
//!           ▼                        ▼
//! ┌─────────────────────────────────────────────┐
//! │  Verifier                                    │
//! │  ├─ NamespaceResolver (skip / reuse / create)│
//! │  ├─ ResourceFilter (drop absent kinds)       │
//! │  ├─ compile (impersonation + namespace)      │
//! │  └─ run (oracle answer vs expected)          │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Report: discrepancies → exit status         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use rbacheck::testing::ScriptedOracle;
//! use rbacheck::{DefinitionStore, Expectations, ResourceFilter, RunStatus, Verifier};
//!
//! let definitions = DefinitionStore::from_yaml_str(
//!     "cluster:\n  ro:\n    - command: get pods\n      expected: \"yes\"\n",
//!     "definitions",
//! )?;
//! let expectations = Expectations::from_yaml_str(
//!     "config:\n  kind:\n    serviceaccount:\n      sa-a:\n        cluster: ro\n",
//!     "expectations",
//! )?;
//!
//! let oracle = ScriptedOracle::new().answering("yes");
//! let resources = ResourceFilter::discover(&oracle)?;
//! let report = Verifier::new(&oracle, &definitions, &resources).run_all(&expectations, &mut ())?;
//!
//! assert_eq!(report.status(), RunStatus::Passed);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Execution is strictly sequential: entries, scopes and probes run in source
//! order, so the transcript of two runs against the same cluster diffs cleanly.

pub mod cancel;
pub mod compiler;
pub mod definitions;
pub mod engine;
pub mod error;
pub mod expectations;
pub mod kubectl;
pub mod model;
pub mod namespaces;
pub mod oracle;
pub mod resources;
pub mod runner;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

mod ordered;

// Re-export commonly used types
pub use cancel::CancelToken;
pub use compiler::compile;
pub use definitions::DefinitionStore;
pub use engine::{Report, RunStatus, Verifier};
pub use error::{EngineError, LoadError};
pub use expectations::{CoverageGap, ExpectationEntry, Expectations, ScopeExpectation};
pub use kubectl::KubectlOracle;
pub use model::{
    AuthorizationLabel, CompiledProbe, Discrepancy, Identity, IdentityKind, NamespaceSelector,
    Outcome, ProbeResult, ProbeTemplate, ResolvedScope, ScopeKind, ScopeSelector, Verdict,
};
pub use namespaces::{NamespaceResolver, ReadinessWait, Resolution, TemporaryNamespaceRegistry};
pub use oracle::{ClusterOracle, OracleError};
pub use resources::ResourceFilter;
pub use runner::{ProbeObserver, run};

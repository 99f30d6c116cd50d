//! Data types shared by every stage of a verification pass.
//!
//! Everything here is plain data: templates come out of the definition
//! library, identities and selectors come out of the expectation matrix, and
//! compiled probes are what the oracle ultimately evaluates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Program used in the rendered form of every compiled probe.
pub const KUBECTL: &str = "kubectl";

/// User impersonated when checking a group's permissions.
pub const ANONYMOUS_USER: &str = "any:user";

/// Marker that turns a namespace selector into a pattern.
pub const WILDCARD: char = '*';

/// Key into the definition library, e.g. `dev-readonly`.
///
/// Labels have no inner structure; equality is exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorizationLabel(String);

impl AuthorizationLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorizationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of identity whose permissions are probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    /// Impersonated directly with `--as`.
    ServiceAccount,
    /// Impersonated as an anonymous user carrying the group.
    Group,
}

impl IdentityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityKind::ServiceAccount => "serviceaccount",
            IdentityKind::Group => "group",
        }
    }
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An impersonated identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub kind: IdentityKind,
    pub name: String,
}

impl Identity {
    pub fn new(kind: IdentityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn service_account(name: impl Into<String>) -> Self {
        Self::new(IdentityKind::ServiceAccount, name)
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(IdentityKind::Group, name)
    }

    /// Returns the `kubectl` flags that impersonate this identity.
    pub fn impersonation_args(&self) -> Vec<String> {
        match self.kind {
            IdentityKind::ServiceAccount => vec![format!("--as={}", self.name)],
            IdentityKind::Group => vec![
                format!("--as={ANONYMOUS_USER}"),
                format!("--as-group={}", self.name),
            ],
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

/// Answer a permission check is expected to give.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Yes,
    No,
}

impl Outcome {
    /// Canonical textual form, as printed by `kubectl auth can-i`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Yes => "yes",
            Outcome::No => "no",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which half of the definition library a scope draws templates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    Cluster,
    Namespaces,
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKind::Cluster => f.write_str("cluster"),
            ScopeKind::Namespaces => f.write_str("namespaces"),
        }
    }
}

/// A namespace entry from the expectation matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NamespaceSelector {
    /// A concrete namespace that may or may not exist in the cluster.
    Literal(String),
    /// A pattern such as `team-*`, served by a temporary namespace.
    Pattern(String),
}

impl NamespaceSelector {
    pub fn parse(selector: &str) -> Self {
        if selector.contains(WILDCARD) {
            NamespaceSelector::Pattern(selector.to_string())
        } else {
            NamespaceSelector::Literal(selector.to_string())
        }
    }

    /// The selector exactly as written in the expectation matrix.
    pub fn as_str(&self) -> &str {
        match self {
            NamespaceSelector::Literal(s) | NamespaceSelector::Pattern(s) => s,
        }
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, NamespaceSelector::Pattern(_))
    }
}

impl fmt::Display for NamespaceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an expectation applies, before resolution against the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeSelector {
    Cluster,
    Namespace(NamespaceSelector),
}

impl ScopeSelector {
    pub fn kind(&self) -> ScopeKind {
        match self {
            ScopeSelector::Cluster => ScopeKind::Cluster,
            ScopeSelector::Namespace(_) => ScopeKind::Namespaces,
        }
    }
}

impl fmt::Display for ScopeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeSelector::Cluster => f.write_str("cluster"),
            ScopeSelector::Namespace(selector) => write!(f, "namespace {selector}"),
        }
    }
}

/// Concrete scope a probe runs against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolvedScope {
    Cluster,
    Namespace(String),
}

impl ResolvedScope {
    pub fn namespace(&self) -> Option<&str> {
        match self {
            ResolvedScope::Cluster => None,
            ResolvedScope::Namespace(name) => Some(name),
        }
    }
}

impl fmt::Display for ResolvedScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedScope::Cluster => f.write_str("cluster"),
            ResolvedScope::Namespace(name) => f.write_str(name),
        }
    }
}

/// One reusable permission check from the definition library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeTemplate {
    /// Verb and resource, e.g. `get pods` or `list secrets -A`.
    pub command: String,

    pub expected: Outcome,

    /// Resource kind that must exist in the cluster for the probe to apply.
    #[serde(
        rename = "api-resource-exists",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub resource_guard: Option<String>,
}

impl ProbeTemplate {
    pub fn new(command: impl Into<String>, expected: Outcome) -> Self {
        Self {
            command: command.into(),
            expected,
            resource_guard: None,
        }
    }

    pub fn guarded_by(mut self, resource_kind: impl Into<String>) -> Self {
        self.resource_guard = Some(resource_kind.into());
        self
    }
}

/// A fully resolved permission check.
///
/// `args` is everything after the `kubectl` program name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledProbe {
    args: Vec<String>,
    expected: Outcome,
}

impl CompiledProbe {
    pub(crate) fn new(args: Vec<String>, expected: Outcome) -> Self {
        Self { args, expected }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn expected(&self) -> Outcome {
        self.expected
    }

    /// The full command line as it appears in the transcript.
    pub fn command(&self) -> String {
        let mut command = String::from(KUBECTL);
        for arg in &self.args {
            command.push(' ');
            command.push_str(arg);
        }
        command
    }
}

impl fmt::Display for CompiledProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command())
    }
}

/// Result of evaluating one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Failure,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Success => f.write_str("Success"),
            Verdict::Failure => f.write_str("Failure"),
        }
    }
}

/// A probe together with what the oracle actually answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub probe: CompiledProbe,
    pub actual: String,
    pub verdict: Verdict,
}

/// A probe whose answer differed from its expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discrepancy {
    pub probe: CompiledProbe,
    pub actual: String,
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Expected {}, but returns {}. {}",
            self.probe.expected(),
            self.actual,
            self.probe.command()
        )
    }
}

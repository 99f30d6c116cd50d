//! In-memory cluster oracle with scripted answers.
//!
//! Used by the unit and scenario tests to exercise the whole engine without a
//! cluster. Every mutating call is recorded so tests can assert on how many
//! namespaces were created and deleted.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::model::CompiledProbe;
use crate::oracle::{ClusterOracle, OracleError};

/// Scripted stand-in for a cluster.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    default_answer: Option<String>,
    answers: HashMap<String, String>,
    sequence: RefCell<VecDeque<Option<String>>>,
    namespaces: RefCell<BTreeSet<String>>,
    resource_kinds: BTreeSet<String>,
    role_binding_ready_after: Option<usize>,
    fail_creates: bool,
    fail_deletes: bool,
    fail_discovery: bool,

    checked: RefCell<Vec<String>>,
    created: RefCell<Vec<String>>,
    deleted: RefCell<Vec<String>>,
    role_binding_polls: RefCell<Vec<(String, String)>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every permission check with `answer` unless scripted otherwise.
    pub fn answering(mut self, answer: impl Into<String>) -> Self {
        self.default_answer = Some(answer.into());
        self
    }

    /// Answer the probe rendering to `command` with `answer`.
    pub fn answer(mut self, command: impl Into<String>, answer: impl Into<String>) -> Self {
        self.answers.insert(command.into(), answer.into());
        self
    }

    /// Consume these answers in order before falling back; `None` is a failed check.
    pub fn with_answer_sequence(self, answers: impl IntoIterator<Item = Option<String>>) -> Self {
        self.sequence.borrow_mut().extend(answers);
        self
    }

    pub fn with_namespace(self, name: impl Into<String>) -> Self {
        self.namespaces.borrow_mut().insert(name.into());
        self
    }

    pub fn with_resource_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource_kinds = kinds.into_iter().map(Into::into).collect();
        self
    }

    /// The readiness RoleBinding shows up on poll number `polls` (1-based),
    /// provided the polled namespace exists.
    pub fn role_binding_ready_after(mut self, polls: usize) -> Self {
        self.role_binding_ready_after = Some(polls);
        self
    }

    pub fn failing_creates(mut self) -> Self {
        self.fail_creates = true;
        self
    }

    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn failing_discovery(mut self) -> Self {
        self.fail_discovery = true;
        self
    }

    /// Commands of every permission check, in call order.
    pub fn checked(&self) -> Vec<String> {
        self.checked.borrow().clone()
    }

    pub fn created(&self) -> Vec<String> {
        self.created.borrow().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.borrow().clone()
    }

    pub fn role_binding_polls(&self) -> usize {
        self.role_binding_polls.borrow().len()
    }

    /// `(role binding, namespace)` of every readiness poll, in call order.
    pub fn role_binding_checks(&self) -> Vec<(String, String)> {
        self.role_binding_polls.borrow().clone()
    }
}

impl ClusterOracle for ScriptedOracle {
    fn check_permission(&self, probe: &CompiledProbe) -> Result<String, OracleError> {
        let command = probe.command();
        self.checked.borrow_mut().push(command.clone());

        if let Some(next) = self.sequence.borrow_mut().pop_front() {
            return next.ok_or_else(|| OracleError::Simulated(command));
        }
        self.answers
            .get(&command)
            .or(self.default_answer.as_ref())
            .map(|answer| format!("{answer}\n"))
            .ok_or(OracleError::Simulated(command))
    }

    fn namespace_exists(&self, name: &str) -> Result<bool, OracleError> {
        Ok(self.namespaces.borrow().contains(name))
    }

    fn create_namespace(&self, name: &str) -> Result<(), OracleError> {
        if self.fail_creates {
            return Err(OracleError::Simulated(format!("create namespace {name}")));
        }
        self.created.borrow_mut().push(name.to_string());
        self.namespaces.borrow_mut().insert(name.to_string());
        Ok(())
    }

    fn delete_namespace(&self, name: &str) -> Result<(), OracleError> {
        self.deleted.borrow_mut().push(name.to_string());
        if self.fail_deletes {
            return Err(OracleError::Simulated(format!("delete namespace {name}")));
        }
        self.namespaces.borrow_mut().remove(name);
        Ok(())
    }

    fn role_binding_exists(&self, name: &str, namespace: &str) -> Result<bool, OracleError> {
        let polls = {
            let mut checks = self.role_binding_polls.borrow_mut();
            checks.push((name.to_string(), namespace.to_string()));
            checks.len()
        };
        Ok(self.namespaces.borrow().contains(namespace)
            && self
                .role_binding_ready_after
                .is_some_and(|ready| polls >= ready))
    }

    fn list_resource_kinds(&self) -> Result<BTreeSet<String>, OracleError> {
        if self.fail_discovery {
            return Err(OracleError::Simulated("api-resources".to_string()));
        }
        Ok(self.resource_kinds.clone())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

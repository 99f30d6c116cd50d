//! `kubectl`-backed cluster oracle.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::{Command, Output};

use tracing::debug;

use crate::model::CompiledProbe;
use crate::oracle::{ClusterOracle, OracleError};

/// Runs every cluster query as a `kubectl` subprocess.
#[derive(Debug, Clone)]
pub struct KubectlOracle {
    binary: PathBuf,
    context: Option<String>,
    kubeconfig: Option<PathBuf>,
}

impl KubectlOracle {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            context: None,
            kubeconfig: None,
        }
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    pub fn with_kubeconfig(mut self, kubeconfig: Option<PathBuf>) -> Self {
        self.kubeconfig = kubeconfig;
        self
    }

    /// Global flags placed before every subcommand.
    fn global_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(kubeconfig) = &self.kubeconfig {
            args.push(format!("--kubeconfig={}", kubeconfig.display()));
        }
        if let Some(context) = &self.context {
            args.push(format!("--context={context}"));
        }
        args
    }

    fn run<S: AsRef<str>>(&self, args: &[S]) -> Result<Output, OracleError> {
        let mut command = Command::new(&self.binary);
        command.args(self.global_args());
        command.args(args.iter().map(AsRef::as_ref));
        debug!(command = %self.render(args), "Running kubectl");
        command.output().map_err(|source| OracleError::Spawn {
            program: self.binary.display().to_string(),
            source,
        })
    }

    fn render<S: AsRef<str>>(&self, args: &[S]) -> String {
        let mut rendered = self.binary.display().to_string();
        for arg in self.global_args().iter().map(String::as_str).chain(args.iter().map(AsRef::as_ref)) {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }

    fn failed<S: AsRef<str>>(&self, args: &[S], output: &Output) -> OracleError {
        OracleError::CommandFailed {
            command: self.render(args),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }

    /// `get <kind> <name>`: true on success, false on NotFound.
    fn exists(&self, args: &[&str]) -> Result<bool, OracleError> {
        let output = self.run(args)?;
        if output.status.success() {
            return Ok(true);
        }
        if String::from_utf8_lossy(&output.stderr).contains("NotFound") {
            return Ok(false);
        }
        Err(self.failed(args, &output))
    }
}

impl Default for KubectlOracle {
    fn default() -> Self {
        Self::new("kubectl")
    }
}

impl ClusterOracle for KubectlOracle {
    fn check_permission(&self, probe: &CompiledProbe) -> Result<String, OracleError> {
        let output = self.run(probe.args())?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        // `auth can-i` exits non-zero when the answer is "no", so the exit
        // status alone does not signal failure; an empty answer does.
        if !output.status.success() && stdout.trim().is_empty() {
            return Err(self.failed(probe.args(), &output));
        }
        Ok(stdout)
    }

    fn namespace_exists(&self, name: &str) -> Result<bool, OracleError> {
        self.exists(&["get", "namespace", name, "-o", "name"])
    }

    fn create_namespace(&self, name: &str) -> Result<(), OracleError> {
        let args = ["create", "namespace", name];
        let output = self.run(&args)?;
        if output.status.success() {
            Ok(())
        } else {
            Err(self.failed(&args, &output))
        }
    }

    fn delete_namespace(&self, name: &str) -> Result<(), OracleError> {
        let args = ["delete", "namespace", name];
        let output = self.run(&args)?;
        if output.status.success() {
            Ok(())
        } else {
            Err(self.failed(&args, &output))
        }
    }

    fn role_binding_exists(&self, name: &str, namespace: &str) -> Result<bool, OracleError> {
        self.exists(&["get", "rolebinding", name, "-n", namespace, "-o", "name"])
    }

    fn list_resource_kinds(&self) -> Result<BTreeSet<String>, OracleError> {
        let args = ["api-resources", "--no-headers"];
        let output = self.run(&args)?;
        if !output.status.success() {
            return Err(self.failed(&args, &output));
        }
        Ok(parse_api_resources(&String::from_utf8_lossy(&output.stdout)))
    }

    fn name(&self) -> &'static str {
        "kubectl"
    }
}

/// Extracts the NAME column from `kubectl api-resources --no-headers`.
fn parse_api_resources(listing: &str) -> BTreeSet<String> {
    listing
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_lowercase)
        .collect()
}

//! Configuration management for rbacheck
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. CLI arguments (highest precedence, applied by the CLI)
//! 2. Environment variables (RBACHECK_* prefix)
//! 3. rbacheck.local.toml (gitignored, local overrides)
//! 4. rbacheck.toml (git-tracked, project config)
//! 5. ~/.config/rbacheck/config.toml (user defaults)
//! 6. Built-in defaults (lowest precedence)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Main rbacheck configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RbacheckConfig {
    pub inputs: InputsConfig,
    pub kubectl: KubectlConfig,
    pub provisioning: ProvisioningConfig,
    pub output: OutputConfig,
}

/// Locations of the expectation matrix and the definition library
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputsConfig {
    pub expectations: PathBuf,
    pub definitions: PathBuf,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            expectations: PathBuf::from("rbac.yaml"),
            definitions: PathBuf::from("definitions.yaml"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KubectlConfig {
    pub binary: PathBuf,
    pub context: Option<String>,
    pub kubeconfig: Option<PathBuf>,
}

impl Default for KubectlConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("kubectl"),
            context: None,
            kubeconfig: None,
        }
    }
}

/// Temporary namespace readiness wait
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    pub readiness_role_binding: String,
    pub poll_attempts: u32,
    pub poll_interval_secs: u64,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            readiness_role_binding: "valstro:groups:dev-n:cluster-admin".to_string(),
            poll_attempts: 20,
            poll_interval_secs: 1,
        }
    }
}

impl ProvisioningConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    pub echo_expectations: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_color: false,
            echo_expectations: true,
        }
    }
}

impl RbacheckConfig {
    /// Resolve relative input paths against the project directory
    pub fn resolve_paths(&mut self, base_dir: impl AsRef<Path>) {
        let base = base_dir.as_ref();

        if self.inputs.expectations.is_relative() {
            self.inputs.expectations = base.join(&self.inputs.expectations);
        }

        if self.inputs.definitions.is_relative() {
            self.inputs.definitions = base.join(&self.inputs.definitions);
        }
    }

    /// Reject values no run could work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kubectl.binary.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "kubectl.binary must not be empty".to_string(),
            ));
        }
        if self.provisioning.readiness_role_binding.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "provisioning.readiness_role_binding must not be empty".to_string(),
            ));
        }
        if self.provisioning.poll_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "provisioning.poll_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

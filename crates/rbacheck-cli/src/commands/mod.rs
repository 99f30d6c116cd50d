//! CLI command implementations.

pub mod check;
pub mod config;
pub mod run;
pub mod version;

use anyhow::{Context, Result};
use clap::Args;
use rbacheck_config::{ConfigLoader, RbacheckConfig};
use std::path::PathBuf;

/// Where to find the project and its input files.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Project directory holding rbacheck.toml.
    #[arg(short, long, default_value = ".")]
    pub project: PathBuf,

    /// Expectation matrix (overrides inputs.expectations).
    #[arg(short, long)]
    pub expectations: Option<PathBuf>,

    /// Definition library (overrides inputs.definitions).
    #[arg(short, long)]
    pub definitions: Option<PathBuf>,
}

/// Loads the merged configuration and applies command-line overrides.
pub fn load_config(inputs: &InputArgs) -> Result<RbacheckConfig> {
    let mut config = ConfigLoader::new()
        .with_project_dir(&inputs.project)
        .load()
        .context("Failed to load configuration")?;

    if let Some(expectations) = &inputs.expectations {
        config.inputs.expectations.clone_from(expectations);
    }
    if let Some(definitions) = &inputs.definitions {
        config.inputs.definitions.clone_from(definitions);
    }

    Ok(config)
}

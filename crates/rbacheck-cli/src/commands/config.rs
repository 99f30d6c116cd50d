//! Configuration inspection commands.

use anyhow::Result;
use std::process::ExitCode;

use super::{InputArgs, load_config};

/// Show the effective configuration after every source is merged.
pub fn show(inputs: &InputArgs, format: &str) -> Result<ExitCode> {
    let config = load_config(inputs)?;

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        "toml" => {
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{toml_str}");
        }
        _ => {
            println!("rbacheck Configuration");
            println!("======================\n");

            println!("Inputs:");
            println!("  Expectations: {}", config.inputs.expectations.display());
            println!("  Definitions: {}", config.inputs.definitions.display());
            println!();

            println!("Kubectl:");
            println!("  Binary: {}", config.kubectl.binary.display());
            println!(
                "  Context: {}",
                config.kubectl.context.as_deref().unwrap_or("(current)")
            );
            println!(
                "  Kubeconfig: {}",
                config
                    .kubectl
                    .kubeconfig
                    .as_ref()
                    .map_or("(default)".to_string(), |p| p.display().to_string())
            );
            println!();

            println!("Provisioning:");
            println!(
                "  Readiness RoleBinding: {}",
                config.provisioning.readiness_role_binding
            );
            println!("  Poll attempts: {}", config.provisioning.poll_attempts);
            println!(
                "  Poll interval: {}s",
                config.provisioning.poll_interval_secs
            );
            println!();

            println!("Output:");
            println!("  No color: {}", config.output.no_color);
            println!("  Echo expectations: {}", config.output.echo_expectations);
        }
    }

    Ok(ExitCode::SUCCESS)
}

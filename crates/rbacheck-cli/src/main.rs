//! rbacheck command line.
//!
//! Verifies that a cluster's RBAC matches an expected authorization matrix.
//!
//! # Quick Start
//!
//! ```bash
//! # Validate the input files offline
//! rbacheck check --expectations rbac.yaml --definitions definitions.yaml
//!
//! # Verify the current kubeconfig context
//! rbacheck run
//!
//! # Verify a specific context
//! rbacheck run --context staging
//! ```

mod commands;
mod style;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::InputArgs;
use commands::run::RunArgs;

/// rbacheck - verify Kubernetes RBAC against an expected authorization matrix.
#[derive(Parser)]
#[command(name = "rbacheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Run every expected permission check against the cluster.
    Run(RunArgs),

    /// Validate the input files without contacting a cluster.
    Check(InputArgs),

    /// Configuration commands.
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration.
    Show {
        #[command(flatten)]
        inputs: InputArgs,

        /// Output format (text, json, toml).
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so the stdout transcript stays diffable
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    style::set_no_color(cli.no_color);

    match dispatch(cli.command) {
        Ok(code) => code,
        Err(e) => {
            style::print_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn dispatch(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Version => {
            commands::version::run();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run(args) => commands::run::run(&args),
        Commands::Check(inputs) => commands::check::run(&inputs),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show { inputs, format } => commands::config::show(&inputs, &format),
        },
    }
}

//! The verification pass.

use anyhow::{Context, Result};
use clap::Args;
use rbacheck::{
    CancelToken, DefinitionStore, Expectations, KubectlOracle, ReadinessWait, Report,
    ResourceFilter, Verifier,
};
use signal_hook::consts::{SIGINT, SIGTERM};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use super::{InputArgs, load_config};
use crate::style::colors::SemanticStyle;
use crate::style::{
    Transcript, print_discrepancy_table, print_error, print_labeled, print_success, print_warn,
};

/// Options for `rbacheck run`.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// kubectl binary to invoke (overrides kubectl.binary).
    #[arg(long)]
    pub kubectl: Option<PathBuf>,

    /// kubeconfig context to verify (overrides kubectl.context).
    #[arg(long)]
    pub context: Option<String>,

    /// kubeconfig file (overrides kubectl.kubeconfig).
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,
}

pub fn run(args: &RunArgs) -> Result<ExitCode> {
    let mut config = load_config(&args.inputs)?;
    if let Some(kubectl) = &args.kubectl {
        config.kubectl.binary.clone_from(kubectl);
    }
    if args.context.is_some() {
        config.kubectl.context.clone_from(&args.context);
    }
    if args.kubeconfig.is_some() {
        config.kubectl.kubeconfig.clone_from(&args.kubeconfig);
    }
    if config.output.no_color {
        crate::style::set_no_color(true);
    }

    // Both inputs must load before anything touches the cluster.
    let expectations = Expectations::load(&config.inputs.expectations)
        .context("Failed to load expectations")?;
    let definitions = DefinitionStore::load(&config.inputs.definitions)
        .context("Failed to load definitions")?;
    info!(
        identities = expectations.len(),
        templates = definitions.template_count(),
        "Inputs loaded"
    );

    if config.output.echo_expectations {
        print!(
            "{}",
            expectations
                .to_yaml()
                .context("Failed to render expectations")?
        );
    }

    let cancel = CancelToken::new();
    for signal in [SIGINT, SIGTERM] {
        // A second signal while the first is being handled exits immediately.
        signal_hook::flag::register_conditional_shutdown(signal, 1, cancel.flag())
            .context("Failed to install signal handler")?;
        signal_hook::flag::register(signal, cancel.flag())
            .context("Failed to install signal handler")?;
    }

    let oracle = KubectlOracle::new(&config.kubectl.binary)
        .with_context(config.kubectl.context.clone())
        .with_kubeconfig(config.kubectl.kubeconfig.clone());
    let resources = ResourceFilter::discover(&oracle)?;

    let readiness = ReadinessWait {
        role_binding: config.provisioning.readiness_role_binding.clone(),
        attempts: config.provisioning.poll_attempts,
        interval: config.provisioning.poll_interval(),
    };
    let mut transcript = Transcript;
    let report = Verifier::new(&oracle, &definitions, &resources)
        .with_readiness(readiness)
        .with_cancel_token(cancel)
        .run_all(&expectations, &mut transcript)?;

    print_summary(&report);
    Ok(ExitCode::from(report.status().exit_code()))
}

fn print_summary(report: &Report) {
    println!();

    for namespace in &report.skipped_namespaces {
        print_warn(&format!("Namespace {namespace} does not exist and was skipped"));
    }
    for failure in &report.cleanup_failures {
        print_warn(&format!(
            "Temporary namespace {} was not deleted: {}",
            failure.namespace, failure.error
        ));
    }

    print_labeled("Probes run", &report.probes_run.to_string());
    if !report.temporary_namespaces.is_empty() {
        print_labeled(
            "Temporary namespaces",
            &report.temporary_namespaces.join(", "),
        );
    }
    println!();

    if report.cancelled {
        print_error("Run interrupted before every expectation was checked");
    }

    if report.discrepancies.is_empty() {
        if !report.cancelled {
            print_success("No error has been found.");
        }
        return;
    }

    println!("{}", "List of errors:".error());
    for discrepancy in &report.discrepancies {
        println!("{discrepancy}");
    }
    println!();
    print_discrepancy_table(&report.discrepancies);
}

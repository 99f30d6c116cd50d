//! Offline validation of the expectation matrix and definition library.

use anyhow::{Context, Result};
use rbacheck::{DefinitionStore, Expectations};
use std::process::ExitCode;

use super::{InputArgs, load_config};
use crate::style::{print_labeled, print_success, print_warn};

/// Loads both inputs and reports labels the definitions do not cover.
///
/// Load failures are errors; coverage gaps are warnings.
pub fn run(inputs: &InputArgs) -> Result<ExitCode> {
    let config = load_config(inputs)?;

    let expectations = Expectations::load(&config.inputs.expectations)
        .context("Failed to load expectations")?;
    print_success(&format!(
        "Loaded {} identities from {}",
        expectations.len(),
        config.inputs.expectations.display()
    ));

    let definitions = DefinitionStore::load(&config.inputs.definitions)
        .context("Failed to load definitions")?;
    print_success(&format!(
        "Loaded {} probe templates from {}",
        definitions.template_count(),
        config.inputs.definitions.display()
    ));

    let gaps = expectations.coverage_gaps(&definitions);
    if gaps.is_empty() {
        print_success("Every referenced label has definitions");
    } else {
        for gap in &gaps {
            print_warn(&format!(
                "No definitions for {}/{}, it will produce no probes",
                gap.scope, gap.label
            ));
        }
        print_labeled("Uncovered labels", &gaps.len().to_string());
    }

    Ok(ExitCode::SUCCESS)
}

//! Output helper functions for consistent styled messages.

use rbacheck::{Identity, ProbeResult, ProbeObserver, Verdict};

use super::colors::SemanticStyle;

const RULE: &str = "===========================";

/// Prints a success message with a checkmark.
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".success(), msg);
}

/// Prints an error message with an X mark.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".error(), msg);
}

/// Prints a warning message with a warning symbol.
pub fn print_warn(msg: &str) {
    println!("{} {}", "⚠".warning(), msg);
}

/// Prints a labeled key-value pair with proper indentation.
pub fn print_labeled(key: &str, value: &str) {
    println!("  {}: {}", key.muted(), value);
}

/// Prints the run transcript to stdout as probes complete.
#[derive(Debug, Default)]
pub struct Transcript;

impl ProbeObserver for Transcript {
    fn identity_started(&mut self, identity: &Identity) {
        println!("{RULE}");
        println!("Checking {}...", identity.name.header());
        println!("{RULE}");
    }

    fn probe_finished(&mut self, result: &ProbeResult) {
        let verdict = match result.verdict {
            Verdict::Success => result.verdict.success(),
            Verdict::Failure => result.verdict.error(),
        };
        println!("{}  {}", "Command:".muted(), result.probe.command().code());
        println!("{}   {}", "Result:".muted(), result.actual);
        println!("{} {}", "Expected:".muted(), result.probe.expected());
        println!("{}   {}", "Output:".muted(), verdict);
        println!("---");
    }
}

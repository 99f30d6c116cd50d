//! Version command implementation.

/// Version information for the CLI.
const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn run() {
    println!("rbacheck {VERSION}");
    println!();
    println!("Verifies Kubernetes RBAC against an expected authorization matrix.");
    println!();
    println!("Build info:");
    println!("  Target:       {}", std::env::consts::ARCH);
    println!("  OS:           {}", std::env::consts::OS);
}

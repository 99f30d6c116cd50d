//! Probe compiler: templates + identity + scope → oracle-ready probes.

use crate::model::{CompiledProbe, Identity, ProbeTemplate, ResolvedScope};

/// Compiles `templates` for `identity` in `scope`, preserving template order.
///
/// The command is `auth can-i`, then the impersonation flags, then the
/// template's action fragment, then `-n <namespace>` for namespaced scopes.
/// Each probe's expected outcome is the template's, unchanged.
pub fn compile(
    identity: &Identity,
    scope: &ResolvedScope,
    templates: Vec<ProbeTemplate>,
) -> Vec<CompiledProbe> {
    let impersonation = identity.impersonation_args();
    templates
        .into_iter()
        .map(|template| {
            let mut args = vec!["auth".to_string(), "can-i".to_string()];
            args.extend(impersonation.iter().cloned());
            args.extend(template.command.split_whitespace().map(str::to_string));
            if let Some(namespace) = scope.namespace() {
                args.push("-n".to_string());
                args.push(namespace.to_string());
            }
            CompiledProbe::new(args, template.expected)
        })
        .collect()
}

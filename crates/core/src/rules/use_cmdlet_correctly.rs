use super::binding::{is_positional_binding_used, named_parameters};
use super::mandatory::MandatorySet;
use super::{Rule, SourceType};
use crate::grammar::ast::{Ast, CommandInvocation};
use crate::grammar::diag::{Diagnostic, codes, render_message};
use crate::grammar::visit::find_invocations;
use cmdlint_catalog::{CommandMetadata, CommandMetadataProvider, MetadataError, ResolvedCommand};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Why an invocation was accepted without a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConformantReason {
    /// Neither the alias target nor the name itself resolved.
    Unresolved,
    /// The provider faulted; treated like [`ConformantReason::Unresolved`].
    ProviderFault,
    /// The command kind exposes no mandatory-parameter declarations.
    NoParameterMetadata,
    /// No parameter is mandatory in every parameter set.
    NoMandatoryParameters,
    /// An argument binds by position and may fill any mandatory parameter.
    PositionalBinding,
    /// At least one universally mandatory parameter is named.
    MandatorySupplied,
}

/// Outcome of checking one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing to report.
    Conformant(ConformantReason),
    /// The invocation names none of the universally mandatory parameters.
    NonConformant {
        /// Command name as written in the script.
        command: String,
        /// Canonical name of the resolved command.
        resolved: String,
    },
}

enum Resolution {
    Resolved(Arc<ResolvedCommand>),
    Unresolved,
    Fault(MetadataError),
}

/// Flags cmdlet invocations that omit every parameter the cmdlet requires
/// in all of its parameter sets.
///
/// Supplying any one universally mandatory parameter by name clears the
/// invocation, even when the cmdlet requires several.
#[derive(Debug, Clone)]
pub struct UseCmdletCorrectly<P> {
    provider: P,
}

impl<P: CommandMetadataProvider> UseCmdletCorrectly<P> {
    /// Create the rule over a metadata provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Alias target first, then the name itself. A fault on the alias path
    /// still allows the direct lookup.
    fn resolve(&self, name: &str) -> Resolution {
        let mut fault = None;
        if let Some(target) = self.provider.resolve_alias(name) {
            match self.provider.command_metadata(&target) {
                Ok(CommandMetadata::Resolved(cmd)) => return Resolution::Resolved(cmd),
                Ok(CommandMetadata::Unresolved) => {}
                Err(err) => fault = Some(err),
            }
        }
        match self.provider.command_metadata(name) {
            Ok(CommandMetadata::Resolved(cmd)) => Resolution::Resolved(cmd),
            Ok(CommandMetadata::Unresolved) => {
                fault.map_or(Resolution::Unresolved, Resolution::Fault)
            }
            Err(err) => Resolution::Fault(err),
        }
    }

    /// Decide whether one invocation conforms.
    pub fn check(&self, invocation: &CommandInvocation) -> Verdict {
        let Some(name) = invocation.command_name() else {
            return Verdict::Conformant(ConformantReason::Unresolved);
        };
        let command = match self.resolve(name) {
            Resolution::Resolved(cmd) => cmd,
            Resolution::Unresolved => {
                debug!(command = name, "command not found; skipping");
                return Verdict::Conformant(ConformantReason::Unresolved);
            }
            Resolution::Fault(err) => {
                debug!(command = name, error = %err, "metadata lookup failed; skipping");
                return Verdict::Conformant(ConformantReason::ProviderFault);
            }
        };
        if !command.kind.carries_parameter_metadata() {
            debug!(command = name, kind = %command.kind, "no parameter metadata; skipping");
            return Verdict::Conformant(ConformantReason::NoParameterMetadata);
        }
        let mandatory = MandatorySet::derive(&command);
        if mandatory.is_empty() {
            return Verdict::Conformant(ConformantReason::NoMandatoryParameters);
        }
        if is_positional_binding_used(invocation, Some(&command)) {
            debug!(command = name, "positional argument present; skipping");
            return Verdict::Conformant(ConformantReason::PositionalBinding);
        }
        if named_parameters(invocation, Some(&command))
            .into_iter()
            .any(|p| mandatory.contains(p))
        {
            return Verdict::Conformant(ConformantReason::MandatorySupplied);
        }
        Verdict::NonConformant {
            command: name.to_string(),
            resolved: command.name.clone(),
        }
    }

    fn diagnostic(
        invocation: &CommandInvocation,
        command: String,
        resolved: String,
        file: &str,
    ) -> Diagnostic {
        let mut ctx = BTreeMap::from([("command".to_string(), command.clone())]);
        if !resolved.eq_ignore_ascii_case(&command) {
            ctx.insert("resolved".into(), resolved);
        }
        let message = render_message(codes::USE_CMDLET_CORRECTLY, "default", &ctx)
            .unwrap_or_else(|| format!("Cmdlet '{command}' may be used incorrectly."));
        Diagnostic::warning(codes::USE_CMDLET_CORRECTLY, message, Some(invocation.span))
            .with_file(file)
            .with_context(ctx)
    }
}

impl<P: CommandMetadataProvider + Send + Sync> Rule for UseCmdletCorrectly<P> {
    fn name(&self) -> &str {
        codes::USE_CMDLET_CORRECTLY
    }

    fn common_name(&self) -> &str {
        cmdlint_diagnostics::common_name(codes::USE_CMDLET_CORRECTLY)
            .unwrap_or("Use Cmdlet Correctly")
    }

    fn description(&self) -> &str {
        cmdlint_diagnostics::explain(codes::USE_CMDLET_CORRECTLY)
            .unwrap_or("Cmdlet should be called with the mandatory parameters.")
    }

    fn source_type(&self) -> SourceType {
        SourceType::Builtin
    }

    fn source_name(&self) -> &str {
        "PS"
    }

    fn analyze(&self, ast: &Ast, file: &str) -> Vec<Diagnostic> {
        find_invocations(ast)
            .filter_map(|invocation| {
                trace!(command = invocation.command_name(), "checking invocation");
                match self.check(invocation) {
                    Verdict::NonConformant { command, resolved } => {
                        Some(Self::diagnostic(invocation, command, resolved, file))
                    }
                    Verdict::Conformant(_) => None,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::parser::parse_str;
    use cmdlint_catalog::{CommandKind, ParameterInfo};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider over a fixed map that counts metadata lookups.
    #[derive(Default)]
    struct FakeProvider {
        aliases: HashMap<String, String>,
        commands: HashMap<String, Result<CommandMetadata, MetadataError>>,
        lookups: AtomicUsize,
    }

    impl FakeProvider {
        fn cmdlet(mut self, name: &str, mandatory: &[&str]) -> Self {
            let cmd = ResolvedCommand {
                name: name.into(),
                kind: CommandKind::Cmdlet,
                parameter_set_count: 1,
                parameters: mandatory
                    .iter()
                    .map(|p| ParameterInfo {
                        name: (*p).into(),
                        per_set_mandatory: vec![true],
                        switch: false,
                    })
                    .collect(),
            };
            self.commands.insert(
                name.to_ascii_lowercase(),
                Ok(CommandMetadata::Resolved(Arc::new(cmd))),
            );
            self
        }

        fn alias(mut self, alias: &str, target: &str) -> Self {
            self.aliases.insert(alias.to_ascii_lowercase(), target.into());
            self
        }

        fn faulty(mut self, name: &str) -> Self {
            self.commands.insert(
                name.to_ascii_lowercase(),
                Err(MetadataError::NotIntrospectable {
                    name: name.into(),
                    kind: CommandKind::Application,
                }),
            );
            self
        }
    }

    impl CommandMetadataProvider for FakeProvider {
        fn resolve_alias(&self, name: &str) -> Option<String> {
            self.aliases.get(&name.to_ascii_lowercase()).cloned()
        }

        fn command_metadata(&self, name: &str) -> Result<CommandMetadata, MetadataError> {
            self.lookups.fetch_add(1, Ordering::Relaxed);
            self.commands
                .get(&name.to_ascii_lowercase())
                .cloned()
                .unwrap_or(Ok(CommandMetadata::Unresolved))
        }
    }

    fn first_invocation(ast: &Ast) -> &CommandInvocation {
        find_invocations(ast).next().expect("an invocation")
    }

    fn verdict(provider: &FakeProvider, src: &str) -> Verdict {
        let ast = parse_str(src).ast;
        UseCmdletCorrectly::new(provider).check(first_invocation(&ast))
    }

    #[test]
    fn alias_target_is_tried_first() {
        let provider = FakeProvider::default()
            .cmdlet("Get-Content", &["Path"])
            .alias("gc", "Get-Content");
        assert_eq!(
            verdict(&provider, "gc -Tail 5"),
            Verdict::NonConformant {
                command: "gc".into(),
                resolved: "Get-Content".into()
            }
        );
        assert_eq!(provider.lookups.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn unresolved_alias_target_falls_back_to_direct_lookup() {
        let provider = FakeProvider::default()
            .cmdlet("Get-Thing", &["Id"])
            .alias("Get-Thing", "Missing-Thing");
        assert!(matches!(
            verdict(&provider, "Get-Thing -Name x"),
            Verdict::NonConformant { .. }
        ));
        assert_eq!(provider.lookups.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn faults_are_silenced() {
        let provider = FakeProvider::default().faulty("git");
        assert_eq!(
            verdict(&provider, "git -C repo"),
            Verdict::Conformant(ConformantReason::ProviderFault)
        );
    }

    #[test]
    fn fault_on_alias_path_still_tries_direct_name() {
        let provider = FakeProvider::default()
            .faulty("Broken")
            .alias("Get-Thing", "Broken")
            .cmdlet("Get-Thing", &["Id"]);
        assert!(matches!(
            verdict(&provider, "Get-Thing -Name x"),
            Verdict::NonConformant { .. }
        ));
    }

    #[test]
    fn each_short_circuit_has_its_reason() {
        let provider = FakeProvider::default()
            .cmdlet("Copy-Item", &["Path", "Destination"])
            .cmdlet("Get-Date", &[]);
        let cases = [
            ("Unknown-Command -X", ConformantReason::Unresolved),
            ("Get-Date -Format o", ConformantReason::NoMandatoryParameters),
            ("Copy-Item src -Force", ConformantReason::PositionalBinding),
            ("Copy-Item -Destination d -Path p", ConformantReason::MandatorySupplied),
        ];
        for (src, reason) in cases {
            assert_eq!(verdict(&provider, src), Verdict::Conformant(reason), "{src}");
        }
    }

    #[test]
    fn diagnostic_carries_file_span_and_context() {
        let provider = FakeProvider::default()
            .cmdlet("Copy-Item", &["Path", "Destination"])
            .alias("cp", "Copy-Item");
        let src = "cp -Force";
        let ast = parse_str(src).ast;
        let diags = UseCmdletCorrectly::new(&provider).analyze(&ast, "a.ps1");
        assert_eq!(diags.len(), 1);
        let d = &diags[0];
        assert_eq!(d.rule_name, codes::USE_CMDLET_CORRECTLY);
        assert_eq!(d.file.as_deref(), Some("a.ps1"));
        assert_eq!(d.span.map(|s| (s.start, s.end)), Some((0, src.len())));
        assert_eq!(
            d.message,
            "Cmdlet 'cp' may be used incorrectly. Please check that all mandatory parameters are supplied."
        );
        let ctx = d.context.as_ref().expect("context");
        assert_eq!(ctx.get("command").map(String::as_str), Some("cp"));
        assert_eq!(ctx.get("resolved").map(String::as_str), Some("Copy-Item"));
    }
}

use crate::grammar::ast::Ast;
use crate::grammar::diag::Diagnostic;
use cmdlint_catalog::CommandMetadataProvider;
use serde::Serialize;
use thiserror::Error;

/// Parameter/value pairing and positional-binding detection.
pub mod binding;
/// Derivation of parameters mandatory in every parameter set.
pub mod mandatory;
/// The cmdlet mandatory-parameter rule.
pub mod use_cmdlet_correctly;

pub use use_cmdlet_correctly::{ConformantReason, UseCmdletCorrectly, Verdict};

/// Where a rule implementation comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Shipped with the analyzer.
    Builtin,
    /// Supplied by the host application.
    Managed,
    /// Loaded from a script module.
    Module,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::Builtin => write!(f, "builtin"),
            SourceType::Managed => write!(f, "managed"),
            SourceType::Module => write!(f, "module"),
        }
    }
}

/// An analysis rule run over one parsed script at a time.
///
/// Implementations must be deterministic for a fixed tree and fixed
/// collaborators, and must not fail the pass: anything undecidable is
/// silence, not an error.
pub trait Rule: Send + Sync {
    /// Qualified rule name, e.g. `PSUseCmdletCorrectly`.
    fn name(&self) -> &str;
    /// Human-readable name.
    fn common_name(&self) -> &str;
    /// What the rule checks.
    fn description(&self) -> &str;
    /// Built-in or user-supplied.
    fn source_type(&self) -> SourceType;
    /// Name of the source (module or product) the rule ships with.
    fn source_name(&self) -> &str;
    /// Analyze one tree; `file` identifies it in the returned records.
    fn analyze(&self, ast: &Ast, file: &str) -> Vec<Diagnostic>;
}

/// Identity metadata of a registered rule.
#[derive(Debug, Clone, Serialize)]
pub struct RuleInfo {
    /// Qualified rule name.
    pub name: String,
    /// Human-readable name.
    pub common_name: String,
    /// What the rule checks.
    pub description: String,
    /// Built-in or user-supplied.
    pub source_type: SourceType,
    /// Source name.
    pub source_name: String,
}

/// Errors from selecting rules by name.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleSelectionError {
    /// A requested rule name is not registered.
    #[error("unknown rule '{0}'")]
    UnknownRule(String),
}

/// Which registered rules to run. Empty `include` means all of them.
#[derive(Debug, Clone, Default)]
pub struct RuleSelection {
    /// Rule names to run (case-insensitive).
    pub include: Vec<String>,
    /// Rule names to skip (case-insensitive); applied after `include`.
    pub exclude: Vec<String>,
}

/// Explicitly populated collection of rules.
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in rule, backed by `provider`.
    pub fn builtin<P>(provider: P) -> Self
    where
        P: CommandMetadataProvider + Send + Sync + 'static,
    {
        let mut registry = Self::new();
        registry.register(UseCmdletCorrectly::new(provider));
        registry
    }

    /// Add a rule; rules run in registration order.
    pub fn register<R: Rule + 'static>(&mut self, rule: R) {
        self.rules.push(Box::new(rule));
    }

    /// Registered rules in registration order.
    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Look up a rule by name, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&dyn Rule> {
        self.rules().find(|r| r.name().eq_ignore_ascii_case(name))
    }

    /// Identity metadata for every registered rule.
    pub fn describe(&self) -> Vec<RuleInfo> {
        self.rules()
            .map(|r| RuleInfo {
                name: r.name().to_string(),
                common_name: r.common_name().to_string(),
                description: r.description().to_string(),
                source_type: r.source_type(),
                source_name: r.source_name().to_string(),
            })
            .collect()
    }

    /// Resolve a selection to rules, in registration order.
    pub fn select(&self, selection: &RuleSelection) -> Result<Vec<&dyn Rule>, RuleSelectionError> {
        for name in selection.include.iter().chain(&selection.exclude) {
            if self.get(name).is_none() {
                return Err(RuleSelectionError::UnknownRule(name.clone()));
            }
        }
        let listed = |names: &[String], rule: &dyn Rule| {
            names.iter().any(|n| n.eq_ignore_ascii_case(rule.name()))
        };
        let include = selection.include.as_slice();
        let exclude = selection.exclude.as_slice();
        Ok(self
            .rules()
            .filter(|r| include.is_empty() || listed(include, *r))
            .filter(|r| !listed(exclude, *r))
            .collect())
    }

    /// Run the selected rules and concatenate their diagnostics.
    pub fn run(
        &self,
        ast: &Ast,
        file: &str,
        selection: &RuleSelection,
    ) -> Result<Vec<Diagnostic>, RuleSelectionError> {
        Ok(self
            .select(selection)?
            .into_iter()
            .flat_map(|rule| rule.analyze(ast, file))
            .collect())
    }

    /// Run every registered rule.
    pub fn run_all(&self, ast: &Ast, file: &str) -> Vec<Diagnostic> {
        self.rules().flat_map(|rule| rule.analyze(ast, file)).collect()
    }
}

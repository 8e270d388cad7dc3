//! cmdlint core library.
//!
//! Parses PowerShell-style scripts and runs analysis rules over the tree.
//! The main entry points are [`parse_str`] for parsing, [`lint`] for the
//! built-in rules against a metadata provider, and [`RuleRegistry`] for
//! custom rule sets.

#![warn(missing_docs)]

/// Script grammar: lexer, parser, AST, traversal, and serialization helpers.
pub mod grammar;
/// Analysis rules and the rule registry.
pub mod rules;

use serde::Serialize;

// ── Convenience re-exports ──────────────────────────────────────────────────
// Flat imports for the most common entry points. The full module paths
// remain available for less common types.

// Parser
pub use grammar::parser::{ParseResult, parse_str};

// AST
pub use grammar::ast::{Ast, CommandElement, CommandInvocation, Expression, Statement};

// Traversal
pub use grammar::visit::{Invocations, find_invocations};

// Diagnostics (re-exported from the diagnostics crate)
pub use grammar::diag::{Diagnostic, Severity, Span, codes};

// Rules
pub use rules::{
    Rule, RuleInfo, RuleRegistry, RuleSelection, RuleSelectionError, SourceType,
    UseCmdletCorrectly,
};

// Serialization helpers
pub use grammar::dump::to_pretty_json;

/// Result of linting one script.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    /// `true` if no errors or parse errors were found (warnings are allowed).
    pub ok: bool,
    /// Parse diagnostics first, then rule diagnostics in registration order.
    pub issues: Vec<Diagnostic>,
}

impl LintResult {
    fn new(mut issues: Vec<Diagnostic>, rule_issues: Vec<Diagnostic>) -> Self {
        issues.extend(rule_issues);
        let ok = !issues.iter().any(|d| d.severity.is_failure());
        Self { ok, issues }
    }
}

/// Parse `source` and run the built-in rules against `provider`.
///
/// `file` identifies the script in every returned diagnostic.
pub fn lint<P>(source: &str, provider: P, file: &str) -> LintResult
where
    P: cmdlint_catalog::CommandMetadataProvider + Send + Sync + 'static,
{
    let registry = RuleRegistry::builtin(provider);
    let parsed = parse_str(source);
    let rule_issues = registry.run_all(&parsed.ast, file);
    LintResult::new(with_file(parsed.diagnostics, file), rule_issues)
}

/// Parse `source` and run the `selection` of `registry`'s rules.
pub fn lint_with(
    source: &str,
    registry: &RuleRegistry,
    selection: &RuleSelection,
    file: &str,
) -> Result<LintResult, RuleSelectionError> {
    let parsed = parse_str(source);
    let rule_issues = registry.run(&parsed.ast, file, selection)?;
    Ok(LintResult::new(with_file(parsed.diagnostics, file), rule_issues))
}

fn with_file(diagnostics: Vec<Diagnostic>, file: &str) -> Vec<Diagnostic> {
    diagnostics.into_iter().map(|d| d.with_file(file)).collect()
}

//! Shared test helpers for `cmdlint_core` integration tests.

#![allow(unreachable_pub)]

use cmdlint_catalog::Catalog;
use cmdlint_core::grammar::ast::{CommandInvocation, PipelineElement, Statement};
use cmdlint_core::grammar::parser::ParseResult;
use cmdlint_core::{Diagnostic, Rule, UseCmdletCorrectly, find_invocations, parse_str};
use std::sync::LazyLock;

/// Catalog loaded once per test binary via LazyLock.
pub static CATALOG: LazyLock<Catalog> = LazyLock::new(|| {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/catalog.jsonc");
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e));
    Catalog::from_json_str(&text)
        .unwrap_or_else(|e| panic!("failed to load {}: {}", path.display(), e))
});

// ─── Rule helpers ────────────────────────────────────────────────────────────

/// Run the cmdlet rule over `src` against the fixture catalog.
#[allow(dead_code)]
pub fn analyze(src: &str) -> Vec<Diagnostic> {
    let result = parse_str(src);
    assert!(
        result.diagnostics.is_empty(),
        "fixture script should parse cleanly: {:?}",
        result.diagnostics
    );
    UseCmdletCorrectly::new(&*CATALOG).analyze(&result.ast, "test.ps1")
}

/// The `command` context value of each diagnostic, in order.
#[allow(dead_code)]
pub fn flagged(src: &str) -> Vec<String> {
    analyze(src)
        .iter()
        .filter_map(|d| d.context.as_ref()?.get("command").cloned())
        .collect()
}

// ─── Parse-result helpers ────────────────────────────────────────────────────

/// Names of every statically named invocation, in traversal order.
#[allow(dead_code)]
pub fn invocation_names(result: &ParseResult) -> Vec<String> {
    find_invocations(&result.ast)
        .filter_map(|c| c.command_name().map(str::to_string))
        .collect()
}

/// The first command of the first top-level pipeline.
#[allow(dead_code)]
pub fn first_command(result: &ParseResult) -> &CommandInvocation {
    result
        .ast
        .body
        .statements
        .iter()
        .find_map(|s| match s {
            Statement::Pipeline(p) => p.elements.iter().find_map(|e| match e {
                PipelineElement::Command(cmd) => Some(cmd),
                PipelineElement::Expression { .. } => None,
            }),
            _ => None,
        })
        .expect("expected a top-level command")
}

/// Collect rule names from diagnostics.
#[allow(dead_code)]
pub fn extract_diag_codes(result: &ParseResult) -> Vec<String> {
    result
        .diagnostics
        .iter()
        .map(|d| d.rule_name.to_string())
        .collect()
}

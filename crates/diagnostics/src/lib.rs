//! Diagnostics for cmdlint.
//!
//! Provides [`Diagnostic`], [`Severity`], [`Span`], and [`LineIndex`] types
//! used to report rule findings and parse errors. Rule and diagnostic IDs are
//! defined in the [`codes`] module; their human-readable identity strings are
//! available through [`explain`], [`common_name`], [`default_severity`], and
//! [`message_template`].

#![warn(missing_docs)]

/// Rule and diagnostic ID constants generated from `spec/rules.jsonc`.
pub mod codes;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

// ── LineIndex ────────────────────────────────────────────────────────────

/// Maps byte offsets in a source string to line and column positions.
///
/// Lines and columns are **0-indexed** internally. Add 1 when displaying
/// to users.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line.
    /// `line_starts[0]` is always 0.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Build a `LineIndex` from source text.
    pub fn new(text: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(
                text.bytes()
                    .enumerate()
                    .filter(|&(_, b)| b == b'\n')
                    .map(|(i, _)| i + 1),
            )
            .collect();
        Self { line_starts }
    }

    /// Convert a byte offset to a 0-indexed `(line, column)` pair.
    ///
    /// Offsets past the end of the source land on the last line.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        (line, offset - self.line_starts[line])
    }

    /// Total number of lines (at least 1, even for empty input).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Severity level for a diagnostic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Severity {
    /// The script contains a definite error.
    Error,
    /// The script may not behave as intended.
    Warning,
    /// Informational note.
    Information,
    /// The script could not be parsed at this location.
    ParseError,
}

impl Severity {
    /// Whether this severity should fail a lint run.
    pub fn is_failure(self) -> bool {
        matches!(self, Severity::Error | Severity::ParseError)
    }
}

/// Byte span in the source input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    /// Byte offset of the first character (0-based).
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl Span {
    /// Create a span covering `[start, end)`.
    ///
    /// Panics if `end < start`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(end >= start, "Span end ({end}) < start ({start})");
        Self { start, end }
    }

    /// Create a zero-width span at the given position.
    pub fn empty(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }
}

/// A diagnostic record produced by a rule or the parser.
///
/// Records are immutable once built and handed straight to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Qualified name of the rule (or parser check) that produced this record,
    /// e.g. `"PSUseCmdletCorrectly"`.
    pub rule_name: Cow<'static, str>,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Byte span in the source input this record relates to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Identifier of the analyzed file, as passed in by the host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Machine-readable context for tooling. Serialized only when present.
    ///
    /// Uses `BTreeMap` for deterministic key ordering in serialized output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

impl Diagnostic {
    /// Create a diagnostic with the given fields.
    pub fn new(
        rule_name: impl Into<Cow<'static, str>>,
        severity: Severity,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            severity,
            message: message.into(),
            span,
            file: None,
            context: None,
        }
    }

    /// Shorthand for a `Warning` diagnostic.
    pub fn warning(
        rule_name: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(rule_name, Severity::Warning, message, span)
    }

    /// Shorthand for a `ParseError` diagnostic.
    pub fn parse_error(
        rule_name: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(rule_name, Severity::ParseError, message, span)
    }

    /// Attach the analyzed file's identifier (builder pattern).
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Attach machine-readable context metadata (builder pattern).
    pub fn with_context(mut self, ctx: BTreeMap<String, String>) -> Self {
        self.context = Some(ctx);
        self
    }

    /// Returns the human-readable explanation for this diagnostic's rule, if available.
    pub fn explain(&self) -> Option<&'static str> {
        explain(&self.rule_name)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Information => write!(f, "information"),
            Severity::ParseError => write!(f, "parse error"),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.rule_name, self.message)
    }
}

/// Returns the human-readable description for a rule or diagnostic ID.
pub fn explain(id: &str) -> Option<&'static str> {
    include!(concat!(env!("OUT_DIR"), "/generated_explain.rs"))
}

/// Returns the human-readable common name for a rule or diagnostic ID.
pub fn common_name(id: &str) -> Option<&'static str> {
    include!(concat!(env!("OUT_DIR"), "/generated_common_names.rs"))
}

/// Returns the default severity declared for a rule or diagnostic ID.
pub fn default_severity(id: &str) -> Option<Severity> {
    include!(concat!(env!("OUT_DIR"), "/generated_severity.rs"))
}

/// Returns the raw message template for `(id, variant)`, e.g.
/// `(codes::USE_CMDLET_CORRECTLY, "default")`.
pub fn message_template(id: &str, variant: &str) -> Option<&'static str> {
    include!(concat!(env!("OUT_DIR"), "/generated_templates.rs"))
}

/// Render the `(id, variant)` message template, substituting `{key}`
/// placeholders from `ctx`. Unknown placeholders are left as written.
pub fn render_message(id: &str, variant: &str, ctx: &BTreeMap<String, String>) -> Option<String> {
    let template = message_template(id, variant)?;
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let key = after[..close].trim();
                match ctx.get(key) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[open..open + close + 2]),
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    Some(out)
}

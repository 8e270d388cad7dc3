//! Pretty diagnostic rendering using ariadne.
//!
//! Converts cmdlint's [`Diagnostic`] type into ariadne [`Report`]s for
//! coloured, source-annotated terminal output, and into located JSON records
//! when the output is piped or JSON is requested.

use std::io::{self, IsTerminal};

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use cmdlint_diagnostics::{Diagnostic, LineIndex, Severity};
use serde::Serialize;

// ── Output format ───────────────────────────────────────────────────────

/// Output format for diagnostic rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Coloured, source-annotated output (ariadne).
    Pretty,
    /// Machine-readable JSON.
    Json,
}

impl Format {
    /// Use the explicit choice, or detect from whether stdout is a TTY.
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            // Default: pretty for interactive terminals, JSON for pipes
            _ => {
                if io::stdout().is_terminal() {
                    Format::Pretty
                } else {
                    Format::Json
                }
            }
        }
    }
}

// ── Severity mapping ────────────────────────────────────────────────────

fn report_kind(severity: Severity) -> ReportKind<'static> {
    match severity {
        Severity::Error => ReportKind::Error,
        Severity::ParseError => ReportKind::Custom("parse error", Color::Red),
        Severity::Warning => ReportKind::Warning,
        Severity::Information => ReportKind::Advice,
        _ => ReportKind::Advice,
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Error | Severity::ParseError => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Information => Color::Blue,
        _ => Color::Blue,
    }
}

fn context_note(diag: &Diagnostic) -> Option<String> {
    let ctx = diag.context.as_ref().filter(|c| !c.is_empty())?;
    Some(
        ctx.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

// ── Pretty rendering ────────────────────────────────────────────────────

/// Render a slice of diagnostics in pretty (ariadne) format to stderr.
///
/// Diagnostics with a span are rendered with source context (line numbers,
/// underlines, labels). Those without a span are rendered as standalone
/// messages.
pub(crate) fn render_diagnostics_pretty(source: &str, filename: &str, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }

    let config = Config::default().with_compact(false);

    // Build the Source once (O(n) line index) and reuse across all reports.
    let mut cache = (filename, Source::from(source));

    for diag in diagnostics {
        let Some(span) = &diag.span else {
            eprintln!("{diag}");
            if let Some(note) = context_note(diag) {
                eprintln!("  = note: {note}");
            }
            if let Some(explanation) = diag.explain() {
                eprintln!("  = help: {explanation}");
            }
            continue;
        };

        // Clamp span to source length to avoid panics on truncated input.
        let start = span.start.min(source.len());
        let end = span.end.min(source.len()).max(start);

        let mut builder = Report::build(report_kind(diag.severity), (filename, start..end))
            .with_code(diag.rule_name.as_ref())
            .with_message(&diag.message)
            .with_config(config);

        // The command name is the most useful label; the message is already
        // in the header.
        let label_msg = diag
            .context
            .as_ref()
            .and_then(|c| c.get("command"))
            .map_or_else(|| diag.message.clone(), |c| format!("'{c}' invoked here"));
        builder = builder.with_label(
            Label::new((filename, start..end))
                .with_message(label_msg)
                .with_color(severity_color(diag.severity)),
        );

        if let Some(note) = context_note(diag) {
            builder = builder.with_note(note);
        }
        if let Some(explanation) = diag.explain() {
            builder = builder.with_help(explanation);
        }

        builder.finish().eprint(&mut cache).ok();
    }
}

// ── JSON rendering ──────────────────────────────────────────────────────

/// A diagnostic plus its 1-based start position.
#[derive(Debug, Serialize)]
pub(crate) struct Located<'a> {
    #[serde(flatten)]
    diagnostic: &'a Diagnostic,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<usize>,
}

/// Attach 1-based line/column positions to each diagnostic with a span.
pub(crate) fn locate<'a>(source: &str, diagnostics: &'a [Diagnostic]) -> Vec<Located<'a>> {
    let index = LineIndex::new(source);
    diagnostics
        .iter()
        .map(|diagnostic| {
            let pos = diagnostic.span.map(|s| index.line_col(s.start));
            Located {
                diagnostic,
                line: pos.map(|(l, _)| l + 1),
                column: pos.map(|(_, c)| c + 1),
            }
        })
        .collect()
}

// ── Summary line ────────────────────────────────────────────────────────

/// Print a coloured summary line showing error/warning/info counts.
///
/// Example: `1 parse error, 2 warnings`
pub(crate) fn print_summary(diagnostics: &[Diagnostic]) {
    use ariadne::Fmt;

    let count = |sev: Severity| diagnostics.iter().filter(|d| d.severity == sev).count();
    let plural = |n: usize| if n == 1 { "" } else { "s" };

    let mut parts = Vec::new();
    for (sev, label, color) in [
        (Severity::ParseError, "parse error", Color::Red),
        (Severity::Error, "error", Color::Red),
        (Severity::Warning, "warning", Color::Yellow),
        (Severity::Information, "info", Color::Blue),
    ] {
        let n = count(sev);
        if n > 0 {
            let s = if sev == Severity::Information { "" } else { plural(n) };
            parts.push(format!("{}", format!("{n} {label}{s}").fg(color)));
        }
    }

    // Only print summary when there are diagnostics.
    if !parts.is_empty() {
        eprintln!("{}", parts.join(", "));
    }
}

mod render;

use std::fs;
use std::io::{self, Read};
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use cmdlint_catalog::Catalog;
use cmdlint_core::{RuleRegistry, RuleSelection, lint_with, parse_str, to_pretty_json};
use cmdlint_diagnostics::{self as diag, Diagnostic};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::render::{Format, locate, print_summary, render_diagnostics_pretty};

// ── Embedded catalog ────────────────────────────────────────────────────

/// Command catalog baked into the binary at compile time.
/// Present when `data/catalog.json` existed during `cargo build`.
#[cfg(has_embedded_catalog)]
const EMBEDDED_CATALOG_JSON: &str = include_str!(concat!(env!("OUT_DIR"), "/catalog.json"));

#[cfg(not(has_embedded_catalog))]
const EMBEDDED_CATALOG_JSON: &str = "";

/// Display name used for input read from stdin.
const STDIN_NAME: &str = "<stdin>";

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "cmdlint",
    version,
    about = "Check PowerShell scripts for cmdlet calls that omit mandatory parameters"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Parse a script and print its syntax tree.
    Parse {
        /// Script path, or `-` for stdin.
        file: String,
    },

    /// Parse a script and run the analysis rules over it.
    Lint {
        /// Script path, or `-` for stdin.
        file: String,
        /// Path to a command catalog (JSON/JSONC). When omitted, uses the
        /// catalog embedded at compile time.
        #[arg(long)]
        catalog: Option<String>,
        /// Run only these rules (repeatable).
        #[arg(long = "include-rule", value_name = "NAME")]
        include: Vec<String>,
        /// Skip these rules (repeatable).
        #[arg(long = "exclude-rule", value_name = "NAME")]
        exclude: Vec<String>,
    },

    /// List the registered rules.
    Rules {
        /// Path to a command catalog (see `lint --help`).
        #[arg(long)]
        catalog: Option<String>,
    },

    /// Explain a rule or diagnostic ID (e.g. PSUseCmdletCorrectly).
    Explain { id: String },
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let format = Format::resolve_or_detect(cli.output.as_deref());

    let result = match cli.cmd {
        Cmd::Parse { file } => cmd_parse(&file, format),
        Cmd::Lint {
            file,
            catalog,
            include,
            exclude,
        } => cmd_lint(
            &file,
            catalog.as_deref(),
            RuleSelection { include, exclude },
            format,
        ),
        Cmd::Rules { catalog } => cmd_rules(catalog.as_deref(), format),
        Cmd::Explain { id } => cmd_explain(&id, format),
    };

    if let (Err(err), Format::Json) = (&result, format) {
        // Keep stdout a single JSON object even on failure.
        let out = serde_json::json!({
            "success": false,
            "error": "command_failed",
            "message": format!("{err:#}"),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        process::exit(1);
    }
    result
}

/// Logs go to stderr so they never mix with JSON on stdout.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_parse(file: &str, format: Format) -> Result<()> {
    let (input, name) = read_input(file)?;
    let res = parse_str(&input);

    match format {
        Format::Json => {
            // Single valid JSON object to stdout.
            let out = serde_json::json!({
                "ast": res.ast,
                "diagnostics": locate(&input, &res.diagnostics),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            // AST to stdout, diagnostics to stderr.
            println!("{}", to_pretty_json(&res.ast)?);
            render_diagnostics_pretty(&input, &name, &res.diagnostics);
            print_summary(&res.diagnostics);
        }
    }

    exit_on_errors(&res.diagnostics);
    Ok(())
}

fn cmd_lint(
    file: &str,
    catalog_path: Option<&str>,
    selection: RuleSelection,
    format: Format,
) -> Result<()> {
    let (input, name) = read_input(file)?;
    let catalog = resolve_catalog(catalog_path)?;
    debug!(
        commands = catalog.command_count(),
        aliases = catalog.alias_count(),
        "catalog loaded"
    );
    let registry = RuleRegistry::builtin(Arc::new(catalog));
    let result = lint_with(&input, &registry, &selection, &name)?;

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "ok": result.ok,
                "issues": locate(&input, &result.issues),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            render_diagnostics_pretty(&input, &name, &result.issues);
            print_summary(&result.issues);
            if result.ok {
                eprintln!("lint ok");
            }
        }
    }

    exit_on_errors(&result.issues);
    Ok(())
}

fn cmd_rules(catalog_path: Option<&str>, format: Format) -> Result<()> {
    let catalog = resolve_catalog(catalog_path)?;
    let rules = RuleRegistry::builtin(Arc::new(catalog)).describe();

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&rules)?),
        Format::Pretty => {
            use ariadne::Fmt;
            for rule in &rules {
                println!(
                    "{} ({}, {}: {})",
                    rule.name.as_str().fg(ariadne::Color::Cyan),
                    rule.common_name,
                    rule.source_type,
                    rule.source_name
                );
                println!("    {}", rule.description);
            }
        }
    }
    Ok(())
}

fn cmd_explain(id: &str, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let mut out = serde_json::json!({
                "id": id,
                "explanation": diag::explain(id),
            });
            if let Some(name) = diag::common_name(id) {
                out["common_name"] = name.into();
            }
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            // Explanation is the expected output, so it goes to stdout.
            use ariadne::Fmt;
            match (diag::explain(id), diag::common_name(id)) {
                (Some(text), Some(name)) => {
                    println!("{} ({}): {}", id.fg(ariadne::Color::Cyan), name, text);
                }
                (Some(text), None) => println!("{}: {}", id.fg(ariadne::Color::Cyan), text),
                (None, _) => println!("{id}: (no explanation available)"),
            }
        }
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Exit with code 1 if any diagnostic is an error or parse error.
/// Warnings and info do not cause a non-zero exit.
fn exit_on_errors(diagnostics: &[Diagnostic]) {
    if diagnostics.iter().any(|d| d.severity.is_failure()) {
        process::exit(1);
    }
}

/// Read the script at `file`, or stdin when `file` is `-`.
///
/// Returns the source text and the name to report it under.
fn read_input(file: &str) -> Result<(String, String)> {
    if file == "-" {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("failed to read script from stdin")?;
        return Ok((input, STDIN_NAME.to_string()));
    }
    let input =
        fs::read_to_string(file).with_context(|| format!("failed to read script '{file}'"))?;
    Ok((input, file.to_string()))
}

/// Resolve the command catalog from (in priority order):
///   1. Explicit `--catalog` path
///   2. Catalog embedded in the binary
fn resolve_catalog(explicit_path: Option<&str>) -> Result<Catalog> {
    if let Some(path) = explicit_path {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog file '{path}'"))?;
        return Catalog::from_json_str(&json)
            .with_context(|| format!("failed to load catalog file '{path}'"));
    }
    if EMBEDDED_CATALOG_JSON.is_empty() {
        bail!("no command catalog available; pass --catalog <PATH>");
    }
    Catalog::from_json_str(EMBEDDED_CATALOG_JSON).context("embedded catalog is invalid")
}

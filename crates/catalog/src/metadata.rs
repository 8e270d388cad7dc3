use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// What kind of command a name resolves to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    /// Compiled cmdlet with declarative parameter attributes.
    Cmdlet,
    /// Script-defined function.
    Function,
    /// Script-defined filter.
    Filter,
    /// External script file.
    Script,
    /// Native executable found on the path.
    Application,
    /// Alias that has not been followed.
    Alias,
    /// Workflow.
    Workflow,
    /// DSC configuration.
    Configuration,
}

impl CommandKind {
    /// Whether commands of this kind expose mandatory-parameter declarations
    /// that the analyzer can trust.
    pub fn carries_parameter_metadata(self) -> bool {
        matches!(self, CommandKind::Cmdlet)
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CommandKind::Cmdlet => "cmdlet",
            CommandKind::Function => "function",
            CommandKind::Filter => "filter",
            CommandKind::Script => "script",
            CommandKind::Application => "application",
            CommandKind::Alias => "alias",
            CommandKind::Workflow => "workflow",
            CommandKind::Configuration => "configuration",
        };
        f.write_str(s)
    }
}

/// Per-parameter attribute data as seen by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    /// Declared parameter name (original casing).
    pub name: String,
    /// One slot per declared parameter attribute, `true` when that
    /// declaration marks the parameter mandatory.
    pub per_set_mandatory: Vec<bool>,
    /// Switch parameters never consume the following argument.
    pub switch: bool,
}

impl ParameterInfo {
    /// Number of declared attribute occurrences.
    pub fn declaration_count(&self) -> usize {
        self.per_set_mandatory.len()
    }

    /// Number of declarations flagged mandatory.
    pub fn mandatory_count(&self) -> usize {
        self.per_set_mandatory.iter().filter(|m| **m).count()
    }
}

/// Structured metadata for a command that resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    /// Canonical command name.
    pub name: String,
    /// Command kind.
    pub kind: CommandKind,
    /// Number of alternative parameter sets; always at least 1.
    pub parameter_set_count: usize,
    /// Parameters in declaration order.
    pub parameters: Vec<ParameterInfo>,
}

impl ResolvedCommand {
    /// Look up a parameter by name, ignoring ASCII case.
    pub fn parameter(&self, name: &str) -> Option<&ParameterInfo> {
        self.parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

/// Outcome of a metadata lookup that did not fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandMetadata {
    /// The name is unknown to the provider.
    Unresolved,
    /// The name resolved to a command.
    Resolved(Arc<ResolvedCommand>),
}

impl CommandMetadata {
    /// The resolved command, if any.
    pub fn resolved(&self) -> Option<&Arc<ResolvedCommand>> {
        match self {
            CommandMetadata::Resolved(cmd) => Some(cmd),
            CommandMetadata::Unresolved => None,
        }
    }
}

/// A provider fault. Callers in the analyzer treat every fault as
/// [`CommandMetadata::Unresolved`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MetadataError {
    /// The command exists but its parameter metadata cannot be inspected.
    #[error("metadata for {kind} '{name}' cannot be inspected")]
    NotIntrospectable {
        /// Command name as requested.
        name: String,
        /// Kind of the command that was found.
        kind: CommandKind,
    },
    /// The provider's own data is inconsistent for this command.
    #[error("inconsistent metadata for '{name}': {reason}")]
    Inconsistent {
        /// Command name as requested.
        name: String,
        /// Human-readable description of the inconsistency.
        reason: String,
    },
}

/// Lookup service backed by the installed command inventory.
///
/// Both operations must be pure for a fixed inventory snapshot and safe to
/// call concurrently; implementations that front an expensive source are
/// expected to cache internally.
pub trait CommandMetadataProvider {
    /// Map an alias to its canonical command name, or `None` when `name`
    /// is not an alias.
    fn resolve_alias(&self, name: &str) -> Option<String>;

    /// Fetch structured metadata for a command name.
    fn command_metadata(&self, name: &str) -> Result<CommandMetadata, MetadataError>;
}

impl<P: CommandMetadataProvider + ?Sized> CommandMetadataProvider for &P {
    fn resolve_alias(&self, name: &str) -> Option<String> {
        (**self).resolve_alias(name)
    }

    fn command_metadata(&self, name: &str) -> Result<CommandMetadata, MetadataError> {
        (**self).command_metadata(name)
    }
}

impl<P: CommandMetadataProvider + ?Sized> CommandMetadataProvider for Arc<P> {
    fn resolve_alias(&self, name: &str) -> Option<String> {
        (**self).resolve_alias(name)
    }

    fn command_metadata(&self, name: &str) -> Result<CommandMetadata, MetadataError> {
        (**self).command_metadata(name)
    }
}

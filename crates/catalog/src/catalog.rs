use crate::metadata::{
    CommandKind, CommandMetadata, CommandMetadataProvider, MetadataError, ParameterInfo,
    ResolvedCommand,
};
use cmdlint_jsonc_strip::jsonc_to_json;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Current format version for the catalog JSON schema.
pub const CATALOG_FORMAT_VERSION: &str = "1.0.0";

/// Errors that can occur when loading or validating a command catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// JSON deserialization failed.
    #[error("invalid catalog JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A field value is missing or malformed.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Path of the field that failed validation.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Two commands share a name (compared case-insensitively).
    #[error("duplicate command '{0}'")]
    DuplicateCommand(String),

    /// Two aliases share a name (compared case-insensitively).
    #[error("duplicate alias '{0}'")]
    DuplicateAlias(String),

    /// A parameter attribute names a parameter set the command does not declare.
    #[error("parameter '{parameter}' of '{command}' references undeclared parameter set '{set}'")]
    UnknownParameterSet {
        /// Command that owns the parameter.
        command: String,
        /// Parameter carrying the attribute.
        parameter: String,
        /// The undeclared set name.
        set: String,
    },
}

/// One `[Parameter(...)]` declaration on a parameter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParameterAttribute {
    /// Parameter set this declaration belongs to; `None` means all sets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<String>,
    /// Whether the parameter is mandatory in this set.
    #[serde(default)]
    pub mandatory: bool,
    /// Declared binding position, if positional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

/// Catalog entry for one parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParameterEntry {
    /// Parameter name without the leading dash.
    pub name: String,
    /// Whether this is a switch parameter.
    #[serde(default)]
    pub switch: bool,
    /// Declarations in source order.
    #[serde(default)]
    pub attributes: Vec<ParameterAttribute>,
}

/// Catalog entry for one command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandEntry {
    /// Canonical command name, e.g. `"Copy-Item"`.
    pub name: String,
    /// Command kind.
    pub kind: CommandKind,
    /// Declared parameter set names. Empty means one implicit set.
    #[serde(default)]
    pub parameter_sets: Vec<String>,
    /// Declared parameters.
    #[serde(default)]
    pub parameters: Vec<ParameterEntry>,
}

impl CommandEntry {
    fn to_resolved(&self) -> ResolvedCommand {
        ResolvedCommand {
            name: self.name.clone(),
            kind: self.kind,
            parameter_set_count: self.parameter_sets.len().max(1),
            parameters: self
                .parameters
                .iter()
                .map(|p| ParameterInfo {
                    name: p.name.clone(),
                    per_set_mandatory: p.attributes.iter().map(|a| a.mandatory).collect(),
                    switch: p.switch,
                })
                .collect(),
        }
    }
}

/// On-disk catalog document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogFile {
    /// Schema version of the document (e.g. `"1.0.0"`).
    pub schema_version: String,
    /// Known commands.
    #[serde(default)]
    pub commands: Vec<CommandEntry>,
    /// Alias name → canonical command name.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

/// Validated, indexed command inventory.
///
/// Lookups are case-insensitive. Resolved metadata is built once at load
/// time and shared through `Arc`, so repeated lookups are allocation-free.
#[derive(Debug, Clone)]
pub struct Catalog {
    schema_version: String,
    commands: HashMap<String, (CommandKind, Arc<ResolvedCommand>)>,
    aliases: HashMap<String, String>,
}

impl Catalog {
    /// Parse and validate a catalog from JSON or JSONC text.
    pub fn from_json_str(s: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(&jsonc_to_json(s))?;
        Self::from_file(file)
    }

    /// Validate and index an in-memory catalog document.
    pub fn from_file(file: CatalogFile) -> Result<Self, CatalogError> {
        if file.schema_version.trim().is_empty() {
            return Err(CatalogError::InvalidField {
                field: "schema_version".into(),
                reason: "must not be empty".into(),
            });
        }
        let major = |v: &str| v.trim().split('.').next().map(str::to_owned);
        if major(&file.schema_version) != major(CATALOG_FORMAT_VERSION) {
            return Err(CatalogError::InvalidField {
                field: "schema_version".into(),
                reason: format!(
                    "{} is not compatible with catalog format {CATALOG_FORMAT_VERSION}",
                    file.schema_version
                ),
            });
        }

        let mut commands = HashMap::with_capacity(file.commands.len());
        for (i, entry) in file.commands.iter().enumerate() {
            validate_entry(i, entry)?;
            let key = entry.name.to_ascii_lowercase();
            if commands.contains_key(&key) {
                return Err(CatalogError::DuplicateCommand(entry.name.clone()));
            }
            commands.insert(key, (entry.kind, Arc::new(entry.to_resolved())));
        }

        let mut aliases = HashMap::with_capacity(file.aliases.len());
        for (alias, target) in &file.aliases {
            if alias.trim().is_empty() {
                return Err(CatalogError::InvalidField {
                    field: "aliases".into(),
                    reason: "alias name must not be empty".into(),
                });
            }
            if target.trim().is_empty() {
                return Err(CatalogError::InvalidField {
                    field: format!("aliases.{alias}"),
                    reason: "alias target must not be empty".into(),
                });
            }
            if aliases
                .insert(alias.to_ascii_lowercase(), target.clone())
                .is_some()
            {
                return Err(CatalogError::DuplicateAlias(alias.clone()));
            }
        }

        Ok(Self {
            schema_version: file.schema_version,
            commands,
            aliases,
        })
    }

    /// Schema version the catalog was loaded from.
    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    /// Number of known commands.
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Number of known aliases.
    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }
}

fn validate_entry(i: usize, entry: &CommandEntry) -> Result<(), CatalogError> {
    if entry.name.trim().is_empty() {
        return Err(CatalogError::InvalidField {
            field: format!("commands[{i}].name"),
            reason: "must not be empty".into(),
        });
    }
    let mut seen = HashSet::with_capacity(entry.parameters.len());
    for (j, param) in entry.parameters.iter().enumerate() {
        if param.name.trim().is_empty() {
            return Err(CatalogError::InvalidField {
                field: format!("commands[{i}].parameters[{j}].name"),
                reason: "must not be empty".into(),
            });
        }
        if !seen.insert(param.name.to_ascii_lowercase()) {
            return Err(CatalogError::InvalidField {
                field: format!("commands[{i}].parameters[{j}].name"),
                reason: format!("duplicate parameter '{}' of '{}'", param.name, entry.name),
            });
        }
        for attr in &param.attributes {
            if let Some(set) = &attr.set
                && !entry
                    .parameter_sets
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(set))
            {
                return Err(CatalogError::UnknownParameterSet {
                    command: entry.name.clone(),
                    parameter: param.name.clone(),
                    set: set.clone(),
                });
            }
        }
    }
    Ok(())
}

impl CommandMetadataProvider for Catalog {
    fn resolve_alias(&self, name: &str) -> Option<String> {
        self.aliases.get(&name.to_ascii_lowercase()).cloned()
    }

    fn command_metadata(&self, name: &str) -> Result<CommandMetadata, MetadataError> {
        match self.commands.get(&name.to_ascii_lowercase()) {
            None => Ok(CommandMetadata::Unresolved),
            // Native executables expose no parameter sets to inspect.
            Some((CommandKind::Application, cmd)) => Err(MetadataError::NotIntrospectable {
                name: cmd.name.clone(),
                kind: CommandKind::Application,
            }),
            Some((_, cmd)) => Ok(CommandMetadata::Resolved(Arc::clone(cmd))),
        }
    }
}

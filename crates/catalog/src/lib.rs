//! Command and alias metadata for cmdlint.
//!
//! The analyzer never talks to a live shell. It asks a
//! [`CommandMetadataProvider`] two questions: "is this name an alias?" and
//! "what parameters does this command declare?". [`Catalog`] answers both
//! from a JSON inventory of installed commands.
//!
//! # Example
//! ```
//! use cmdlint_catalog::{Catalog, CommandMetadataProvider};
//!
//! let catalog = Catalog::from_json_str(r#"{
//!     "schema_version": "1.0.0",
//!     "commands": [{
//!         "name": "Get-Content",
//!         "kind": "cmdlet",
//!         "parameters": [{ "name": "Path", "attributes": [{ "mandatory": true }] }]
//!     }],
//!     "aliases": { "gc": "Get-Content" }
//! }"#).unwrap();
//!
//! let target = catalog.resolve_alias("gc").unwrap();
//! let md = catalog.command_metadata(&target).unwrap();
//! assert_eq!(md.resolved().unwrap().parameter_set_count, 1);
//! ```

#![warn(missing_docs)]

mod catalog;
mod metadata;

pub use catalog::{
    CATALOG_FORMAT_VERSION, Catalog, CatalogError, CatalogFile, CommandEntry, ParameterAttribute,
    ParameterEntry,
};
pub use metadata::{
    CommandKind, CommandMetadata, CommandMetadataProvider, MetadataError, ParameterInfo,
    ResolvedCommand,
};

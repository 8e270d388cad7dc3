//! Rule and diagnostic ID constants.
//!
//! Generated from `spec/rules.jsonc` at build time. Use these instead of
//! string literals so a renamed rule is a compile error.

include!(concat!(env!("OUT_DIR"), "/generated_codes.rs"));

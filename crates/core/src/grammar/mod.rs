/// Script syntax tree types.
pub mod ast;
/// Re-exports from the diagnostics crate.
pub mod diag;
/// JSON serialization helpers for the AST.
pub mod dump;
/// Script lexer: tokenizes raw input into a stream of borrowed tokens.
pub mod lexer;
/// Script parser: converts tokens into an AST.
pub mod parser;
/// Pre-order traversal that finds command invocations.
pub mod visit;

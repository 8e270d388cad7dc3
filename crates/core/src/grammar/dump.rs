use super::ast::Ast;
use super::parser::ParseResult;

/// Serialize an AST to a pretty-printed JSON string.
pub fn to_pretty_json(ast: &Ast) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(ast)
}

/// Serialize a full parse result (tree plus diagnostics) to pretty JSON.
pub fn parse_result_to_json(result: &ParseResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

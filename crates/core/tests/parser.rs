//! Tests for the script parser.
//!
//! Covers: command elements, invocation operators, expression mode and
//! assignments, compound statements, nesting, spans, trivia, diagnostics and
//! recovery.
//!
//! Rule tests live in `use_cmdlet_correctly.rs`.

mod common;

use common::{extract_diag_codes, first_command, invocation_names};
use cmdlint_core::grammar::ast::{
    CommandElement, Expression, InvocationOperator, PipelineElement, Statement,
};
use cmdlint_core::grammar::dump::parse_result_to_json;
use cmdlint_core::{Severity, codes, parse_str, to_pretty_json};

fn element_summary(src: &str) -> Vec<String> {
    let result = parse_str(src);
    first_command(&result)
        .elements
        .iter()
        .map(|e| match e {
            CommandElement::Parameter {
                name,
                argument: Some(_),
                ..
            } => format!("-{name}:"),
            CommandElement::Parameter { name, .. } => format!("-{name}"),
            CommandElement::Argument { value } => match value {
                Expression::Bareword { text, .. } => text.clone(),
                Expression::StringLiteral { value, .. } => format!("'{value}'"),
                Expression::Variable { name, splatted, .. } => {
                    format!("{}{name}", if *splatted { '@' } else { '$' })
                }
                Expression::ScriptBlock { .. } => "{}".into(),
                Expression::SubExpression { opener, .. } => format!("{opener})"),
                Expression::Hashtable { .. } => "@{}".into(),
                Expression::Array { items, .. } => format!("array({})", items.len()),
                Expression::Sequence { parts, .. } => format!("seq({})", parts.len()),
                other => format!("{other:?}"),
            },
        })
        .collect()
}

// ─── Command elements ────────────────────────────────────────────────────────

#[test]
fn parameters_and_arguments_stay_flat() {
    assert_eq!(
        element_summary("Copy-Item -Path src -Destination \"dst\""),
        ["-Path", "src", "-Destination", "'dst'"]
    );
}

#[test]
fn colon_parameter_captures_its_value() {
    let result = parse_str("Copy-Item -Path:'a b' -Recurse:$true");
    let cmd = first_command(&result);
    assert_eq!(cmd.elements.len(), 2);
    match &cmd.elements[0] {
        CommandElement::Parameter {
            name,
            argument: Some(Expression::StringLiteral { value, .. }),
            ..
        } => {
            assert_eq!(name, "Path");
            assert_eq!(value, "a b");
        }
        other => panic!("unexpected element {other:?}"),
    }
}

#[test]
fn argument_forms() {
    assert_eq!(
        element_summary("Invoke-Thing $x @splat { 1 } (Get-Date) $(pwd) @(1) @{a=1} 1,2,3 C:\\$dir\\x"),
        ["$x", "@splat", "{}", "()", "$()", "@()", "@{}", "array(3)", "C:\\$dir\\x"]
    );
}

#[test]
fn adjacent_tokens_form_one_argument() {
    assert_eq!(element_summary("Write-Output $item.Name"), ["seq(2)"]);
    assert_eq!(element_summary("Write-Output \"a\"$b"), ["seq(2)"]);
}

#[test]
fn double_dash_ends_parameters() {
    assert_eq!(element_summary("Write-Output -- -NotAParam"), ["-NotAParam"]);
    let result = parse_str("Write-Output -- -NotAParam");
    assert!(matches!(
        first_command(&result).elements[0],
        CommandElement::Argument { .. }
    ));
}

#[test]
fn redirections_are_not_elements() {
    let result = parse_str("Get-Content -Path a > out.txt 2>&1");
    let cmd = first_command(&result);
    assert_eq!(cmd.elements.len(), 2);
    assert_eq!(cmd.redirections.len(), 2);
    assert!(cmd.redirections[0].target.is_some());
    assert!(cmd.redirections[1].target.is_none());
}

// ─── Invocation operators ────────────────────────────────────────────────────

#[test]
fn call_operator_heads() {
    let result = parse_str("& 'Copy-Item' -Force");
    let cmd = first_command(&result);
    assert_eq!(cmd.operator, Some(InvocationOperator::Call));
    assert_eq!(cmd.command_name(), Some("Copy-Item"));

    for dynamic in ["& $cmd -Force", "& { Get-Date }", "& \"$verb-Item\""] {
        let result = parse_str(dynamic);
        assert_eq!(first_command(&result).command_name(), None, "{dynamic}");
    }
}

#[test]
fn dot_source() {
    let result = parse_str(". .\\helpers.ps1");
    let cmd = first_command(&result);
    assert_eq!(cmd.operator, Some(InvocationOperator::DotSource));
    assert_eq!(cmd.command_name(), Some(".\\helpers.ps1"));
}

// ─── Statements ──────────────────────────────────────────────────────────────

#[test]
fn statements_split_on_newlines_semicolons_and_chains() {
    let result = parse_str("Get-A; Get-B\nGet-C && Get-D || Get-E");
    assert_eq!(
        invocation_names(&result),
        ["Get-A", "Get-B", "Get-C", "Get-D", "Get-E"]
    );
}

#[test]
fn pipelines_allow_newline_after_pipe() {
    let result = parse_str("Get-ChildItem |\n  Where-Object { $_.Length -gt 0 } |\n  Sort-Object");
    let Statement::Pipeline(p) = &result.ast.body.statements[0] else {
        panic!("expected pipeline");
    };
    assert_eq!(p.elements.len(), 3);
    assert_eq!(
        invocation_names(&result),
        ["Get-ChildItem", "Where-Object", "Sort-Object"]
    );
}

#[test]
fn expression_statements_are_not_commands() {
    let result = parse_str("$a -eq 1\n42\n'text' | Write-Output");
    assert_eq!(invocation_names(&result), ["Write-Output"]);
    let Statement::Pipeline(p) = &result.ast.body.statements[2] else {
        panic!("expected pipeline");
    };
    assert!(matches!(p.elements[0], PipelineElement::Expression { .. }));
}

#[test]
fn assignments() {
    let result = parse_str("$files = Get-ChildItem\n$n += 1\n$x=Get-Date");
    let ops: Vec<_> = result
        .ast
        .body
        .statements
        .iter()
        .filter_map(|s| match s {
            Statement::Assignment { operator, .. } => Some(operator.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(ops, ["=", "+=", "="]);
    assert_eq!(invocation_names(&result), ["Get-ChildItem", "Get-Date"]);
}

#[test]
fn function_definitions() {
    let result = parse_str("function Get-Thing($a) {\n  Get-Item $a\n}\nfilter Keep { $_ }");
    let kinds: Vec<_> = result
        .ast
        .body
        .statements
        .iter()
        .filter_map(|s| match s {
            Statement::Function { keyword, name, params, .. } => {
                Some((keyword.as_str(), name.as_str(), params.is_some()))
            }
            _ => None,
        })
        .collect();
    assert_eq!(kinds, [("function", "Get-Thing", true), ("filter", "Keep", false)]);
    assert_eq!(invocation_names(&result), ["Get-Item"]);
}

#[test]
fn compound_statements_collect_clauses() {
    let src = "if ($a) { A1 } elseif ($b) { B1 } else { C1 }\n\
               try { T1 } catch [System.IO.IOException], [System.Exception] { K1 } finally { F1 }\n\
               do { D1 } while ($more)\n\
               foreach ($f in (Get-ChildItem)) { E1 }\n\
               switch -Regex ($s) { 'a' { S1 } }";
    let result = parse_str(src);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    let shapes: Vec<_> = result
        .ast
        .body
        .statements
        .iter()
        .filter_map(|s| match s {
            Statement::Compound { keyword, clauses, .. } => Some((
                keyword.clone(),
                clauses.iter().map(|c| c.keyword.clone()).collect::<Vec<_>>(),
            )),
            _ => None,
        })
        .collect();
    assert_eq!(shapes.len(), 5);
    assert_eq!(shapes[0].1, ["if", "elseif", "else"]);
    assert_eq!(shapes[1].1, ["try", "catch", "finally"]);
    assert_eq!(shapes[2].1, ["do", "while"]);
    assert_eq!(shapes[3].0, "foreach");
    assert_eq!(shapes[4].0, "switch");
    assert_eq!(
        invocation_names(&result),
        ["A1", "B1", "C1", "T1", "K1", "F1", "D1", "Get-ChildItem", "E1", "S1"]
    );
    let Statement::Compound { clauses, .. } = &result.ast.body.statements[1] else {
        panic!("expected try");
    };
    assert_eq!(clauses[1].types, ["[System.IO.IOException]", "[System.Exception]"]);
}

#[test]
fn flow_statements() {
    let result = parse_str("return Get-Value\nthrow\nexit 1");
    let keywords: Vec<_> = result
        .ast
        .body
        .statements
        .iter()
        .filter_map(|s| match s {
            Statement::Flow { keyword, value, .. } => Some((keyword.as_str(), value.is_some())),
            _ => None,
        })
        .collect();
    assert_eq!(keywords, [("return", true), ("throw", false), ("exit", true)]);
    assert_eq!(invocation_names(&result), ["Get-Value"]);
}

#[test]
fn hashtable_entries() {
    let result = parse_str("$h = @{ Path = 'a'; Count=2\n Items = Get-ChildItem }");
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    let Statement::Assignment { value, .. } = &result.ast.body.statements[0] else {
        panic!("expected assignment");
    };
    let PipelineElement::Expression {
        expression: Expression::Hashtable { entries, .. },
    } = &value.elements[0]
    else {
        panic!("expected hashtable");
    };
    let keys: Vec<_> = entries
        .iter()
        .map(|e| match &e.key {
            Expression::Bareword { text, .. } => text.as_str(),
            _ => "?",
        })
        .collect();
    assert_eq!(keys, ["Path", "Count", "Items"]);
    assert_eq!(invocation_names(&result), ["Get-ChildItem"]);
}

// ─── Trivia and spans ────────────────────────────────────────────────────────

#[test]
fn comments_are_trivia() {
    let result = parse_str("# header\nGet-Item x # trailing\n<# block\ncomment #>\n");
    let trivia = result
        .ast
        .body
        .statements
        .iter()
        .filter(|s| matches!(s, Statement::Trivia { .. }))
        .count();
    assert_eq!(trivia, 2);
    assert_eq!(invocation_names(&result), ["Get-Item"]);
}

#[test]
fn invocation_spans_cover_the_command() {
    let src = "  Copy-Item -Path a -Destination b | Out-Null";
    let result = parse_str(src);
    let cmd = first_command(&result);
    assert_eq!(&src[cmd.span.start..cmd.span.end], "Copy-Item -Path a -Destination b");
}

#[test]
fn backtick_continues_a_command() {
    let result = parse_str("Copy-Item -Path a `\n  -Destination b");
    assert_eq!(first_command(&result).elements.len(), 4);
}

// ─── Diagnostics ─────────────────────────────────────────────────────────────

#[test]
fn unterminated_string() {
    let result = parse_str("Write-Output 'oops");
    assert_eq!(extract_diag_codes(&result), [codes::PARSER_UNTERMINATED_STRING]);
    let d = &result.diagnostics[0];
    assert_eq!(d.severity, Severity::ParseError);
    assert_eq!(d.message, "string literal is missing the terminator '");
}

#[test]
fn missing_closers() {
    let result = parse_str("if ($x) { Get-Item");
    assert_eq!(extract_diag_codes(&result), [codes::PARSER_MISSING_CLOSE_BRACE]);
    assert_eq!(invocation_names(&result), ["Get-Item"]);

    let result = parse_str("Write-Output (Get-Date");
    assert_eq!(extract_diag_codes(&result), [codes::PARSER_MISSING_CLOSE_PAREN]);
}

#[test]
fn stray_closer_recovers_at_next_statement() {
    let result = parse_str("Get-A }\nGet-B");
    assert_eq!(extract_diag_codes(&result), [codes::PARSER_UNEXPECTED_TOKEN]);
    assert_eq!(result.diagnostics[0].message, "unexpected token '}'");
    assert_eq!(invocation_names(&result), ["Get-A", "Get-B"]);
}

#[test]
fn empty_input() {
    let result = parse_str("");
    assert!(result.ast.body.statements.is_empty());
    assert!(result.diagnostics.is_empty());
}

#[test]
fn moderate_nesting_parses_normally() {
    let src = format!("{}Get-Date{}", "(".repeat(100), ")".repeat(100));
    let result = parse_str(&src);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(invocation_names(&result), ["Get-Date"]);
}

#[test]
fn nesting_past_the_limit_is_skipped_and_reported() {
    let src = format!(
        "{}Get-Date{}\nGet-Item -Path x",
        "(".repeat(300),
        ")".repeat(300)
    );
    let result = parse_str(&src);
    assert_eq!(extract_diag_codes(&result), [codes::PARSER_NESTING_TOO_DEEP]);
    let d = &result.diagnostics[0];
    assert_eq!(d.severity, Severity::ParseError);
    assert_eq!(d.message, "nesting exceeds the maximum depth of 128");
    // The skipped group runs from the 129th opener through its closer.
    let span = d.span.expect("span");
    assert_eq!(span.start, 128);
    assert_eq!(&src[span.end - 1..span.end], ")");
    // Parsing resumes after the outer closers.
    assert_eq!(invocation_names(&result), ["Get-Item"]);
}

#[test]
fn deep_mixed_nesting_does_not_overflow() {
    let src = format!("{}Get-Date", "{ @( $( @{ a = ".repeat(200));
    let result = parse_str(&src);
    assert!(
        extract_diag_codes(&result)
            .iter()
            .any(|c| c == codes::PARSER_NESTING_TOO_DEEP)
    );
    assert!(invocation_names(&result).is_empty());
}

// ─── Serialization ───────────────────────────────────────────────────────────

#[test]
fn ast_serializes_with_kind_tags() {
    let result = parse_str("Copy-Item -Force");
    let json = to_pretty_json(&result.ast).expect("serialize");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
    let stmt = &value["body"]["statements"][0];
    assert_eq!(stmt["kind"], "Pipeline");
    assert_eq!(stmt["elements"][0]["kind"], "Command");
    assert_eq!(stmt["elements"][0]["head"]["text"], "Copy-Item");

    let full = parse_result_to_json(&result).expect("serialize");
    assert!(full.contains("\"diagnostics\": []"));
}

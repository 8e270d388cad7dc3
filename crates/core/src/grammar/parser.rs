use super::{
    ast::{
        Ast, Clause, CommandElement, CommandInvocation, Expression, HashEntry, InvocationOperator,
        Pipeline, PipelineElement, Redirection, ScriptBlock, Statement,
    },
    diag::{Diagnostic, Span, codes, render_message},
    lexer::{TokKind, Token, tokenize},
};
use std::collections::BTreeMap;

/// Shorthand for building a `BTreeMap<String, String>` context from key-value pairs.
macro_rules! ctx {
    ($($k:expr => $v:expr),+ $(,)?) => {
        BTreeMap::from([$(($k.into(), $v.into())),+])
    };
}

/// Result of parsing a script.
#[derive(Debug, serde::Serialize)]
pub struct ParseResult {
    /// The parsed syntax tree (best effort when diagnostics are present).
    pub ast: Ast,
    /// Parse diagnostics, all with severity `ParseError`.
    pub diagnostics: Vec<Diagnostic>,
}

// ─── Public API ─────────────────────────────────────────────────────────────

/// Parse a script.
///
/// Never fails: malformed input yields a partial tree plus diagnostics, and
/// the parser resynchronizes at the next statement boundary.
pub fn parse_str(input: &str) -> ParseResult {
    Parser::new(input).parse()
}

// ─── Parser Implementation ─────────────────────────────────────────────────

/// Which token ends the statement list being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closer {
    Eof,
    Brace,
    Paren,
}

/// Statement keywords that take `(condition)` and/or `{ body }` clauses.
const COMPOUND_KEYWORDS: &[&str] = &[
    "if",
    "while",
    "for",
    "foreach",
    "switch",
    "try",
    "do",
    "trap",
    "begin",
    "process",
    "end",
    "dynamicparam",
    "clean",
];

const FLOW_KEYWORDS: &[&str] = &["return", "throw", "exit", "break", "continue"];

/// How deeply blocks, sub-expressions and hashtables may nest.
const MAX_NESTING_DEPTH: usize = 128;

const ASSIGNMENT_OPERATORS: &[&str] = &["??=", "+=", "-=", "*=", "/=", "%=", "="];

fn continuation_keywords(keyword: &str) -> &'static [&'static str] {
    match keyword {
        "if" => &["elseif", "else"],
        "try" => &["catch", "finally"],
        "do" => &["while", "until"],
        _ => &[],
    }
}

fn assignment_operator_len(text: &str) -> Option<usize> {
    ASSIGNMENT_OPERATORS
        .iter()
        .find(|op| text.starts_with(**op))
        .map(|op| op.len())
}

fn is_number_like(text: &str) -> bool {
    let body = text.strip_prefix(['-', '+']).unwrap_or(text);
    body.starts_with(|c: char| c.is_ascii_digit())
        || (body.starts_with('.') && body[1..].starts_with(|c: char| c.is_ascii_digit()))
}

fn unquote(text: &str) -> (String, bool) {
    if let Some(rest) = text.strip_prefix("@'") {
        let inner = rest.strip_suffix("'@").unwrap_or(rest);
        return (trim_here_string(inner).to_string(), false);
    }
    if let Some(rest) = text.strip_prefix("@\"") {
        let inner = trim_here_string(rest.strip_suffix("\"@").unwrap_or(rest));
        return (inner.to_string(), has_expansion(inner));
    }
    if let Some(rest) = text.strip_prefix('\'') {
        let inner = rest.strip_suffix('\'').unwrap_or(rest);
        return (inner.replace("''", "'"), false);
    }
    if let Some(rest) = text.strip_prefix('"') {
        let inner = rest.strip_suffix('"').unwrap_or(rest);
        return (inner.replace("\"\"", "\""), has_expansion(inner));
    }
    (text.to_string(), false)
}

fn trim_here_string(inner: &str) -> &str {
    let inner = inner
        .strip_prefix("\r\n")
        .or_else(|| inner.strip_prefix('\n'))
        .unwrap_or(inner);
    inner
        .strip_suffix("\r\n")
        .or_else(|| inner.strip_suffix('\n'))
        .unwrap_or(inner)
}

/// `$` not escaped by a backtick.
fn has_expansion(s: &str) -> bool {
    let mut prev = ' ';
    s.chars().any(|c| {
        let hit = c == '$' && prev != '`';
        prev = c;
        hit
    })
}

fn variable_name(text: &str) -> (String, bool) {
    if let Some(name) = text.strip_prefix('@') {
        return (name.to_string(), true);
    }
    let name = text.strip_prefix('$').unwrap_or(text);
    let name = name
        .strip_prefix('{')
        .and_then(|n| n.strip_suffix('}'))
        .unwrap_or(name);
    (name.to_string(), false)
}

struct Parser<'a> {
    input: &'a str,
    toks: Vec<Token<'a>>,
    pos: usize,
    /// End offset of the last significant token consumed.
    last_end: usize,
    diags: Vec<Diagnostic>,
    /// Open blocks, sub-expressions and hashtables around the cursor.
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            toks: tokenize(input),
            pos: 0,
            last_end: 0,
            diags: Vec::new(),
            depth: 0,
        }
    }

    fn parse(mut self) -> ParseResult {
        let statements = self.parse_statements(Closer::Eof);
        ParseResult {
            ast: Ast {
                body: ScriptBlock {
                    statements,
                    span: Span::new(0, self.input.len()),
                },
            },
            diagnostics: self.diags,
        }
    }

    // ── Token navigation ────────────────────────────────────────────────

    fn peek(&self) -> Option<&Token<'a>> {
        self.toks.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokKind> {
        self.peek().map(|t| t.kind)
    }

    fn advance(&mut self) -> Token<'a> {
        let tok = self.toks[self.pos].clone();
        self.pos += 1;
        if !tok.is_trivia() && tok.kind != TokKind::Newline {
            self.last_end = tok.end;
        }
        tok
    }

    fn skip_ws(&mut self) {
        while self.peek_kind() == Some(TokKind::Whitespace) {
            self.pos += 1;
        }
    }

    fn skip_ws_and_newlines(&mut self) {
        while matches!(
            self.peek_kind(),
            Some(TokKind::Whitespace | TokKind::Newline | TokKind::Comment)
        ) {
            self.pos += 1;
        }
    }

    /// Index of the next token that is not whitespace, newline, or comment.
    fn next_significant(&self, from: usize) -> Option<usize> {
        (from..self.toks.len()).find(|&i| {
            !matches!(
                self.toks[i].kind,
                TokKind::Whitespace | TokKind::Newline | TokKind::Comment
            )
        })
    }

    fn adjacent_to_previous(&self) -> bool {
        self.peek().is_some_and(|t| t.start == self.last_end)
    }

    /// Split the current token in two at byte offset `at` (relative to its start).
    fn split_current(&mut self, at: usize) {
        let tok = self.toks[self.pos].clone();
        let mid = tok.start + at;
        let head = Token {
            kind: TokKind::Word,
            text: &self.input[tok.start..mid],
            end: mid,
            ..tok.clone()
        };
        let tail = Token {
            kind: TokKind::Word,
            text: &self.input[mid..tok.end],
            start: mid,
            ..tok
        };
        self.toks[self.pos] = head;
        self.toks.insert(self.pos + 1, tail);
    }

    fn report(&mut self, id: &'static str, span: Span, context: BTreeMap<String, String>) {
        let message = render_message(id, "default", &context).unwrap_or_else(|| id.to_string());
        self.diags
            .push(Diagnostic::parse_error(id, message, Some(span)).with_context(context));
    }

    fn report_unexpected_current(&mut self) {
        let tok = self.advance();
        self.report(
            codes::PARSER_UNEXPECTED_TOKEN,
            Span::new(tok.start, tok.end),
            ctx!("token" => tok.text),
        );
    }

    /// Positioned on an opener. At the nesting limit, consume the whole group
    /// through its matching closer, report it, and return the group's span.
    fn skip_group_if_too_deep(&mut self) -> Option<Span> {
        if self.depth < MAX_NESTING_DEPTH {
            return None;
        }
        let start = self.toks[self.pos].start;
        let mut end = self.input.len();
        let mut open = 0usize;
        while self.peek().is_some() {
            let tok = self.advance();
            match tok.kind {
                TokKind::LBrace
                | TokKind::AtBrace
                | TokKind::LParen
                | TokKind::DollarParen
                | TokKind::AtParen => open += 1,
                TokKind::RBrace | TokKind::RParen => open = open.saturating_sub(1),
                _ => {}
            }
            if open == 0 {
                end = tok.end;
                break;
            }
        }
        let span = Span::new(start, end);
        self.report(
            codes::PARSER_NESTING_TOO_DEEP,
            span,
            ctx!("limit" => MAX_NESTING_DEPTH.to_string()),
        );
        Some(span)
    }

    /// Parse statements one nesting level down.
    fn parse_nested_statements(&mut self, closer: Closer) -> Vec<Statement> {
        self.depth += 1;
        let statements = self.parse_statements(closer);
        self.depth -= 1;
        statements
    }

    // ── Statements ──────────────────────────────────────────────────────

    fn parse_statements(&mut self, closer: Closer) -> Vec<Statement> {
        let mut statements = Vec::new();
        loop {
            while matches!(
                self.peek_kind(),
                Some(TokKind::Whitespace | TokKind::Newline | TokKind::Semicolon | TokKind::Chain)
            ) {
                self.pos += 1;
            }
            let Some(kind) = self.peek_kind() else {
                break;
            };
            match kind {
                TokKind::Comment => {
                    let tok = self.advance();
                    statements.push(Statement::Trivia {
                        text: tok.text.to_string(),
                        span: Span::new(tok.start, tok.end),
                    });
                }
                TokKind::RBrace if closer == Closer::Brace => break,
                TokKind::RParen if closer == Closer::Paren => break,
                _ => {
                    let before = self.pos;
                    if let Some(statement) = self.parse_statement() {
                        statements.push(statement);
                    }
                    if self.pos == before {
                        self.report_unexpected_current();
                    }
                }
            }
        }
        statements
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        let tok = self.peek()?;
        if tok.kind == TokKind::Word {
            let keyword = tok.text.to_ascii_lowercase();
            let next = self
                .next_significant(self.pos + 1)
                .map(|i| self.toks[i].kind);
            if (keyword == "function" || keyword == "filter") && next == Some(TokKind::Word) {
                return Some(self.parse_function(keyword));
            }
            if COMPOUND_KEYWORDS.contains(&keyword.as_str())
                && matches!(
                    next,
                    Some(TokKind::LParen | TokKind::LBrace | TokKind::Parameter)
                )
            {
                return Some(self.parse_compound(keyword));
            }
            if FLOW_KEYWORDS.contains(&keyword.as_str()) {
                let tok = self.advance();
                self.skip_ws();
                let value = self.parse_pipeline();
                let end = value.as_ref().map_or(tok.end, |p| p.span.end);
                return Some(Statement::Flow {
                    keyword,
                    value,
                    span: Span::new(tok.start, end),
                });
            }
        }
        self.parse_pipeline_statement()
    }

    fn parse_function(&mut self, keyword: String) -> Statement {
        let start = self.advance().start;
        self.skip_ws_and_newlines();
        let name = self.advance().text.to_string();
        self.skip_ws_and_newlines();
        let params = if self.peek_kind() == Some(TokKind::LParen) {
            Some(self.parse_subexpression())
        } else {
            None
        };
        self.skip_ws_and_newlines();
        let body = if self.peek_kind() == Some(TokKind::LBrace) {
            self.parse_block()
        } else {
            let at = self.peek().map_or(self.input.len(), |t| t.start);
            let token = self.peek().map_or("end of input", |t| t.text).to_string();
            self.report(
                codes::PARSER_UNEXPECTED_TOKEN,
                Span::empty(at),
                ctx!("token" => token),
            );
            ScriptBlock {
                statements: Vec::new(),
                span: Span::empty(at),
            }
        };
        Statement::Function {
            keyword,
            name,
            params,
            span: Span::new(start, body.span.end),
            body,
        }
    }

    fn parse_compound(&mut self, keyword: String) -> Statement {
        let start = self.peek().map_or(0, |t| t.start);
        let mut clauses = vec![self.parse_clause()];
        let continuations = continuation_keywords(&keyword);
        loop {
            let Some(i) = self.next_significant(self.pos) else {
                break;
            };
            let tok = &self.toks[i];
            if tok.kind != TokKind::Word
                || !continuations.contains(&tok.text.to_ascii_lowercase().as_str())
            {
                break;
            }
            self.pos = i;
            clauses.push(self.parse_clause());
        }
        Statement::Compound {
            keyword,
            clauses,
            span: Span::new(start, self.last_end.max(start)),
        }
    }

    /// `keyword [types] [-options] [(condition)] [{ body }]`, positioned on the keyword.
    fn parse_clause(&mut self) -> Clause {
        let keyword = self.advance().text.to_ascii_lowercase();
        let mut types = Vec::new();
        loop {
            self.skip_ws_and_newlines();
            match self.peek_kind() {
                Some(TokKind::TypeLiteral) => types.push(self.advance().text.to_string()),
                Some(TokKind::Comma | TokKind::Parameter) => {
                    self.advance();
                }
                _ => break,
            }
        }
        let condition = if self.peek_kind() == Some(TokKind::LParen) {
            Some(self.parse_subexpression())
        } else {
            None
        };
        if condition.is_some() {
            let save = self.pos;
            self.skip_ws_and_newlines();
            if self.peek_kind() != Some(TokKind::LBrace) {
                self.pos = save;
            }
        }
        let body = if self.peek_kind() == Some(TokKind::LBrace) {
            Some(self.parse_block())
        } else {
            None
        };
        Clause {
            keyword,
            types,
            condition,
            body,
        }
    }

    // ── Pipelines ───────────────────────────────────────────────────────

    fn parse_pipeline_statement(&mut self) -> Option<Statement> {
        let first = self.parse_pipeline_element()?;
        if let PipelineElement::Expression { expression } = &first {
            self.skip_ws();
            if let Some(tok) = self.peek()
                && tok.kind == TokKind::Word
                && let Some(len) = assignment_operator_len(tok.text)
            {
                if len < tok.text.len() {
                    self.split_current(len);
                }
                let operator = self.advance();
                self.skip_ws_and_newlines();
                let value = self.parse_pipeline().unwrap_or(Pipeline {
                    elements: Vec::new(),
                    span: Span::empty(operator.end),
                });
                let start = expression.span().start;
                let end = value.span.end.max(operator.end);
                return Some(Statement::Assignment {
                    target: expression.clone(),
                    operator: operator.text.to_string(),
                    value,
                    span: Span::new(start, end),
                });
            }
        }
        Some(Statement::Pipeline(self.continue_pipeline(first)))
    }

    fn parse_pipeline(&mut self) -> Option<Pipeline> {
        let first = self.parse_pipeline_element()?;
        Some(self.continue_pipeline(first))
    }

    fn continue_pipeline(&mut self, first: PipelineElement) -> Pipeline {
        let start = element_span(&first).start;
        let mut elements = vec![first];
        loop {
            self.skip_ws();
            if self.peek_kind() == Some(TokKind::Comment) {
                self.pos += 1;
                continue;
            }
            if self.peek_kind() != Some(TokKind::Pipe) {
                break;
            }
            self.advance();
            self.skip_ws_and_newlines();
            match self.parse_pipeline_element() {
                Some(element) => elements.push(element),
                None => {
                    let at = self.peek().map_or(self.input.len(), |t| t.start);
                    self.report(
                        codes::PARSER_UNEXPECTED_TOKEN,
                        Span::empty(at),
                        ctx!("token" => "|"),
                    );
                    break;
                }
            }
        }
        Pipeline {
            elements,
            span: Span::new(start, self.last_end.max(start)),
        }
    }

    fn parse_pipeline_element(&mut self) -> Option<PipelineElement> {
        self.skip_ws();
        let tok = self.peek()?.clone();
        match tok.kind {
            TokKind::Amp => {
                self.advance();
                self.skip_ws();
                let head = self.parse_primary()?;
                Some(PipelineElement::Command(self.parse_command(
                    tok.start,
                    Some(InvocationOperator::Call),
                    head,
                )))
            }
            TokKind::Word
                if tok.text == "."
                    && self
                        .toks
                        .get(self.pos + 1)
                        .is_some_and(|t| t.kind == TokKind::Whitespace) =>
            {
                self.advance();
                self.skip_ws();
                let head = self.parse_primary()?;
                Some(PipelineElement::Command(self.parse_command(
                    tok.start,
                    Some(InvocationOperator::DotSource),
                    head,
                )))
            }
            TokKind::Word
                if !is_number_like(tok.text) && assignment_operator_len(tok.text).is_none() =>
            {
                self.advance();
                let head = Expression::Bareword {
                    text: tok.text.to_string(),
                    span: Span::new(tok.start, tok.end),
                };
                Some(PipelineElement::Command(
                    self.parse_command(tok.start, None, head),
                ))
            }
            TokKind::Newline
            | TokKind::Semicolon
            | TokKind::Pipe
            | TokKind::Chain
            | TokKind::RBrace
            | TokKind::RParen => None,
            _ => self
                .parse_expression()
                .map(|expression| PipelineElement::Expression { expression }),
        }
    }

    // ── Commands ────────────────────────────────────────────────────────

    fn parse_command(
        &mut self,
        start: usize,
        operator: Option<InvocationOperator>,
        head: Expression,
    ) -> CommandInvocation {
        let mut elements = Vec::new();
        let mut redirections = Vec::new();
        let mut end_of_parameters = false;
        while let Some(tok) = self.peek().cloned() {
            match tok.kind {
                TokKind::Whitespace | TokKind::Comment => self.pos += 1,
                TokKind::Newline
                | TokKind::Semicolon
                | TokKind::Pipe
                | TokKind::Chain
                | TokKind::Amp
                | TokKind::RBrace
                | TokKind::RParen => break,
                TokKind::Redirection => {
                    self.advance();
                    let merges_stream = tok.text.contains('&');
                    let target = if merges_stream {
                        None
                    } else {
                        self.skip_ws();
                        self.parse_argument()
                    };
                    redirections.push(Redirection {
                        operator: tok.text.to_string(),
                        target,
                        span: Span::new(tok.start, self.last_end),
                    });
                }
                TokKind::Parameter if !end_of_parameters => {
                    self.advance();
                    let argument = if tok.colon {
                        self.skip_ws();
                        self.parse_argument()
                    } else {
                        None
                    };
                    elements.push(CommandElement::Parameter {
                        name: tok.parameter_name().to_string(),
                        argument,
                        span: Span::new(tok.start, self.last_end),
                    });
                }
                TokKind::Word if tok.text == "--" && !end_of_parameters => {
                    self.advance();
                    end_of_parameters = true;
                }
                _ => match self.parse_argument() {
                    Some(value) => elements.push(CommandElement::Argument { value }),
                    None => break,
                },
            }
        }
        CommandInvocation {
            operator,
            span: Span::new(start, self.last_end.max(head.span().end)),
            head,
            elements,
            redirections,
        }
    }

    /// A command argument: adjacent atoms, optionally comma-joined into an array.
    fn parse_argument(&mut self) -> Option<Expression> {
        let first = self.parse_adjacent()?;
        let save = self.pos;
        self.skip_ws();
        if self.peek_kind() != Some(TokKind::Comma) {
            self.pos = save;
            return Some(first);
        }
        let start = first.span().start;
        let mut items = vec![first];
        while self.peek_kind() == Some(TokKind::Comma) {
            self.advance();
            self.skip_ws_and_newlines();
            match self.parse_adjacent() {
                Some(item) => items.push(item),
                None => break,
            }
            let save = self.pos;
            self.skip_ws();
            if self.peek_kind() != Some(TokKind::Comma) {
                self.pos = save;
            }
        }
        Some(Expression::Array {
            items,
            span: Span::new(start, self.last_end),
        })
    }

    /// Tokens written without whitespace between them form one argument,
    /// e.g. `C:\$dir\file`, `$x.Name`, `$list[0]`.
    fn parse_adjacent(&mut self) -> Option<Expression> {
        let first = self.parse_argument_atom()?;
        let mut parts = vec![first];
        while self.adjacent_to_previous()
            && matches!(
                self.peek_kind(),
                Some(
                    TokKind::Word
                        | TokKind::Variable
                        | TokKind::String
                        | TokKind::TypeLiteral
                        | TokKind::DollarParen
                        | TokKind::LParen
                )
            )
        {
            match self.parse_argument_atom() {
                Some(part) => parts.push(part),
                None => break,
            }
        }
        if parts.len() == 1 {
            return parts.pop();
        }
        let span = Span::new(parts[0].span().start, self.last_end);
        Some(Expression::Sequence { parts, span })
    }

    fn parse_argument_atom(&mut self) -> Option<Expression> {
        let tok = self.peek()?.clone();
        match tok.kind {
            TokKind::Newline
            | TokKind::Semicolon
            | TokKind::Pipe
            | TokKind::Chain
            | TokKind::Amp
            | TokKind::RBrace
            | TokKind::RParen
            | TokKind::Whitespace
            | TokKind::Comment
            | TokKind::Redirection => None,
            TokKind::Parameter | TokKind::Comma | TokKind::Word => {
                self.advance();
                Some(Expression::Bareword {
                    text: tok.text.to_string(),
                    span: Span::new(tok.start, tok.end),
                })
            }
            _ => self.parse_primary(),
        }
    }

    // ── Expressions ─────────────────────────────────────────────────────

    /// Expression-mode pipeline element: a flat run of operands and operators.
    fn parse_expression(&mut self) -> Option<Expression> {
        let mut parts = Vec::new();
        while let Some(tok) = self.peek().cloned() {
            match tok.kind {
                TokKind::Whitespace | TokKind::Comment => self.pos += 1,
                TokKind::Newline
                | TokKind::Semicolon
                | TokKind::Pipe
                | TokKind::Chain
                | TokKind::Amp
                | TokKind::RBrace
                | TokKind::RParen => break,
                TokKind::Word
                    if !parts.is_empty() && assignment_operator_len(tok.text).is_some() =>
                {
                    break;
                }
                TokKind::Word | TokKind::Parameter | TokKind::Comma | TokKind::Redirection => {
                    self.advance();
                    parts.push(Expression::Bareword {
                        text: tok.text.to_string(),
                        span: Span::new(tok.start, tok.end),
                    });
                }
                _ => match self.parse_primary() {
                    Some(part) => parts.push(part),
                    None => break,
                },
            }
        }
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => {
                let span = Span::new(parts[0].span().start, self.last_end);
                Some(Expression::Sequence { parts, span })
            }
        }
    }

    fn parse_primary(&mut self) -> Option<Expression> {
        let tok = self.peek()?.clone();
        let span = Span::new(tok.start, tok.end);
        match tok.kind {
            TokKind::Word => {
                self.advance();
                Some(Expression::Bareword {
                    text: tok.text.to_string(),
                    span,
                })
            }
            TokKind::String => {
                self.advance();
                if tok.unterminated {
                    let quote = tok
                        .text
                        .chars()
                        .find(|c| *c == '\'' || *c == '"')
                        .unwrap_or('"');
                    self.report(
                        codes::PARSER_UNTERMINATED_STRING,
                        span,
                        ctx!("quote" => quote.to_string()),
                    );
                }
                let (value, expandable) = unquote(tok.text);
                Some(Expression::StringLiteral {
                    value,
                    expandable,
                    span,
                })
            }
            TokKind::Variable => {
                self.advance();
                let (name, splatted) = variable_name(tok.text);
                Some(Expression::Variable {
                    name,
                    splatted,
                    span,
                })
            }
            TokKind::TypeLiteral => {
                self.advance();
                Some(Expression::TypeLiteral {
                    text: tok.text.to_string(),
                    span,
                })
            }
            TokKind::LBrace => Some(Expression::ScriptBlock {
                block: self.parse_block(),
            }),
            TokKind::LParen | TokKind::DollarParen | TokKind::AtParen => {
                Some(self.parse_subexpression())
            }
            TokKind::AtBrace => Some(self.parse_hashtable()),
            _ => None,
        }
    }

    /// Positioned on `{`.
    fn parse_block(&mut self) -> ScriptBlock {
        if let Some(span) = self.skip_group_if_too_deep() {
            return ScriptBlock {
                statements: Vec::new(),
                span,
            };
        }
        let start = self.advance().start;
        let statements = self.parse_nested_statements(Closer::Brace);
        let end = self.expect_closer(TokKind::RBrace, codes::PARSER_MISSING_CLOSE_BRACE, "}");
        ScriptBlock {
            statements,
            span: Span::new(start, end),
        }
    }

    /// Positioned on `(`, `$(`, or `@(`.
    fn parse_subexpression(&mut self) -> Expression {
        let opener = self.toks[self.pos].text.to_string();
        if let Some(span) = self.skip_group_if_too_deep() {
            return Expression::SubExpression {
                opener,
                statements: Vec::new(),
                span,
            };
        }
        let open = self.advance();
        let statements = self.parse_nested_statements(Closer::Paren);
        let end = self.expect_closer(TokKind::RParen, codes::PARSER_MISSING_CLOSE_PAREN, ")");
        Expression::SubExpression {
            opener,
            statements,
            span: Span::new(open.start, end),
        }
    }

    /// Positioned on `@{`.
    fn parse_hashtable(&mut self) -> Expression {
        if let Some(span) = self.skip_group_if_too_deep() {
            return Expression::Hashtable {
                entries: Vec::new(),
                span,
            };
        }
        let start = self.advance().start;
        self.depth += 1;
        let mut entries = Vec::new();
        loop {
            while matches!(
                self.peek_kind(),
                Some(
                    TokKind::Whitespace | TokKind::Newline | TokKind::Semicolon | TokKind::Comment
                )
            ) {
                self.pos += 1;
            }
            let Some(tok) = self.peek().cloned() else {
                break;
            };
            if tok.kind == TokKind::RBrace {
                break;
            }
            if tok.kind == TokKind::Word
                && let Some(eq) = tok.text.find('=')
                && eq > 0
            {
                self.split_current(eq);
            }
            let Some(key) = self.parse_primary() else {
                self.report_unexpected_current();
                continue;
            };
            self.skip_ws();
            match self.peek().cloned() {
                Some(op) if op.kind == TokKind::Word && op.text.starts_with('=') => {
                    if op.text.len() > 1 {
                        self.split_current(1);
                    }
                    let op = self.advance();
                    self.skip_ws_and_newlines();
                    let value = self.parse_pipeline().unwrap_or(Pipeline {
                        elements: Vec::new(),
                        span: Span::empty(op.end),
                    });
                    entries.push(HashEntry { key, value });
                }
                Some(op)
                    if !matches!(
                        op.kind,
                        TokKind::RBrace | TokKind::Newline | TokKind::Semicolon
                    ) =>
                {
                    self.report_unexpected_current();
                }
                _ => {}
            }
        }
        self.depth -= 1;
        let end = self.expect_closer(TokKind::RBrace, codes::PARSER_MISSING_CLOSE_BRACE, "}");
        Expression::Hashtable {
            entries,
            span: Span::new(start, end),
        }
    }

    /// Consume the closing token or report it missing; returns the span end.
    fn expect_closer(&mut self, kind: TokKind, id: &'static str, text: &str) -> usize {
        if self.peek_kind() == Some(kind) {
            return self.advance().end;
        }
        let end = self.input.len();
        self.report(id, Span::empty(end), ctx!("expected" => format!("'{text}'")));
        end
    }
}

fn element_span(element: &PipelineElement) -> Span {
    match element {
        PipelineElement::Command(cmd) => cmd.span,
        PipelineElement::Expression { expression } => expression.span(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_like_words() {
        assert!(is_number_like("42"));
        assert!(is_number_like("-5"));
        assert!(is_number_like("1..10"));
        assert!(is_number_like(".5"));
        assert!(!is_number_like("Get-Item"));
        assert!(!is_number_like("."));
    }

    #[test]
    fn unquote_forms() {
        assert_eq!(unquote("'it''s'"), ("it's".to_string(), false));
        assert_eq!(unquote("\"a $b\""), ("a $b".to_string(), true));
        assert_eq!(unquote("\"cost `$5\""), ("cost `$5".to_string(), false));
        assert_eq!(unquote("@'\nraw $x\n'@"), ("raw $x".to_string(), false));
        assert_eq!(unquote("'open"), ("open".to_string(), false));
    }

    #[test]
    fn variable_names() {
        assert_eq!(variable_name("$x"), ("x".to_string(), false));
        assert_eq!(variable_name("${my var}"), ("my var".to_string(), false));
        assert_eq!(variable_name("@params"), ("params".to_string(), true));
    }

    #[test]
    fn assignment_operators() {
        assert_eq!(assignment_operator_len("="), Some(1));
        assert_eq!(assignment_operator_len("+=1"), Some(2));
        assert_eq!(assignment_operator_len("=Get-Item"), Some(1));
        assert_eq!(assignment_operator_len("Get-Item"), None);
    }
}

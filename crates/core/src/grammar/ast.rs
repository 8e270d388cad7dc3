use serde::{Deserialize, Serialize};
use cmdlint_diagnostics::Span;

/// A parsed script. The tree is immutable once built; analyses only borrow it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ast {
    /// Top-level statements.
    pub body: ScriptBlock,
}

/// A `{ ... }` block, or the script's top level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScriptBlock {
    /// Statements in source order.
    pub statements: Vec<Statement>,
    /// Source span, braces included.
    pub span: Span,
}

/// One statement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
#[non_exhaustive]
pub enum Statement {
    /// A pipeline of one or more commands or expressions.
    Pipeline(Pipeline),
    /// `target = value` (also `+=`, `-=`, ...).
    Assignment {
        /// Left-hand side.
        target: Expression,
        /// Assignment operator as written.
        operator: String,
        /// Right-hand side; commands here are ordinary invocations.
        value: Pipeline,
        /// Source span.
        span: Span,
    },
    /// `function Name { ... }` or `filter Name { ... }`.
    Function {
        /// `function` or `filter`.
        keyword: String,
        /// Declared name.
        name: String,
        /// Parenthesized parameter list, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        params: Option<Expression>,
        /// Function body.
        body: ScriptBlock,
        /// Source span.
        span: Span,
    },
    /// `if`/`while`/`foreach`/`try`/... with their follow-on clauses.
    Compound {
        /// Leading keyword, lower-cased.
        keyword: String,
        /// Clauses in source order (the leading one first).
        clauses: Vec<Clause>,
        /// Source span.
        span: Span,
    },
    /// `return`, `throw`, `exit`, `break`, `continue` with an optional pipeline.
    Flow {
        /// Keyword, lower-cased.
        keyword: String,
        /// Operand pipeline.
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Pipeline>,
        /// Source span.
        span: Span,
    },
    /// Preserved comment.
    Trivia {
        /// Comment text.
        text: String,
        /// Source span.
        span: Span,
    },
}

impl Statement {
    /// Source span of the statement.
    pub fn span(&self) -> Span {
        match self {
            Statement::Pipeline(p) => p.span,
            Statement::Assignment { span, .. }
            | Statement::Function { span, .. }
            | Statement::Compound { span, .. }
            | Statement::Flow { span, .. }
            | Statement::Trivia { span, .. } => *span,
        }
    }
}

/// One clause of a compound statement, e.g. `elseif ($x) { ... }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clause {
    /// Clause keyword, lower-cased.
    pub keyword: String,
    /// Catch-type literals, e.g. `catch [IOException]`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    /// Parenthesized condition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Expression>,
    /// Clause body (absent for `do { } while (...)` trailers).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<ScriptBlock>,
}

/// `a | b | c`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pipeline {
    /// Pipeline elements in order.
    pub elements: Vec<PipelineElement>,
    /// Source span.
    pub span: Span,
}

/// One element of a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum PipelineElement {
    /// A command invocation.
    Command(CommandInvocation),
    /// An expression used as a pipeline stage.
    Expression {
        /// The expression.
        expression: Expression,
    },
}

/// `&` (call) or `.` (dot-source) prefix on a command invocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvocationOperator {
    /// `& cmd`
    Call,
    /// `. cmd`
    DotSource,
}

/// A single command call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandInvocation {
    /// Call operator, if the command was invoked through one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<InvocationOperator>,
    /// The command name as an expression.
    pub head: Expression,
    /// Parameters and arguments after the name.
    pub elements: Vec<CommandElement>,
    /// Redirections; these are not command elements.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redirections: Vec<Redirection>,
    /// Source span of the whole invocation.
    pub span: Span,
}

impl CommandInvocation {
    /// The statically known command name, or `None` when the command is the
    /// result of an expression (`& $cmd`, `& { ... }`, `& "$prefix-Item"`).
    pub fn command_name(&self) -> Option<&str> {
        match &self.head {
            Expression::Bareword { text, .. } => Some(text),
            Expression::StringLiteral {
                value,
                expandable: false,
                ..
            } => Some(value),
            _ => None,
        }
    }
}

/// One element after the command name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum CommandElement {
    /// `-Name` or `-Name:value`.
    Parameter {
        /// Parameter name without the dash.
        name: String,
        /// Value attached with `:`; a value written after a space is a
        /// separate `Argument` element.
        #[serde(skip_serializing_if = "Option::is_none")]
        argument: Option<Expression>,
        /// Source span.
        span: Span,
    },
    /// Any other element.
    Argument {
        /// The argument value.
        value: Expression,
    },
}

impl CommandElement {
    /// Source span of the element.
    pub fn span(&self) -> Span {
        match self {
            CommandElement::Parameter { span, .. } => *span,
            CommandElement::Argument { value } => value.span(),
        }
    }
}

/// `> file`, `2>&1`, ...
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Redirection {
    /// Operator as written.
    pub operator: String,
    /// Target, absent for stream merges such as `2>&1`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Expression>,
    /// Source span.
    pub span: Span,
}

/// `key = value` inside `@{ ... }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HashEntry {
    /// Key expression.
    pub key: Expression,
    /// Value statement.
    pub value: Pipeline,
}

/// Expression forms the analyzer cares about. Anything richer (operators,
/// member access, casts) is kept as a flat [`Expression::Sequence`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
#[non_exhaustive]
pub enum Expression {
    /// Unquoted word: a command name, path, number, or operator.
    Bareword {
        /// Text as written.
        text: String,
        /// Source span.
        span: Span,
    },
    /// Quoted string.
    StringLiteral {
        /// Contents without quotes.
        value: String,
        /// Double-quoted and containing `$`: the value is computed at run time.
        expandable: bool,
        /// Source span.
        span: Span,
    },
    /// `$name`, or `@name` when splatted.
    Variable {
        /// Variable name without sigil.
        name: String,
        /// Written as `@name`.
        splatted: bool,
        /// Source span.
        span: Span,
    },
    /// `[TypeName]`.
    TypeLiteral {
        /// Text including brackets.
        text: String,
        /// Source span.
        span: Span,
    },
    /// `{ ... }`.
    ScriptBlock {
        /// The block.
        block: ScriptBlock,
    },
    /// `( ... )`, `$( ... )`, or `@( ... )`.
    SubExpression {
        /// Which opener was used: `(`, `$(`, or `@(`.
        opener: String,
        /// Enclosed statements.
        statements: Vec<Statement>,
        /// Source span.
        span: Span,
    },
    /// `@{ ... }`.
    Hashtable {
        /// Entries in source order.
        entries: Vec<HashEntry>,
        /// Source span.
        span: Span,
    },
    /// `a, b, c`.
    Array {
        /// Items in order.
        items: Vec<Expression>,
        /// Source span.
        span: Span,
    },
    /// Adjacent or operator-joined parts, e.g. `$a -eq 1`, `[int]$x`, `C:\$dir`.
    Sequence {
        /// Parts in source order.
        parts: Vec<Expression>,
        /// Source span.
        span: Span,
    },
}

impl Expression {
    /// Source span of the expression.
    pub fn span(&self) -> Span {
        match self {
            Expression::ScriptBlock { block } => block.span,
            Expression::Bareword { span, .. }
            | Expression::StringLiteral { span, .. }
            | Expression::Variable { span, .. }
            | Expression::TypeLiteral { span, .. }
            | Expression::SubExpression { span, .. }
            | Expression::Hashtable { span, .. }
            | Expression::Array { span, .. }
            | Expression::Sequence { span, .. } => *span,
        }
    }
}

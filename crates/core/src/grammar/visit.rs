use super::ast::{
    Ast, CommandElement, CommandInvocation, Expression, Pipeline, PipelineElement, ScriptBlock,
    Statement,
};

/// Pending work item for the pre-order walk.
#[derive(Clone, Copy)]
enum Pending<'a> {
    Block(&'a ScriptBlock),
    Statement(&'a Statement),
    Pipeline(&'a Pipeline),
    Expression(&'a Expression),
    Invocation(&'a CommandInvocation),
}

/// Lazy pre-order iterator over every command invocation with a statically
/// known name, at any nesting depth.
///
/// Invocations whose head is computed at run time (`& $cmd`) are not
/// yielded, but their arguments are still walked.
pub struct Invocations<'a> {
    stack: Vec<Pending<'a>>,
}

/// Walk `ast` in source order and yield each named command invocation.
pub fn find_invocations(ast: &Ast) -> Invocations<'_> {
    Invocations {
        stack: vec![Pending::Block(&ast.body)],
    }
}

impl<'a> Invocations<'a> {
    /// Push children in reverse so the leftmost is popped first.
    fn push_all<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = Pending<'a>>,
        I::IntoIter: DoubleEndedIterator,
    {
        self.stack.extend(items.into_iter().rev());
    }

    fn expand(&mut self, node: Pending<'a>) {
        match node {
            Pending::Block(block) => {
                self.push_all(block.statements.iter().map(Pending::Statement));
            }
            Pending::Pipeline(pipeline) => {
                self.push_all(pipeline.elements.iter().map(|e| match e {
                    PipelineElement::Command(cmd) => Pending::Invocation(cmd),
                    PipelineElement::Expression { expression } => Pending::Expression(expression),
                }));
            }
            Pending::Statement(statement) => self.expand_statement(statement),
            Pending::Expression(expression) => self.expand_expression(expression),
            Pending::Invocation(cmd) => {
                let mut children = vec![Pending::Expression(&cmd.head)];
                for element in &cmd.elements {
                    match element {
                        CommandElement::Parameter {
                            argument: Some(arg),
                            ..
                        } => children.push(Pending::Expression(arg)),
                        CommandElement::Parameter { argument: None, .. } => {}
                        CommandElement::Argument { value } => {
                            children.push(Pending::Expression(value));
                        }
                    }
                }
                children.extend(
                    cmd.redirections
                        .iter()
                        .filter_map(|r| r.target.as_ref().map(Pending::Expression)),
                );
                self.push_all(children);
            }
        }
    }

    fn expand_statement(&mut self, statement: &'a Statement) {
        match statement {
            Statement::Pipeline(pipeline) => self.stack.push(Pending::Pipeline(pipeline)),
            Statement::Assignment { target, value, .. } => {
                self.push_all([Pending::Expression(target), Pending::Pipeline(value)]);
            }
            Statement::Function { params, body, .. } => {
                let mut children: Vec<_> = params.iter().map(Pending::Expression).collect();
                children.push(Pending::Block(body));
                self.push_all(children);
            }
            Statement::Compound { clauses, .. } => {
                let mut children = Vec::new();
                for clause in clauses {
                    children.extend(clause.condition.iter().map(Pending::Expression));
                    children.extend(clause.body.iter().map(Pending::Block));
                }
                self.push_all(children);
            }
            Statement::Flow { value, .. } => {
                self.stack.extend(value.iter().map(Pending::Pipeline));
            }
            Statement::Trivia { .. } => {}
        }
    }

    fn expand_expression(&mut self, expression: &'a Expression) {
        match expression {
            Expression::ScriptBlock { block } => self.stack.push(Pending::Block(block)),
            Expression::SubExpression { statements, .. } => {
                self.push_all(statements.iter().map(Pending::Statement));
            }
            Expression::Hashtable { entries, .. } => {
                let children: Vec<_> = entries
                    .iter()
                    .flat_map(|e| [Pending::Expression(&e.key), Pending::Pipeline(&e.value)])
                    .collect();
                self.push_all(children);
            }
            Expression::Array { items, .. } => {
                self.push_all(items.iter().map(Pending::Expression));
            }
            Expression::Sequence { parts, .. } => {
                self.push_all(parts.iter().map(Pending::Expression));
            }
            Expression::Bareword { .. }
            | Expression::StringLiteral { .. }
            | Expression::Variable { .. }
            | Expression::TypeLiteral { .. } => {}
        }
    }
}

impl<'a> Iterator for Invocations<'a> {
    type Item = &'a CommandInvocation;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            self.expand(node);
            if let Pending::Invocation(cmd) = node
                && cmd.command_name().is_some()
            {
                return Some(cmd);
            }
        }
        None
    }
}

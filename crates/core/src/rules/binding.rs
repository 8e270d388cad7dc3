use crate::grammar::ast::{CommandElement, CommandInvocation, Expression};
use cmdlint_catalog::ResolvedCommand;

/// A command element after parameter/value pairing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundElement<'a> {
    /// An explicitly named parameter, with its value if it took one.
    Named {
        /// Parameter name without the dash.
        name: &'a str,
        /// Inline (`-Name:value`) or following value.
        value: Option<&'a Expression>,
    },
    /// An argument with no parameter name; binds by position.
    Positional {
        /// The argument.
        value: &'a Expression,
    },
}

/// Pair parameter tokens with the argument that follows them.
///
/// `-Name value` arrives from the parser as two elements. The value belongs
/// to the parameter unless the parameter already has an inline `:value` or
/// `command` declares it as a switch. Parameters unknown to `command`, and
/// all parameters when `command` is `None`, are assumed to take a value.
pub fn classify_elements<'a>(
    invocation: &'a CommandInvocation,
    command: Option<&ResolvedCommand>,
) -> Vec<BoundElement<'a>> {
    let mut bound = Vec::with_capacity(invocation.elements.len());
    let mut elements = invocation.elements.iter().peekable();
    while let Some(element) = elements.next() {
        match element {
            CommandElement::Parameter {
                name,
                argument: Some(arg),
                ..
            } => bound.push(BoundElement::Named {
                name,
                value: Some(arg),
            }),
            CommandElement::Parameter {
                name,
                argument: None,
                ..
            } => {
                let is_switch = command
                    .and_then(|c| c.parameter(name))
                    .is_some_and(|p| p.switch);
                let value = if is_switch {
                    None
                } else {
                    elements
                        .next_if(|e| matches!(e, CommandElement::Argument { .. }))
                        .and_then(|e| match e {
                            CommandElement::Argument { value } => Some(value),
                            CommandElement::Parameter { .. } => None,
                        })
                };
                bound.push(BoundElement::Named { name, value });
            }
            CommandElement::Argument { value } => bound.push(BoundElement::Positional { value }),
        }
    }
    bound
}

/// `true` when any argument binds by position.
pub fn is_positional_binding_used(
    invocation: &CommandInvocation,
    command: Option<&ResolvedCommand>,
) -> bool {
    classify_elements(invocation, command)
        .iter()
        .any(|e| matches!(e, BoundElement::Positional { .. }))
}

/// Names of explicitly named parameters, in source order.
pub fn named_parameters<'a>(
    invocation: &'a CommandInvocation,
    command: Option<&ResolvedCommand>,
) -> Vec<&'a str> {
    classify_elements(invocation, command)
        .into_iter()
        .filter_map(|e| match e {
            BoundElement::Named { name, .. } => Some(name),
            BoundElement::Positional { .. } => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{ast::PipelineElement, ast::Statement, parser::parse_str};
    use cmdlint_catalog::{CommandKind, ParameterInfo};

    fn invocation(src: &str) -> CommandInvocation {
        let result = parse_str(src);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        match result.ast.body.statements.into_iter().next() {
            Some(Statement::Pipeline(p)) => match p.elements.into_iter().next() {
                Some(PipelineElement::Command(cmd)) => cmd,
                other => panic!("expected a command, got {other:?}"),
            },
            other => panic!("expected a pipeline, got {other:?}"),
        }
    }

    fn copy_item() -> ResolvedCommand {
        let param = |name: &str, switch| ParameterInfo {
            name: name.into(),
            per_set_mandatory: vec![name == "Path"],
            switch,
        };
        ResolvedCommand {
            name: "Copy-Item".into(),
            kind: CommandKind::Cmdlet,
            parameter_set_count: 1,
            parameters: vec![
                param("Path", false),
                param("Destination", false),
                param("Recurse", true),
            ],
        }
    }

    #[test]
    fn parameter_values_are_not_positional() {
        let cmd = invocation("Copy-Item -Path src -Destination dst");
        assert!(!is_positional_binding_used(&cmd, None));
        assert_eq!(named_parameters(&cmd, None), ["Path", "Destination"]);
    }

    #[test]
    fn bare_arguments_are_positional() {
        let cmd = invocation("Copy-Item 'src' 'dst'");
        assert!(is_positional_binding_used(&cmd, None));
        assert!(named_parameters(&cmd, None).is_empty());
    }

    #[test]
    fn inline_value_leaves_following_argument_positional() {
        let cmd = invocation("Copy-Item -Path:src dst");
        assert!(is_positional_binding_used(&cmd, None));
    }

    #[test]
    fn switch_does_not_consume_the_next_argument() {
        let cmd = invocation("Copy-Item -Recurse src");
        let md = copy_item();
        assert!(is_positional_binding_used(&cmd, Some(&md)));
        // Without metadata the switch is assumed to take `src`.
        assert!(!is_positional_binding_used(&cmd, None));
    }

    #[test]
    fn splatting_counts_as_positional() {
        let cmd = invocation("Copy-Item @params");
        assert!(is_positional_binding_used(&cmd, None));
        let bound = classify_elements(&cmd, None);
        assert!(matches!(
            bound[0],
            BoundElement::Positional {
                value: Expression::Variable { splatted: true, .. }
            }
        ));
    }

    #[test]
    fn trailing_parameter_has_no_value() {
        let cmd = invocation("Copy-Item -Destination");
        assert_eq!(
            classify_elements(&cmd, None),
            [BoundElement::Named {
                name: "Destination",
                value: None
            }]
        );
    }
}

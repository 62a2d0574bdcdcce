//! One dispatch pass over the command tree
//!
//! The dispatcher walks the tree one input token at a time, checking the
//! permission of every node it enters. Once a command is selected, flag and
//! switch literals are pulled out of the remaining input, every parameter is
//! resolved and validated in natural order, and only then is the command's
//! action invoked.

use std::collections::{HashMap, HashSet};

use tracing::{debug, error, warn};

use crate::actor::{Actor, Permission};
use crate::command::{CommandInvocation, CommandParameter, ExecutableCommand, ParameterKind};
use crate::errors::{
    DispatchError, DispatchResult, FailureSite, ResolveResultExt, ValidationResultExt,
};
use crate::handler::{CommandHandler, DispatchOutcome};
use crate::path::{CommandPath, MutableCommandPath};
use crate::process::{ResolvedArguments, ResolverContext};
use crate::stack::{tokenize, ArgumentStack};
use crate::types::ArgValue;

/// Literal inputs pulled out of the stack before positional resolution
#[derive(Default)]
struct NamedInput {
    switches: HashSet<String>,
    flags: HashMap<String, String>,
}

pub(crate) struct Dispatcher<'h> {
    handler: &'h CommandHandler,
    actor: &'h dyn Actor,
}

impl<'h> Dispatcher<'h> {
    pub(crate) fn new(handler: &'h CommandHandler, actor: &'h dyn Actor) -> Self {
        Self { handler, actor }
    }

    pub(crate) fn dispatch(&self, input: &str) -> DispatchResult<DispatchOutcome> {
        let result = self.run(input);
        match &result {
            Ok(outcome) => debug!("Dispatched '{}' for {}", outcome.path, self.actor.name()),
            Err(e @ DispatchError::IllegalResolverState { trace, .. }) => {
                error!(category = "defect", "{}\n{}", e, trace)
            }
            Err(e) if e.is_user_error() => {
                warn!(category = e.category(), "Dispatch failed for {}: {}", self.actor.name(), e)
            }
            Err(e) => error!(category = e.category(), "Dispatch failed for {}: {}", self.actor.name(), e),
        }
        result
    }

    fn run(&self, input: &str) -> DispatchResult<DispatchOutcome> {
        let tokens = tokenize(input);
        let mut args = ArgumentStack::new(tokens.clone());
        let command = self.find_command(&mut args)?;
        self.execute(command, &tokens, args)
    }

    fn check_permission(&self, permission: &Permission, path: &CommandPath) -> DispatchResult<()> {
        if permission.can_execute(self.actor) {
            return Ok(());
        }
        Err(DispatchError::PermissionDenied {
            path: path.clone(),
            permission: permission.as_node().unwrap_or_default().to_string(),
        })
    }

    /// Walk categories until a command or a default action is selected
    fn find_command(&self, args: &mut ArgumentStack) -> DispatchResult<&'h ExecutableCommand> {
        let mut walked = MutableCommandPath::empty();
        let mut category = self.handler.root();

        while let Some(token) = args.peek().map(str::to_string) {
            if walked.push_back(&token).is_err() {
                break;
            }
            let candidate = walked.to_immutable();

            if let Some(next) = self.handler.category(&candidate) {
                self.check_permission(next.permission(), &candidate)?;
                debug!("Entered category '{}'", candidate);
                args.remove_at(0);
                category = next;
                continue;
            }
            if let Some(command) = self.handler.command(&candidate) {
                self.check_permission(command.permission(), &candidate)?;
                debug!("Matched command '{}'", candidate);
                args.remove_at(0);
                return Ok(command.as_ref());
            }

            return match category.default_action() {
                Some(default) => {
                    self.check_permission(default.permission(), category.path())?;
                    debug!("Falling back to default action of '{}'", category.path());
                    Ok(default.as_ref())
                }
                None => Err(DispatchError::PathNotFound { path: candidate }),
            };
        }

        match category.default_action() {
            Some(default) => {
                self.check_permission(default.permission(), category.path())?;
                Ok(default.as_ref())
            }
            None => Err(DispatchError::PathNotFound {
                path: category.path().clone(),
            }),
        }
    }

    /// Remove flag and switch literals, and flag values, from the stack
    fn extract_named(
        &self,
        command: &ExecutableCommand,
        args: &mut ArgumentStack,
    ) -> DispatchResult<NamedInput> {
        let mut named = NamedInput::default();
        let literals: Vec<String> = command
            .flag_parameters()
            .filter_map(|p| self.handler.literal_of(p))
            .collect();
        for parameter in command.flag_parameters() {
            let Some(literal) = self.handler.literal_of(parameter) else {
                continue;
            };
            let Some(index) = args.position_of(&literal) else {
                continue;
            };
            self.check_permission(parameter.permission(), command.path())?;
            args.remove_at(index);

            if parameter.is_switch() {
                named.switches.insert(parameter.name().to_string());
            } else {
                let missing = || DispatchError::MissingRequiredArgument {
                    path: command.path().clone(),
                    parameter: parameter.name().to_string(),
                };
                // another flag or switch literal is never taken as a value
                let next_is_literal = args
                    .iter()
                    .nth(index)
                    .is_some_and(|t| literals.iter().any(|l| l.eq_ignore_ascii_case(t)));
                if next_is_literal {
                    return Err(missing());
                }
                let value = args.remove_at(index).ok_or_else(missing)?;
                named.flags.insert(parameter.name().to_string(), value);
            }
        }
        Ok(named)
    }

    fn execute(
        &self,
        command: &ExecutableCommand,
        input: &[String],
        mut args: ArgumentStack,
    ) -> DispatchResult<DispatchOutcome> {
        let path = command.path();
        let mut named = self.extract_named(command, &mut args)?;
        let mut resolved = ResolvedArguments::new();

        for parameter in command.sorted_parameters() {
            let site = FailureSite::new(path, parameter, self.handler.sanitizer());
            let value = {
                let context = ResolverContext::new(
                    input,
                    self.actor,
                    parameter,
                    command,
                    self.handler,
                    &resolved,
                );
                match parameter.kind() {
                    ParameterKind::Switch { .. } => Some(ArgValue::new(
                        named.switches.contains(parameter.name()) || parameter.default_switch(),
                    )),
                    ParameterKind::Flag { .. } => match named.flags.remove(parameter.name()) {
                        Some(token) => {
                            let mut stack = ArgumentStack::new(vec![token]);
                            Some(parameter.resolver().resolve(&mut stack, &context).at_site(&site)?)
                        }
                        None => self.resolve_absent(parameter, &context, &site)?,
                    },
                    ParameterKind::Positional if !parameter.resolver().mutates_arguments() => Some(
                        parameter.resolver().resolve(&mut args, &context).at_site(&site)?,
                    ),
                    ParameterKind::Positional if args.is_empty() => {
                        self.resolve_absent(parameter, &context, &site)?
                    }
                    ParameterKind::Positional => {
                        self.check_permission(parameter.permission(), path)?;
                        Some(parameter.resolver().resolve(&mut args, &context).at_site(&site)?)
                    }
                }
            };
            debug!(parameter = parameter.name(), value = ?value, "Resolved parameter");

            for validator in parameter.validators() {
                validator
                    .validate(value.as_ref(), parameter, self.actor)
                    .at_site(&site, value.as_ref())?;
            }
            resolved.push(parameter, value);
        }

        if !args.is_empty() && !command.consumes_all() {
            return Err(DispatchError::UnexpectedArguments {
                path: path.clone(),
                tokens: args.to_vec(),
            });
        }

        let arguments = resolved.into_arguments();
        let invocation = CommandInvocation {
            actor: self.actor,
            command,
            arguments: arguments.clone(),
            input,
        };
        (command.action())(&invocation).map_err(|e| DispatchError::HandlerFailed {
            path: path.clone(),
            source: e.into(),
        })?;

        Ok(DispatchOutcome {
            path: path.clone(),
            arguments,
        })
    }

    /// Value of a parameter that received no input
    ///
    /// Default tokens go through the parameter's own resolver, so a default
    /// is resolved exactly as if the actor had typed it.
    fn resolve_absent(
        &self,
        parameter: &CommandParameter,
        context: &ResolverContext<'_>,
        site: &FailureSite<'_>,
    ) -> DispatchResult<Option<ArgValue>> {
        if parameter.has_default() {
            let mut stack = ArgumentStack::new(parameter.default_value().to_vec());
            return parameter
                .resolver()
                .resolve(&mut stack, context)
                .at_site(site)
                .map(Some);
        }
        if parameter.is_optional() {
            return parameter.resolver().resolve_absent(context).at_site(site);
        }
        Err(site.missing())
    }
}

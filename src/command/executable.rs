//! Commands and categories of the command tree

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::actor::{Actor, Permission};
use crate::errors::{RegistrationError, RegistrationResult};
use crate::path::CommandPath;
use crate::process::Arguments;

use super::parameter::{CommandParameter, ParameterKind, ParameterSpec};

/// Handler invoked with fully resolved and validated arguments
pub type CommandAction = Arc<dyn Fn(&CommandInvocation<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Wrap a closure as a shareable action
pub fn action_fn<F>(f: F) -> CommandAction
where
    F: Fn(&CommandInvocation<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// One successful resolution, handed to the command's action
pub struct CommandInvocation<'a> {
    pub actor: &'a dyn Actor,
    pub command: &'a ExecutableCommand,
    pub arguments: Arguments,
    pub input: &'a [String],
}

/// Declaration of a command
///
/// Names may contain spaces (`"config set"`) to place the command inside
/// categories; missing categories are created on registration. Every extra
/// alias registers another path to the same command.
pub struct CommandSpec {
    pub(crate) names: Vec<String>,
    pub(crate) description: Option<String>,
    pub(crate) permission: Permission,
    pub(crate) parameters: Vec<ParameterSpec>,
    pub(crate) action: Option<CommandAction>,
    pub(crate) default_action: bool,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
            description: None,
            permission: Permission::none(),
            parameters: Vec::new(),
            action: None,
            default_action: false,
        }
    }

    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn permission(mut self, permission: Permission) -> Self {
        self.permission = permission;
        self
    }

    pub fn parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&CommandInvocation<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    /// Use an action shared with other commands
    pub fn with_action(mut self, action: CommandAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Register as the default action of the category named by this spec
    ///
    /// The default action runs when input stops at the category without
    /// matching one of its children.
    pub fn default_action(mut self) -> Self {
        self.default_action = true;
        self
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Declaration of a category
pub struct CategorySpec {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) permission: Permission,
}

impl CategorySpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            permission: Permission::none(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn permission(mut self, permission: Permission) -> Self {
        self.permission = permission;
        self
    }
}

/// A leaf of the command tree
pub struct ExecutableCommand {
    path: CommandPath,
    aliases: Vec<CommandPath>,
    description: Option<String>,
    permission: Permission,
    parameters: Vec<CommandParameter>,
    dispatch_order: Vec<usize>,
    action: CommandAction,
    default_action: bool,
}

impl ExecutableCommand {
    /// Assemble a command, checking the parameter declaration
    ///
    /// Parameters must be in declaration order. Once a positional parameter
    /// that consumes input is optional, every later one must be optional too,
    /// and only the last declared parameter may consume all remaining input.
    pub(crate) fn new(
        path: CommandPath,
        aliases: Vec<CommandPath>,
        description: Option<String>,
        permission: Permission,
        mut parameters: Vec<CommandParameter>,
        action: CommandAction,
        default_action: bool,
    ) -> RegistrationResult<Self> {
        let mut names = BTreeSet::new();
        let mut literals = BTreeSet::new();
        let mut first_optional: Option<&str> = None;

        for parameter in &parameters {
            if !names.insert(parameter.name().to_lowercase()) {
                return Err(RegistrationError::DuplicateParameter {
                    path,
                    parameter: parameter.name().to_string(),
                });
            }
            if let Some(literal) = parameter.flag_name().or(parameter.switch_name()) {
                if !literals.insert(literal.to_lowercase()) {
                    return Err(RegistrationError::DuplicateFlag {
                        path,
                        name: literal.to_string(),
                    });
                }
            }
            if parameter.consume_all && !parameter.last_in_method {
                return Err(RegistrationError::MisplacedConsumeAll {
                    path,
                    parameter: parameter.name().to_string(),
                });
            }
            if !parameter.is_positional() || !parameter.resolver().mutates_arguments() {
                continue;
            }
            match first_optional {
                Some(previous) if !parameter.is_optional() => {
                    return Err(RegistrationError::OptionalChain {
                        path: path.clone(),
                        parameter: parameter.name().to_string(),
                        previous: previous.to_string(),
                    });
                }
                None if parameter.is_optional() => first_optional = Some(parameter.name()),
                _ => {}
            }
        }

        let mut dispatch_order: Vec<usize> = (0..parameters.len()).collect();
        dispatch_order.sort_by(|a, b| parameters[*a].cmp_natural(&parameters[*b]));

        let mut next_index = 0;
        for &i in &dispatch_order {
            let parameter = &mut parameters[i];
            parameter.permission = parameter.permission.or_inherit(&permission);
            if parameter.resolver().mutates_arguments() && !parameter.is_switch() {
                parameter.command_index = Some(next_index);
                next_index += 1;
            }
        }

        Ok(Self {
            path,
            aliases,
            description,
            permission,
            parameters,
            dispatch_order,
            action,
            default_action,
        })
    }

    pub fn path(&self) -> &CommandPath {
        &self.path
    }

    pub fn aliases(&self) -> &[CommandPath] {
        &self.aliases
    }

    pub fn name(&self) -> &str {
        self.path.name().unwrap_or_default()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn permission(&self) -> &Permission {
        &self.permission
    }

    /// Parameters in declaration order
    pub fn parameters(&self) -> &[CommandParameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&CommandParameter> {
        self.parameters.iter().find(|p| p.name() == name)
    }

    /// Parameters in natural dispatch order
    pub fn sorted_parameters(&self) -> impl Iterator<Item = &CommandParameter> {
        self.dispatch_order.iter().map(move |&i| &self.parameters[i])
    }

    /// Positional parameters that consume input, in dispatch order
    pub fn value_parameters(&self) -> impl Iterator<Item = &CommandParameter> {
        self.sorted_parameters()
            .filter(|p| p.is_positional() && p.resolver().mutates_arguments())
    }

    pub fn flag_parameters(&self) -> impl Iterator<Item = &CommandParameter> {
        self.sorted_parameters().filter(|p| !p.is_positional())
    }

    pub fn consumes_all(&self) -> bool {
        self.parameters.iter().any(CommandParameter::consumes_all)
    }

    pub fn is_default_action(&self) -> bool {
        self.default_action
    }

    pub fn action(&self) -> &CommandAction {
        &self.action
    }

    /// One-line usage, e.g. `set <name> [value] [--silent]`
    pub fn usage(&self, flag_prefix: &str, switch_prefix: &str) -> String {
        let mut parts = Vec::new();
        if !self.path.is_root() {
            parts.push(self.path.to_string());
        }
        for parameter in self.sorted_parameters() {
            let visible = match parameter.kind() {
                ParameterKind::Positional => parameter.resolver().mutates_arguments(),
                _ => true,
            };
            if visible {
                parts.push(parameter.usage(flag_prefix, switch_prefix));
            }
        }
        parts.join(" ")
    }
}

impl fmt::Debug for ExecutableCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutableCommand")
            .field("path", &self.path)
            .field("aliases", &self.aliases)
            .field("permission", &self.permission)
            .field("parameters", &self.parameters)
            .field("default_action", &self.default_action)
            .finish()
    }
}

/// A non-leaf node of the command tree
#[derive(Clone)]
pub struct CommandCategory {
    path: CommandPath,
    description: Option<String>,
    permission: Permission,
    categories: BTreeSet<String>,
    commands: BTreeSet<String>,
    default_action: Option<Arc<ExecutableCommand>>,
}

impl CommandCategory {
    pub(crate) fn new(path: CommandPath, permission: Permission) -> Self {
        Self {
            path,
            description: None,
            permission,
            categories: BTreeSet::new(),
            commands: BTreeSet::new(),
            default_action: None,
        }
    }

    pub fn path(&self) -> &CommandPath {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.name().unwrap_or_default()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn permission(&self) -> &Permission {
        &self.permission
    }

    /// Names of child categories
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }

    /// Names of child commands
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(String::as_str)
    }

    pub fn default_action(&self) -> Option<&Arc<ExecutableCommand>> {
        self.default_action.as_ref()
    }

    pub(crate) fn set_description(&mut self, description: Option<String>) {
        if description.is_some() {
            self.description = description;
        }
    }

    pub(crate) fn set_permission(&mut self, permission: Permission) {
        self.permission = permission;
    }

    pub(crate) fn add_category(&mut self, name: &str) {
        self.categories.insert(name.to_lowercase());
    }

    pub(crate) fn add_command(&mut self, name: &str) {
        self.commands.insert(name.to_lowercase());
    }

    pub(crate) fn set_default_action(&mut self, command: Arc<ExecutableCommand>) -> RegistrationResult<()> {
        if self.default_action.is_some() {
            return Err(RegistrationError::DuplicateDefaultAction {
                path: self.path.clone(),
            });
        }
        self.default_action = Some(command);
        Ok(())
    }
}

impl fmt::Debug for CommandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandCategory")
            .field("path", &self.path)
            .field("permission", &self.permission)
            .field("categories", &self.categories)
            .field("commands", &self.commands)
            .field("default_action", &self.default_action.is_some())
            .finish()
    }
}

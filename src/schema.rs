//! Declarative command schema
//!
//! Commands can be declared in TOML instead of being built in code:
//!
//! ```toml
//! [[category]]
//! name = "admin"
//! permission = "admin"
//!
//! [[command]]
//! path = "set"
//! description = "Assign a value"
//!
//! [[command.param]]
//! name = "name"
//! type = "string"
//!
//! [[command.param]]
//! name = "value"
//! type = "number"
//! default = 0
//! ```
//!
//! The schema only describes the tree; the caller supplies the action run
//! by each command.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::actor::Permission;
use crate::autocomplete::StaticSuggestions;
use crate::command::{CategorySpec, CommandAction, CommandSpec, ExecutableCommand, ParameterSpec};
use crate::errors::{RegistrationError, RegistrationResult};
use crate::handler::CommandHandler;
use crate::process::{ChoiceResolver, LengthValidator, ParameterResolver, RangeValidator};
use crate::types::{builtin, ParamType};

/// A parsed schema file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandSchema {
    #[serde(default, rename = "category")]
    pub categories: Vec<CategoryDecl>,
    #[serde(default, rename = "command")]
    pub commands: Vec<CommandDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDecl {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permission: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDecl {
    pub path: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permission: Option<String>,
    #[serde(default)]
    pub default_action: bool,
    #[serde(default, rename = "param")]
    pub params: Vec<ParamDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    /// Parameter type; `string`, or `boolean` for switches, when omitted
    #[serde(rename = "type", default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub default: Option<DefaultDecl>,
    #[serde(default)]
    pub consume_all: bool,
    #[serde(default)]
    pub flag: bool,
    #[serde(default)]
    pub switch: bool,
    /// Literal name of a flag or switch when it differs from the parameter name
    #[serde(default)]
    pub literal: Option<String>,
    #[serde(default)]
    pub switch_default: bool,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub permission: Option<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Default value of a parameter: one or more literal tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultDecl {
    Tokens(Vec<String>),
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl DefaultDecl {
    pub fn tokens(&self) -> Vec<String> {
        match self {
            Self::Tokens(tokens) => tokens.clone(),
            Self::Text(text) => vec![text.clone()],
            Self::Integer(n) => vec![n.to_string()],
            Self::Float(n) => vec![n.to_string()],
            Self::Boolean(b) => vec![b.to_string()],
        }
    }
}

fn permission(node: &Option<String>) -> Permission {
    node.as_ref().map(Permission::node).unwrap_or_default()
}

impl CommandSchema {
    pub fn from_toml(content: &str) -> RegistrationResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> RegistrationResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| RegistrationError::SchemaRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Register every category and command with `handler`
    ///
    /// `action_for` supplies the action of each declared command.
    pub fn install<F>(
        &self,
        handler: &mut CommandHandler,
        mut action_for: F,
    ) -> RegistrationResult<Vec<Arc<ExecutableCommand>>>
    where
        F: FnMut(&CommandDecl) -> CommandAction,
    {
        for category in &self.categories {
            let mut spec = CategorySpec::new(&category.name).permission(permission(&category.permission));
            if let Some(description) = &category.description {
                spec = spec.describe(description);
            }
            handler.register_category(spec)?;
        }

        let mut installed = Vec::with_capacity(self.commands.len());
        for decl in &self.commands {
            let spec = decl.to_spec()?.with_action(action_for(decl));
            installed.push(handler.register(spec)?);
        }
        Ok(installed)
    }
}

impl CommandDecl {
    /// Build the command declaration, without an action
    pub fn to_spec(&self) -> RegistrationResult<CommandSpec> {
        let mut spec = CommandSpec::new(&self.path).permission(permission(&self.permission));
        for alias in &self.aliases {
            spec = spec.alias(alias);
        }
        if let Some(description) = &self.description {
            spec = spec.describe(description);
        }
        if self.default_action {
            spec = spec.default_action();
        }
        for param in &self.params {
            spec = spec.parameter(param.to_spec()?);
        }
        Ok(spec)
    }
}

impl ParamDecl {
    pub fn to_spec(&self) -> RegistrationResult<ParameterSpec> {
        if self.flag && self.switch {
            return Err(RegistrationError::InvalidSchema {
                reason: format!("parameter '{}' cannot be both a flag and a switch", self.name),
            });
        }
        let param_type: ParamType = match &self.type_name {
            Some(name) => name.parse()?,
            None if self.switch => builtin::BOOLEAN.into(),
            None => builtin::STRING.into(),
        };
        let literal = self.literal.clone().unwrap_or_else(|| self.name.clone());

        let mut spec = ParameterSpec::new(&self.name, param_type).permission(permission(&self.permission));
        if let Some(description) = &self.description {
            spec = spec.describe(description);
        }
        if self.optional {
            spec = spec.optional();
        }
        if let Some(default) = &self.default {
            spec = spec.default_value(default.tokens());
        }
        if self.consume_all {
            spec = spec.consume_all();
        }
        if self.flag {
            spec = spec.flag_named(literal);
        } else if self.switch {
            spec = spec.switch_named(literal).switch_default(self.switch_default);
        }
        if !self.choices.is_empty() {
            let choices = ChoiceResolver::new(self.choices.iter().cloned());
            spec = spec
                .resolver(ParameterResolver::value(choices.clone()))
                .suggestions(choices);
        }
        if !self.suggestions.is_empty() {
            spec = spec.suggestions(StaticSuggestions::new(self.suggestions.iter().cloned()));
        }
        if self.min.is_some() || self.max.is_some() {
            spec = spec.validator(RangeValidator::new(self.min, self.max));
        }
        if self.min_length.is_some() || self.max_length.is_some() {
            spec = spec.validator(LengthValidator::new(self.min_length, self.max_length));
        }
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::SimpleActor;
    use crate::command::ParameterKind;
    use crate::errors::DispatchError;
    use crate::path::CommandPath;

    const SCHEMA: &str = r#"
[[category]]
name = "admin"
description = "Administration"
permission = "admin"

[[command]]
path = "set"
aliases = ["assign"]

[[command.param]]
name = "name"

[[command.param]]
name = "value"
type = "number"
default = 0

[[command]]
path = "admin ban"

[[command.param]]
name = "target"
min_length = 3

[[command.param]]
name = "silent"
switch = true

[[command.param]]
name = "mode"
choices = ["Soft", "Hard"]
flag = true
optional = true
"#;

    fn noop(_: &CommandDecl) -> CommandAction {
        crate::command::action_fn(|_| Ok(()))
    }

    #[test]
    fn test_parse_schema() {
        let schema = CommandSchema::from_toml(SCHEMA).unwrap();
        assert_eq!(schema.categories.len(), 1);
        assert_eq!(schema.commands.len(), 2);
        assert_eq!(schema.commands[0].params[0].type_name, None);
        assert_eq!(
            schema.commands[0].params[1].default,
            Some(DefaultDecl::Integer(0))
        );
    }

    #[test]
    fn test_install_registers_tree() {
        let schema = CommandSchema::from_toml(SCHEMA).unwrap();
        let mut handler = CommandHandler::new();
        let installed = schema.install(&mut handler, noop).unwrap();
        assert_eq!(installed.len(), 2);

        let ban = handler.command(&CommandPath::parse("admin ban").unwrap()).unwrap();
        assert_eq!(ban.permission().as_node(), Some("admin"));
        assert!(matches!(
            ban.parameter("silent").unwrap().kind(),
            ParameterKind::Switch { .. }
        ));
        assert!(handler.command(&CommandPath::parse("assign").unwrap()).is_some());
    }

    #[test]
    fn test_installed_commands_dispatch() {
        let schema = CommandSchema::from_toml(SCHEMA).unwrap();
        let mut handler = CommandHandler::new();
        schema.install(&mut handler, noop).unwrap();
        let admin = SimpleActor::new("root").with_permission("admin");

        let outcome = handler.dispatch(&admin, "admin ban bob --mode hard").unwrap();
        assert_eq!(outcome.arguments.get_as::<String>("mode").unwrap(), "Hard");

        let err = handler.dispatch(&admin, "admin ban al").unwrap_err();
        assert!(matches!(err, DispatchError::ValidationFailed { .. }));

        let outcome = handler.dispatch(&admin, "assign x").unwrap();
        assert_eq!(outcome.arguments.get_as::<f64>("value"), Some(&0.0));
    }

    #[test]
    fn test_flag_and_switch_conflict() {
        let decl = ParamDecl {
            flag: true,
            switch: true,
            ..toml::from_str::<ParamDecl>("name = \"x\"").unwrap()
        };
        assert!(matches!(decl.to_spec(), Err(RegistrationError::InvalidSchema { .. })));
    }

    #[test]
    fn test_bad_type_is_reported() {
        let schema = CommandSchema::from_toml(
            "[[command]]\npath = \"x\"\n[[command.param]]\nname = \"v\"\ntype = \"either<integer>\"\n",
        )
        .unwrap();
        let mut handler = CommandHandler::new();
        assert!(matches!(
            schema.install(&mut handler, noop),
            Err(RegistrationError::InvalidType { .. })
        ));
    }
}

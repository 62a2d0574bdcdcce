//! Command parameters and their classification
//!
//! Parameters are declared with a [`ParameterSpec`] and turned into a
//! [`CommandParameter`] at registration, when the handler assigns the
//! resolver, validators and suggestion provider for the parameter's type.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::actor::Permission;
use crate::autocomplete::SuggestionProvider;
use crate::process::{ParameterResolver, ParameterValidator};
use crate::types::{builtin, ParamType, TypeKey};

/// How a parameter is matched against input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    /// Matched by position
    Positional,
    /// Named value: a literal `<prefix><name>` token followed by the value
    Flag { name: String },
    /// Boolean presence: a literal `<prefix><name>` token with no value
    Switch { name: String, default: bool },
}

/// Declaration of one command parameter
pub struct ParameterSpec {
    pub(crate) name: String,
    pub(crate) param_type: ParamType,
    pub(crate) description: Option<String>,
    pub(crate) default_value: Vec<String>,
    pub(crate) optional: bool,
    pub(crate) consume_all: bool,
    pub(crate) kind: ParameterKind,
    pub(crate) resolver: Option<ParameterResolver>,
    pub(crate) validators: Vec<Arc<dyn ParameterValidator>>,
    pub(crate) suggestions: Option<Arc<dyn SuggestionProvider>>,
    pub(crate) permission: Permission,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, param_type: impl Into<ParamType>) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: None,
            default_value: Vec::new(),
            optional: false,
            consume_all: false,
            kind: ParameterKind::Positional,
            resolver: None,
            validators: Vec::new(),
            suggestions: None,
            permission: Permission::none(),
        }
    }

    /// A boolean switch named after the parameter, defaulting to `false`
    pub fn switch(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut spec = Self::new(name.clone(), builtin::BOOLEAN);
        spec.kind = ParameterKind::Switch {
            name,
            default: false,
        };
        spec
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Tokens substituted when the argument is absent; implies optional
    pub fn default_value<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_value = tokens.into_iter().map(Into::into).collect();
        if !self.default_value.is_empty() {
            self.optional = true;
        }
        self
    }

    /// Consume the rest of the input; only valid on the last parameter
    pub fn consume_all(mut self) -> Self {
        self.consume_all = true;
        self
    }

    /// Match this parameter as a flag named after the parameter
    pub fn flag(self) -> Self {
        let name = self.name.clone();
        self.flag_named(name)
    }

    pub fn flag_named(mut self, name: impl Into<String>) -> Self {
        self.kind = ParameterKind::Flag { name: name.into() };
        self
    }

    /// Rename a switch, or turn a boolean parameter into one
    pub fn switch_named(mut self, name: impl Into<String>) -> Self {
        let default = match self.kind {
            ParameterKind::Switch { default, .. } => default,
            _ => false,
        };
        self.kind = ParameterKind::Switch {
            name: name.into(),
            default,
        };
        self
    }

    pub fn switch_default(mut self, value: bool) -> Self {
        if let ParameterKind::Switch { default, .. } = &mut self.kind {
            *default = value;
        }
        self
    }

    /// Use this resolver instead of the one registered for the type
    pub fn resolver(mut self, resolver: ParameterResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Add a validator that runs after the type's registered validators
    pub fn validator(mut self, validator: impl ParameterValidator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Use this provider instead of the one registered for the type
    pub fn suggestions(mut self, provider: impl SuggestionProvider + 'static) -> Self {
        self.suggestions = Some(Arc::new(provider));
        self
    }

    pub fn permission(mut self, permission: Permission) -> Self {
        self.permission = permission;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// One fully assembled parameter of a registered command
///
/// The natural ordering used for dispatch is: required positionals, then
/// optional positionals, then flags and switches, each group in declaration
/// order. This ordering is unrelated to equality.
#[derive(Clone)]
pub struct CommandParameter {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) method_index: usize,
    pub(crate) command_index: Option<usize>,
    pub(crate) param_type: ParamType,
    pub(crate) default_value: Vec<String>,
    pub(crate) optional: bool,
    pub(crate) last_in_method: bool,
    pub(crate) consume_all: bool,
    pub(crate) kind: ParameterKind,
    pub(crate) resolver: ParameterResolver,
    pub(crate) validators: Vec<Arc<dyn ParameterValidator>>,
    pub(crate) suggestions: Arc<dyn SuggestionProvider>,
    pub(crate) permission: Permission,
}

impl CommandParameter {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Position of the parameter in the declaration
    pub fn method_index(&self) -> usize {
        self.method_index
    }

    /// Position among the token-consuming parameters in dispatch order
    ///
    /// `None` for parameters whose resolver does not consume input.
    pub fn command_index(&self) -> Option<usize> {
        self.command_index
    }

    pub fn raw_type(&self) -> &TypeKey {
        self.param_type.raw()
    }

    pub fn full_type(&self) -> &ParamType {
        &self.param_type
    }

    pub fn default_value(&self) -> &[String] {
        &self.default_value
    }

    pub fn has_default(&self) -> bool {
        !self.default_value.is_empty()
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_last_in_method(&self) -> bool {
        self.last_in_method
    }

    /// True only for the last declared parameter marked consume-all
    pub fn consumes_all(&self) -> bool {
        self.consume_all && self.last_in_method
    }

    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    pub fn is_positional(&self) -> bool {
        matches!(self.kind, ParameterKind::Positional)
    }

    pub fn is_flag(&self) -> bool {
        matches!(self.kind, ParameterKind::Flag { .. })
    }

    pub fn is_switch(&self) -> bool {
        matches!(self.kind, ParameterKind::Switch { .. })
    }

    pub fn flag_name(&self) -> Option<&str> {
        match &self.kind {
            ParameterKind::Flag { name } => Some(name),
            _ => None,
        }
    }

    pub fn switch_name(&self) -> Option<&str> {
        match &self.kind {
            ParameterKind::Switch { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Value of an absent switch; `false` for anything else
    pub fn default_switch(&self) -> bool {
        match self.kind {
            ParameterKind::Switch { default, .. } => default,
            _ => false,
        }
    }

    pub fn resolver(&self) -> &ParameterResolver {
        &self.resolver
    }

    pub fn validators(&self) -> &[Arc<dyn ParameterValidator>] {
        &self.validators
    }

    pub fn suggestion_provider(&self) -> &Arc<dyn SuggestionProvider> {
        &self.suggestions
    }

    pub fn permission(&self) -> &Permission {
        &self.permission
    }

    fn dispatch_class(&self) -> u8 {
        match self.kind {
            ParameterKind::Flag { .. } | ParameterKind::Switch { .. } => 2,
            ParameterKind::Positional if self.optional => 1,
            ParameterKind::Positional => 0,
        }
    }

    /// Compare by natural dispatch order
    pub fn cmp_natural(&self, other: &CommandParameter) -> Ordering {
        self.dispatch_class()
            .cmp(&other.dispatch_class())
            .then(self.method_index.cmp(&other.method_index))
    }

    /// Usage fragment such as `<name>`, `[value]` or `[--silent]`
    pub fn usage(&self, flag_prefix: &str, switch_prefix: &str) -> String {
        match &self.kind {
            ParameterKind::Switch { name, .. } => format!("[{}{}]", switch_prefix, name),
            ParameterKind::Flag { name } if self.optional => {
                format!("[{}{} <{}>]", flag_prefix, name, self.name)
            }
            ParameterKind::Flag { name } => format!("{}{} <{}>", flag_prefix, name, self.name),
            ParameterKind::Positional => {
                let ellipsis = if self.consumes_all() { "..." } else { "" };
                if self.optional {
                    format!("[{}{}]", self.name, ellipsis)
                } else {
                    format!("<{}{}>", self.name, ellipsis)
                }
            }
        }
    }
}

impl fmt::Debug for CommandParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandParameter")
            .field("name", &self.name)
            .field("type", &self.param_type.to_string())
            .field("method_index", &self.method_index)
            .field("command_index", &self.command_index)
            .field("optional", &self.optional)
            .field("kind", &self.kind)
            .field("default_value", &self.default_value)
            .finish()
    }
}

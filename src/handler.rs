//! The command handler: registry and entry points
//!
//! A [`CommandHandler`] owns the command tree and the type-keyed tables of
//! resolvers, validators and suggestion providers. Registration happens first
//! through `&mut self`; dispatch and completion afterwards only read the
//! handler, so one handler can serve concurrent dispatches.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::actor::{Actor, Permission};
use crate::autocomplete::{self, compose, EmptySuggestions, SuggestionProvider};
use crate::command::{
    CategorySpec, CommandCategory, CommandParameter, CommandSpec, ExecutableCommand, ParameterKind,
    ParameterSpec,
};
use crate::config::EngineConfig;
use crate::dispatcher::Dispatcher;
use crate::errors::{DispatchResult, RegistrationError, RegistrationResult};
use crate::path::CommandPath;
use crate::process::{
    ActorNameResolver, Arguments, BooleanResolver, CommandPathResolver, ContextResolver,
    EitherResolver, FloatResolver, IntegerResolver, ParameterResolver, ParameterValidator,
    StringResolver, ValueResolver,
};
use crate::sanitizer::StackTraceSanitizer;
use crate::types::{builtin, ParamType, TypeHierarchy, TypeKey, TypeMap};

/// Result of a successful dispatch
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// Primary path of the command that ran
    pub path: CommandPath,
    /// The arguments the command was invoked with, in declaration order
    pub arguments: Arguments,
}

/// Registry of commands and parameter types
pub struct CommandHandler {
    config: EngineConfig,
    hierarchy: TypeHierarchy,
    resolvers: TypeMap<ParameterResolver>,
    validators: TypeMap<Arc<dyn ParameterValidator>>,
    suggestions: TypeMap<Arc<dyn SuggestionProvider>>,
    categories: HashMap<CommandPath, CommandCategory>,
    commands: HashMap<CommandPath, Arc<ExecutableCommand>>,
    sanitizer: StackTraceSanitizer,
}

impl Default for CommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandHandler {
    /// A handler with the default configuration and the built-in types
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let sanitizer = StackTraceSanitizer::from_config(&config.sanitizer);
        let mut categories = HashMap::new();
        categories.insert(
            CommandPath::root(),
            CommandCategory::new(CommandPath::root(), Permission::none()),
        );

        let mut handler = Self {
            config,
            hierarchy: TypeHierarchy::new(),
            resolvers: TypeMap::new(),
            validators: TypeMap::new(),
            suggestions: TypeMap::new(),
            categories,
            commands: HashMap::new(),
            sanitizer,
        };
        handler.register_builtins();
        handler
    }

    fn register_builtins(&mut self) {
        self.declare_subtype(builtin::INTEGER, builtin::NUMBER);
        self.declare_subtype(builtin::FLOAT, builtin::NUMBER);

        self.register_value_resolver(builtin::STRING, StringResolver);
        self.register_value_resolver(builtin::NUMBER, FloatResolver);
        self.register_value_resolver(builtin::INTEGER, IntegerResolver);
        self.register_value_resolver(builtin::FLOAT, FloatResolver);
        self.register_value_resolver(builtin::BOOLEAN, BooleanResolver);
        self.register_suggestions(builtin::BOOLEAN, BooleanResolver);

        self.register_context_resolver(builtin::ACTOR_NAME, ActorNameResolver);
        self.register_context_resolver(builtin::COMMAND_PATH, CommandPathResolver);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sanitizer(&self) -> &StackTraceSanitizer {
        &self.sanitizer
    }

    pub fn set_sanitizer(&mut self, sanitizer: StackTraceSanitizer) {
        self.sanitizer = sanitizer;
    }

    pub fn hierarchy(&self) -> &TypeHierarchy {
        &self.hierarchy
    }

    /// Declare `parent` as a supertype of `child` for registry lookups
    pub fn declare_subtype(&mut self, child: TypeKey, parent: TypeKey) {
        debug!(child = %child, parent = %parent, "Declared subtype");
        self.hierarchy.declare(child, parent);
    }

    pub fn register_value_resolver(&mut self, key: TypeKey, resolver: impl ValueResolver + 'static) {
        self.register_resolver(key, ParameterResolver::value(resolver));
    }

    pub fn register_context_resolver(&mut self, key: TypeKey, resolver: impl ContextResolver + 'static) {
        self.register_resolver(key, ParameterResolver::context(resolver));
    }

    /// Register a resolver for a type, replacing any earlier one
    pub fn register_resolver(&mut self, key: TypeKey, resolver: ParameterResolver) {
        debug!(type_name = %key, ?resolver, "Registered resolver");
        self.resolvers.insert(key, resolver);
    }

    /// Add a validator for a type and all of its subtypes
    pub fn register_validator(&mut self, key: TypeKey, validator: impl ParameterValidator + 'static) {
        debug!(type_name = %key, "Registered validator");
        self.validators.append(key, Arc::new(validator));
    }

    pub fn register_suggestions(&mut self, key: TypeKey, provider: impl SuggestionProvider + 'static) {
        debug!(type_name = %key, "Registered suggestion provider");
        self.suggestions.insert(key, Arc::new(provider));
    }

    /// The resolver for a full type; `either<A, B>` combines both sides
    pub fn resolver_for(&self, param_type: &ParamType) -> Option<ParameterResolver> {
        if let Some((first, second)) = param_type.either_sides() {
            let first = self.resolver_for(first)?;
            let second = self.resolver_for(second)?;
            return Some(EitherResolver::new(first, second).into_parameter_resolver());
        }
        self.resolvers.get(param_type.raw(), &self.hierarchy).cloned()
    }

    /// The suggestion provider for a full type; `either<A, B>` merges both sides
    pub fn suggestions_for(&self, param_type: &ParamType) -> Arc<dyn SuggestionProvider> {
        if let Some((first, second)) = param_type.either_sides() {
            return compose(self.suggestions_for(first), self.suggestions_for(second));
        }
        self.suggestions
            .get(param_type.raw(), &self.hierarchy)
            .cloned()
            .unwrap_or_else(|| Arc::new(EmptySuggestions) as Arc<dyn SuggestionProvider>)
    }

    pub fn validators_for(&self, key: &TypeKey) -> Vec<Arc<dyn ParameterValidator>> {
        self.validators
            .matching(key, &self.hierarchy)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Assemble one parameter from its declaration
    ///
    /// Validators registered for the type run before the ones declared on
    /// the parameter itself.
    pub fn build_parameter(&self, spec: ParameterSpec, index: usize) -> RegistrationResult<CommandParameter> {
        let is_switch = matches!(spec.kind, ParameterKind::Switch { .. });
        if is_switch
            && !self
                .hierarchy
                .is_assignable(spec.param_type.raw(), &builtin::BOOLEAN)
        {
            return Err(RegistrationError::InvalidSwitchType {
                parameter: spec.name,
                found: spec.param_type.to_string(),
            });
        }

        let resolver = match spec.resolver {
            Some(resolver) => resolver,
            None => self
                .resolver_for(&spec.param_type)
                .ok_or_else(|| RegistrationError::NoResolver {
                    parameter: spec.name.clone(),
                    type_name: spec.param_type.to_string(),
                })?,
        };
        let suggestions = spec
            .suggestions
            .unwrap_or_else(|| self.suggestions_for(&spec.param_type));
        let mut validators = self.validators_for(spec.param_type.raw());
        validators.extend(spec.validators);

        Ok(CommandParameter {
            name: spec.name,
            description: spec.description,
            method_index: index,
            command_index: None,
            optional: spec.optional || is_switch || !spec.default_value.is_empty(),
            default_value: spec.default_value,
            param_type: spec.param_type,
            last_in_method: false,
            consume_all: spec.consume_all,
            kind: spec.kind,
            resolver,
            validators,
            suggestions,
            permission: spec.permission,
        })
    }

    /// Register a category, creating missing parent categories
    pub fn register_category(&mut self, spec: CategorySpec) -> RegistrationResult<()> {
        let path = CommandPath::parse(&spec.name)?;
        if path.is_root() {
            return Err(RegistrationError::EmptyPath);
        }
        if self.commands.contains_key(&path) {
            return Err(RegistrationError::DuplicatePath { path });
        }
        self.ensure_category(&path)?;

        let inherited = self.parent_permission(&path);
        if let Some(category) = self.categories.get_mut(&path) {
            category.set_description(spec.description);
            category.set_permission(spec.permission.or_inherit(&inherited));
        }
        info!("Registered category '{}'", path);
        Ok(())
    }

    /// Register a command under each of its names
    pub fn register(&mut self, spec: CommandSpec) -> RegistrationResult<Arc<ExecutableCommand>> {
        let mut paths = Vec::with_capacity(spec.names.len());
        for name in &spec.names {
            let path = CommandPath::parse(name)?;
            if path.is_root() && !spec.default_action {
                return Err(RegistrationError::EmptyPath);
            }
            paths.push(path);
        }
        let primary = paths.remove(0);

        let action = spec
            .action
            .ok_or_else(|| RegistrationError::MissingHandler {
                path: primary.clone(),
            })?;

        for path in std::iter::once(&primary).chain(paths.iter()) {
            let occupied = if spec.default_action {
                self.commands.contains_key(path)
                    || self
                        .categories
                        .get(path)
                        .is_some_and(|c| c.default_action().is_some())
            } else {
                self.commands.contains_key(path) || self.categories.contains_key(path)
            };
            if occupied {
                return Err(RegistrationError::DuplicatePath { path: path.clone() });
            }
        }

        let permission = if spec.default_action {
            self.ensure_category(&primary)?;
            let own = self.categories.get(&primary).map(|c| c.permission().clone());
            spec.permission.or_inherit(&own.unwrap_or_default())
        } else {
            spec.permission.or_inherit(&self.parent_permission(&primary))
        };

        let count = spec.parameters.len();
        let mut parameters = Vec::with_capacity(count);
        for (index, parameter) in spec.parameters.into_iter().enumerate() {
            let mut parameter = self.build_parameter(parameter, index)?;
            parameter.last_in_method = index + 1 == count;
            parameters.push(parameter);
        }

        let command = Arc::new(ExecutableCommand::new(
            primary.clone(),
            paths.clone(),
            spec.description,
            permission,
            parameters,
            action,
            spec.default_action,
        )?);

        for path in std::iter::once(&primary).chain(paths.iter()) {
            if spec.default_action {
                self.ensure_category(path)?;
                if let Some(category) = self.categories.get_mut(path) {
                    category.set_default_action(Arc::clone(&command))?;
                }
                info!("Registered default action for '{}'", path);
            } else {
                let parent = path.parent().unwrap_or_default();
                self.ensure_category(&parent)?;
                if let (Some(category), Some(name)) = (self.categories.get_mut(&parent), path.name()) {
                    category.add_command(name);
                }
                self.commands.insert(path.clone(), Arc::clone(&command));
                info!("Registered command '{}'", path);
            }
        }
        Ok(command)
    }

    /// Create `path` and its missing ancestors as categories
    fn ensure_category(&mut self, path: &CommandPath) -> RegistrationResult<()> {
        let mut chain = path.ancestors();
        chain.push(path.clone());
        for node in chain {
            if self.categories.contains_key(&node) {
                continue;
            }
            if self.commands.contains_key(&node) {
                return Err(RegistrationError::DuplicatePath { path: node });
            }
            let parent = node.parent().unwrap_or_default();
            let permission = self.parent_permission(&node);
            if let (Some(parent), Some(name)) = (self.categories.get_mut(&parent), node.name()) {
                parent.add_category(name);
            }
            debug!("Created category '{}'", node);
            self.categories
                .insert(node.clone(), CommandCategory::new(node, permission));
        }
        Ok(())
    }

    fn parent_permission(&self, path: &CommandPath) -> Permission {
        path.parent()
            .and_then(|parent| self.categories.get(&parent))
            .map(|c| c.permission().clone())
            .unwrap_or_default()
    }

    /// Resolve and run one input line
    pub fn dispatch(&self, actor: &dyn Actor, input: &str) -> DispatchResult<DispatchOutcome> {
        Dispatcher::new(self, actor).dispatch(input)
    }

    /// Suggestions for the token being typed at the end of `input`
    pub fn complete(&self, actor: &dyn Actor, input: &str) -> Vec<String> {
        autocomplete::complete(self, actor, input)
    }

    /// The literal that introduces a flag or switch, e.g. `--silent`
    pub fn literal_of(&self, parameter: &CommandParameter) -> Option<String> {
        match parameter.kind() {
            ParameterKind::Flag { name } => Some(format!("{}{}", self.config.flag_prefix, name)),
            ParameterKind::Switch { name, .. } => {
                Some(format!("{}{}", self.config.switch_prefix, name))
            }
            ParameterKind::Positional => None,
        }
    }

    pub fn root(&self) -> &CommandCategory {
        &self.categories[&CommandPath::root()]
    }

    pub fn category(&self, path: &CommandPath) -> Option<&CommandCategory> {
        self.categories.get(path)
    }

    pub fn command(&self, path: &CommandPath) -> Option<&Arc<ExecutableCommand>> {
        self.commands.get(path)
    }

    /// Every registered command path, aliases included, sorted
    pub fn command_paths(&self) -> Vec<&CommandPath> {
        let mut paths: Vec<&CommandPath> = self.commands.keys().collect();
        paths.sort();
        paths
    }

    /// Every category, sorted by path
    pub fn categories(&self) -> Vec<&CommandCategory> {
        let mut categories: Vec<&CommandCategory> = self.categories.values().collect();
        categories.sort_by(|a, b| a.path().cmp(b.path()));
        categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ParameterSpec;
    use crate::types::builtin::{INTEGER, NUMBER, STRING};

    fn noop(spec: CommandSpec) -> CommandSpec {
        spec.action(|_| Ok(()))
    }

    #[test]
    fn test_default_handler_uses_default_sanitizer() {
        let handler = CommandHandler::new();
        assert_eq!(handler.sanitizer(), crate::sanitizer::default_sanitizer());

        let mut config = EngineConfig::default();
        config.sanitizer.ignore_modules.clear();
        let handler = CommandHandler::with_config(config);
        assert!(!handler
            .sanitizer()
            .is_ignored(&crate::sanitizer::StackFrame::new("cmdroute::dispatcher::Dispatcher::run")));
    }

    #[test]
    fn test_builtin_resolvers() {
        let handler = CommandHandler::new();
        assert!(handler.resolver_for(&INTEGER.into()).unwrap().mutates_arguments());
        assert!(!handler
            .resolver_for(&builtin::ACTOR_NAME.into())
            .unwrap()
            .mutates_arguments());
        assert!(handler.resolver_for(&TypeKey::new("uuid").into()).is_none());
    }

    #[test]
    fn test_subtype_lookup_falls_back_to_parent() {
        let mut handler = CommandHandler::new();
        handler.declare_subtype(TypeKey::new("port"), INTEGER);

        let spec = ParameterSpec::new("port", TypeKey::new("port"));
        assert!(handler.build_parameter(spec, 0).is_ok());
    }

    #[test]
    fn test_validators_apply_to_subtypes() {
        let mut handler = CommandHandler::new();
        handler.register_validator(NUMBER, crate::process::RangeValidator::between(0.0, 1.0));

        assert_eq!(handler.validators_for(&INTEGER).len(), 1);
        assert!(handler.validators_for(&STRING).is_empty());
    }

    #[test]
    fn test_switch_requires_boolean() {
        let handler = CommandHandler::new();
        let spec = ParameterSpec::new("count", INTEGER).switch_named("count");
        match handler.build_parameter(spec, 0) {
            Err(RegistrationError::InvalidSwitchType { parameter, .. }) => assert_eq!(parameter, "count"),
            other => panic!("expected InvalidSwitchType, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_multi_word_names_create_categories() {
        let mut handler = CommandHandler::new();
        handler
            .register(noop(CommandSpec::new("config set").alias("cfg set")))
            .unwrap();

        let config = handler.category(&CommandPath::parse("config").unwrap()).unwrap();
        assert_eq!(config.commands().collect::<Vec<_>>(), vec!["set"]);
        assert!(handler.command(&CommandPath::parse("cfg set").unwrap()).is_some());
        assert_eq!(
            handler.root().categories().collect::<Vec<_>>(),
            vec!["cfg", "config"]
        );
    }

    #[test]
    fn test_duplicate_path_is_rejected() {
        let mut handler = CommandHandler::new();
        handler.register(noop(CommandSpec::new("ping"))).unwrap();

        let result = handler.register(noop(CommandSpec::new("PING")));
        assert!(matches!(result, Err(RegistrationError::DuplicatePath { .. })));

        let result = handler.register(noop(CommandSpec::new("ping pong")));
        assert!(matches!(result, Err(RegistrationError::DuplicatePath { .. })));
    }

    #[test]
    fn test_missing_handler_is_rejected() {
        let mut handler = CommandHandler::new();
        let result = handler.register(CommandSpec::new("ping"));
        assert!(matches!(result, Err(RegistrationError::MissingHandler { .. })));
    }

    #[test]
    fn test_optional_chain_is_enforced() {
        let mut handler = CommandHandler::new();
        let spec = noop(
            CommandSpec::new("give")
                .parameter(ParameterSpec::new("item", STRING).optional())
                .parameter(ParameterSpec::new("amount", INTEGER)),
        );
        match handler.register(spec) {
            Err(RegistrationError::OptionalChain { parameter, previous, .. }) => {
                assert_eq!(parameter, "amount");
                assert_eq!(previous, "item");
            }
            other => panic!("expected OptionalChain, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_consume_all_must_be_last() {
        let mut handler = CommandHandler::new();
        let spec = noop(
            CommandSpec::new("say")
                .parameter(ParameterSpec::new("message", STRING).consume_all())
                .parameter(ParameterSpec::new("times", INTEGER).optional()),
        );
        assert!(matches!(
            handler.register(spec),
            Err(RegistrationError::MisplacedConsumeAll { .. })
        ));
    }

    #[test]
    fn test_permission_inherited_from_category() {
        let mut handler = CommandHandler::new();
        handler
            .register_category(CategorySpec::new("admin").permission(Permission::node("admin")))
            .unwrap();
        let command = handler.register(noop(CommandSpec::new("admin ban"))).unwrap();
        assert_eq!(command.permission().as_node(), Some("admin"));

        let command = handler
            .register(noop(CommandSpec::new("admin kick").permission(Permission::node("admin.kick"))))
            .unwrap();
        assert_eq!(command.permission().as_node(), Some("admin.kick"));
    }

    #[test]
    fn test_dispatch_order_and_command_indices() {
        let mut handler = CommandHandler::new();
        let command = handler
            .register(noop(
                CommandSpec::new("ban")
                    .parameter(ParameterSpec::switch("silent"))
                    .parameter(ParameterSpec::new("target", STRING))
                    .parameter(ParameterSpec::new("reason", STRING).default_value(["none"]))
                    .parameter(ParameterSpec::new("sender", builtin::ACTOR_NAME))
                    .parameter(ParameterSpec::new("days", INTEGER).flag().optional()),
            ))
            .unwrap();

        let order: Vec<&str> = command.sorted_parameters().map(|p| p.name()).collect();
        assert_eq!(order, vec!["target", "sender", "reason", "silent", "days"]);

        let target = command.parameter("target").unwrap();
        let sender = command.parameter("sender").unwrap();
        let reason = command.parameter("reason").unwrap();
        assert_eq!(target.command_index(), Some(0));
        assert_eq!(sender.command_index(), None);
        assert_eq!(reason.command_index(), Some(1));
        assert_eq!(command.usage("--", "--"), "ban <target> [reason] [--silent] [--days <days>]");
    }
}

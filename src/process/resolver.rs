//! The parameter resolver protocol
//!
//! A [`ValueResolver`] consumes tokens from the front of the
//! [`ArgumentStack`]; a [`ContextResolver`] derives its value from the
//! surrounding context without touching the stack. Both are wrapped in a
//! [`ParameterResolver`] when assigned to a parameter.

use std::fmt;
use std::sync::Arc;

use crate::actor::Actor;
use crate::command::{CommandParameter, ExecutableCommand};
use crate::errors::ResolveError;
use crate::handler::CommandHandler;
use crate::stack::ArgumentStack;
use crate::types::{ArgValue, TypeKey};

pub type ResolveResult<T> = Result<T, ResolveError>;

/// Converts raw tokens into a typed value
pub trait ValueResolver: Send + Sync {
    /// Consume one or more tokens from `args` and convert them
    fn resolve(&self, args: &mut ArgumentStack, context: &ResolverContext<'_>) -> ResolveResult<ArgValue>;

    /// Value for an optional parameter that has no input and no default
    ///
    /// Returns `None` unless the type has its own empty representation. Types
    /// that cannot represent absence should return an error.
    fn resolve_absent(&self, _context: &ResolverContext<'_>) -> ResolveResult<Option<ArgValue>> {
        Ok(None)
    }
}

/// Derives a value from the dispatch context without consuming input
pub trait ContextResolver: Send + Sync {
    fn resolve(&self, context: &ResolverContext<'_>) -> ResolveResult<ArgValue>;
}

/// The resolver assigned to a parameter
#[derive(Clone)]
pub enum ParameterResolver {
    Value(Arc<dyn ValueResolver>),
    Context(Arc<dyn ContextResolver>),
}

impl ParameterResolver {
    pub fn value(resolver: impl ValueResolver + 'static) -> Self {
        Self::Value(Arc::new(resolver))
    }

    pub fn context(resolver: impl ContextResolver + 'static) -> Self {
        Self::Context(Arc::new(resolver))
    }

    /// Wrap a closure as a value resolver
    pub fn value_fn<F>(f: F) -> Self
    where
        F: Fn(&mut ArgumentStack, &ResolverContext<'_>) -> ResolveResult<ArgValue> + Send + Sync + 'static,
    {
        Self::value(FnValueResolver(f))
    }

    /// Wrap a closure as a context resolver
    pub fn context_fn<F>(f: F) -> Self
    where
        F: Fn(&ResolverContext<'_>) -> ResolveResult<ArgValue> + Send + Sync + 'static,
    {
        Self::context(FnContextResolver(f))
    }

    /// Whether this resolver consumes tokens from the argument stack
    pub fn mutates_arguments(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub fn resolve(&self, args: &mut ArgumentStack, context: &ResolverContext<'_>) -> ResolveResult<ArgValue> {
        match self {
            Self::Value(resolver) => resolver.resolve(args, context),
            Self::Context(resolver) => resolver.resolve(context),
        }
    }

    pub fn resolve_absent(&self, context: &ResolverContext<'_>) -> ResolveResult<Option<ArgValue>> {
        match self {
            Self::Value(resolver) => resolver.resolve_absent(context),
            Self::Context(resolver) => resolver.resolve(context).map(Some),
        }
    }
}

impl fmt::Debug for ParameterResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(_) => f.write_str("ParameterResolver::Value"),
            Self::Context(_) => f.write_str("ParameterResolver::Context"),
        }
    }
}

struct FnValueResolver<F>(F);

impl<F> ValueResolver for FnValueResolver<F>
where
    F: Fn(&mut ArgumentStack, &ResolverContext<'_>) -> ResolveResult<ArgValue> + Send + Sync,
{
    fn resolve(&self, args: &mut ArgumentStack, context: &ResolverContext<'_>) -> ResolveResult<ArgValue> {
        (self.0)(args, context)
    }
}

struct FnContextResolver<F>(F);

impl<F> ContextResolver for FnContextResolver<F>
where
    F: Fn(&ResolverContext<'_>) -> ResolveResult<ArgValue> + Send + Sync,
{
    fn resolve(&self, context: &ResolverContext<'_>) -> ResolveResult<ArgValue> {
        (self.0)(context)
    }
}

#[derive(Debug, Clone)]
struct ResolvedEntry {
    name: String,
    method_index: usize,
    raw_type: TypeKey,
    value: Option<ArgValue>,
}

/// Values resolved so far in one dispatch, in resolution order
#[derive(Debug, Clone, Default)]
pub struct ResolvedArguments {
    entries: Vec<ResolvedEntry>,
}

impl ResolvedArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, parameter: &CommandParameter, value: Option<ArgValue>) {
        self.entries.push(ResolvedEntry {
            name: parameter.name().to_string(),
            method_index: parameter.method_index(),
            raw_type: parameter.raw_type().clone(),
            value,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolved value of the named parameter; `None` if not resolved yet
    pub fn by_name(&self, name: &str) -> Option<Option<&ArgValue>> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.value.as_ref())
    }

    /// Most recently resolved present value of the given raw type
    pub fn last_of_type(&self, raw_type: &TypeKey) -> Option<&ArgValue> {
        self.entries
            .iter()
            .rev()
            .filter(|e| &e.raw_type == raw_type)
            .find_map(|e| e.value.as_ref())
    }

    /// Reorder into declaration order for handing to the command
    pub fn into_arguments(mut self) -> Arguments {
        self.entries.sort_by_key(|e| e.method_index);
        Arguments {
            values: self.entries.into_iter().map(|e| (e.name, e.value)).collect(),
        }
    }
}

/// Fully resolved arguments of a command, in declaration order
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Vec<(String, Option<ArgValue>)>,
}

impl Arguments {
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_ref())
    }

    /// The named value downcast to `T`
    pub fn get_as<T: std::any::Any>(&self, name: &str) -> Option<&T> {
        self.get(name).and_then(ArgValue::downcast_ref::<T>)
    }

    pub fn value_at(&self, index: usize) -> Option<&ArgValue> {
        self.values.get(index).and_then(|(_, v)| v.as_ref())
    }

    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&ArgValue>)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v.as_ref()))
    }
}

/// Everything a resolver may look at while producing a value
pub struct ResolverContext<'a> {
    input: &'a [String],
    actor: &'a dyn Actor,
    parameter: &'a CommandParameter,
    command: &'a ExecutableCommand,
    handler: &'a CommandHandler,
    resolved: &'a ResolvedArguments,
}

impl<'a> ResolverContext<'a> {
    pub fn new(
        input: &'a [String],
        actor: &'a dyn Actor,
        parameter: &'a CommandParameter,
        command: &'a ExecutableCommand,
        handler: &'a CommandHandler,
        resolved: &'a ResolvedArguments,
    ) -> Self {
        Self {
            input,
            actor,
            parameter,
            command,
            handler,
            resolved,
        }
    }

    /// The tokenized input line, unmodified by resolvers
    pub fn input(&self) -> &'a [String] {
        self.input
    }

    pub fn actor(&self) -> &'a dyn Actor {
        self.actor
    }

    pub fn parameter(&self) -> &'a CommandParameter {
        self.parameter
    }

    pub fn command(&self) -> &'a ExecutableCommand {
        self.command
    }

    pub fn handler(&self) -> &'a CommandHandler {
        self.handler
    }

    /// Last resolved value whose parameter has the given raw type
    ///
    /// Fails with an illegal-state error when no such parameter has been
    /// resolved yet in dispatch order.
    pub fn resolved_argument(&self, raw_type: &TypeKey) -> ResolveResult<&'a ArgValue> {
        self.resolved.last_of_type(raw_type).ok_or_else(|| {
            ResolveError::illegal_state(format!(
                "no argument of type '{}' has been resolved before '{}'",
                raw_type,
                self.parameter.name()
            ))
        })
    }

    /// Resolved value of the named parameter
    ///
    /// Fails with an illegal-state error when that parameter has not been
    /// resolved yet. A resolved-but-absent optional yields `Ok(None)`.
    pub fn resolved_parameter(&self, name: &str) -> ResolveResult<Option<&'a ArgValue>> {
        self.resolved.by_name(name).ok_or_else(|| {
            ResolveError::illegal_state(format!(
                "parameter '{}' was queried by '{}' before it was resolved",
                name,
                self.parameter.name()
            ))
        })
    }
}

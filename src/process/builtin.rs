//! Built-in resolvers for the standard parameter types

use crate::errors::ResolveError;
use crate::stack::ArgumentStack;
use crate::types::ArgValue;

use super::resolver::{ContextResolver, ResolveResult, ResolverContext, ValueResolver};

/// Resolves `string`; a consume-all parameter takes the rest of the line
pub struct StringResolver;

impl ValueResolver for StringResolver {
    fn resolve(&self, args: &mut ArgumentStack, context: &ResolverContext<'_>) -> ResolveResult<ArgValue> {
        let text = if context.parameter().consumes_all() {
            args.join_remaining()?
        } else {
            args.pop()?
        };
        Ok(ArgValue::new(text))
    }
}

/// Resolves `integer` as `i64`
pub struct IntegerResolver;

impl ValueResolver for IntegerResolver {
    fn resolve(&self, args: &mut ArgumentStack, _context: &ResolverContext<'_>) -> ResolveResult<ArgValue> {
        let token = args.pop()?;
        token
            .parse::<i64>()
            .map(ArgValue::new)
            .map_err(|_| ResolveError::parse(token, "expected a whole number"))
    }
}

/// Resolves `float` and `number` as `f64`
pub struct FloatResolver;

impl ValueResolver for FloatResolver {
    fn resolve(&self, args: &mut ArgumentStack, _context: &ResolverContext<'_>) -> ResolveResult<ArgValue> {
        let token = args.pop()?;
        match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(ArgValue::new(value)),
            _ => Err(ResolveError::parse(token, "expected a number")),
        }
    }
}

/// Resolves `boolean`; an absent optional boolean is `false`
pub struct BooleanResolver;

impl BooleanResolver {
    pub const TRUE_WORDS: [&'static str; 3] = ["true", "yes", "on"];
    pub const FALSE_WORDS: [&'static str; 3] = ["false", "no", "off"];
}

impl ValueResolver for BooleanResolver {
    fn resolve(&self, args: &mut ArgumentStack, _context: &ResolverContext<'_>) -> ResolveResult<ArgValue> {
        let token = args.pop()?;
        let lower = token.to_lowercase();
        if Self::TRUE_WORDS.contains(&lower.as_str()) {
            Ok(ArgValue::new(true))
        } else if Self::FALSE_WORDS.contains(&lower.as_str()) {
            Ok(ArgValue::new(false))
        } else {
            Err(ResolveError::parse(token, "expected true or false"))
        }
    }

    fn resolve_absent(&self, _context: &ResolverContext<'_>) -> ResolveResult<Option<ArgValue>> {
        Ok(Some(ArgValue::new(false)))
    }
}

/// Resolves one of a fixed set of words, ignoring case
///
/// The resolved value is the canonical spelling from the choice list.
#[derive(Debug, Clone)]
pub struct ChoiceResolver {
    choices: Vec<String>,
}

impl ChoiceResolver {
    pub fn new<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }
}

impl ValueResolver for ChoiceResolver {
    fn resolve(&self, args: &mut ArgumentStack, _context: &ResolverContext<'_>) -> ResolveResult<ArgValue> {
        let token = args.pop()?;
        self.choices
            .iter()
            .find(|c| c.eq_ignore_ascii_case(&token))
            .map(|c| ArgValue::new(c.clone()))
            .ok_or_else(|| {
                ResolveError::parse(
                    token,
                    format!("expected one of: {}", self.choices.join(", ")),
                )
            })
    }
}

/// Injects the name of the actor running the command
pub struct ActorNameResolver;

impl ContextResolver for ActorNameResolver {
    fn resolve(&self, context: &ResolverContext<'_>) -> ResolveResult<ArgValue> {
        Ok(ArgValue::new(context.actor().name().to_string()))
    }
}

/// Injects the path of the command being run
pub struct CommandPathResolver;

impl ContextResolver for CommandPathResolver {
    fn resolve(&self, context: &ResolverContext<'_>) -> ResolveResult<ArgValue> {
        Ok(ArgValue::new(context.command().path().clone()))
    }
}

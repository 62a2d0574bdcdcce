//! Resolution of `either<A, B>` parameters
//!
//! The first side is tried against a copy of the argument stack; only when it
//! succeeds is the copy committed. On failure the second side runs against
//! the untouched stack, so a failed first attempt never consumes input.

use crate::either::Either;
use crate::errors::ResolveError;
use crate::stack::ArgumentStack;
use crate::types::ArgValue;

use super::resolver::{ContextResolver, ParameterResolver, ResolveResult, ResolverContext, ValueResolver};

/// Resolved value is an `Either<ArgValue, ArgValue>`
pub struct EitherResolver {
    first: ParameterResolver,
    second: ParameterResolver,
}

impl EitherResolver {
    pub fn new(first: ParameterResolver, second: ParameterResolver) -> Self {
        Self { first, second }
    }

    /// Wrap as a value resolver if either side consumes input
    pub fn into_parameter_resolver(self) -> ParameterResolver {
        if self.first.mutates_arguments() || self.second.mutates_arguments() {
            ParameterResolver::value(self)
        } else {
            ParameterResolver::context(self)
        }
    }

    fn resolve_sides(&self, args: &mut ArgumentStack, context: &ResolverContext<'_>) -> ResolveResult<ArgValue> {
        let mut attempt = args.clone();
        match self.first.resolve(&mut attempt, context) {
            Ok(value) => {
                *args = attempt;
                Ok(ArgValue::new(Either::<ArgValue, ArgValue>::First(value)))
            }
            Err(defect @ ResolveError::IllegalState { .. }) => Err(defect),
            Err(_) => self
                .second
                .resolve(args, context)
                .map(|value| ArgValue::new(Either::<ArgValue, ArgValue>::Second(value))),
        }
    }
}

impl ValueResolver for EitherResolver {
    fn resolve(&self, args: &mut ArgumentStack, context: &ResolverContext<'_>) -> ResolveResult<ArgValue> {
        self.resolve_sides(args, context)
    }
}

impl ContextResolver for EitherResolver {
    fn resolve(&self, context: &ResolverContext<'_>) -> ResolveResult<ArgValue> {
        self.resolve_sides(&mut ArgumentStack::default(), context)
    }
}

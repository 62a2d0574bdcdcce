//! Parameter processing: resolution and validation
//!
//! This module provides the resolver protocol, the built-in resolvers for the
//! standard types, `either` resolution, and parameter validators.

pub mod builtin;
pub mod either;
pub mod resolver;
pub mod validator;

pub use builtin::{
    ActorNameResolver, BooleanResolver, ChoiceResolver, CommandPathResolver, FloatResolver,
    IntegerResolver, StringResolver,
};
pub use either::EitherResolver;
pub use resolver::{
    Arguments, ContextResolver, ParameterResolver, ResolveResult, ResolvedArguments,
    ResolverContext, ValueResolver,
};
pub use validator::{validator_fn, LengthValidator, ParameterValidator, RangeValidator};

//! Command resolution and dispatch engine
//!
//! This library resolves a tokenized input line against a tree of declared
//! commands, converts each argument into a typed value through pluggable
//! resolvers, validates the values and invokes the selected command. It also
//! produces completion suggestions for partially typed input.

pub mod actor;
pub mod autocomplete;
pub mod command;
pub mod config;
mod dispatcher;
pub mod either;
pub mod errors;
pub mod handler;
pub mod path;
pub mod process;
pub mod sanitizer;
pub mod schema;
pub mod stack;
pub mod types;

// Re-export commonly used types for convenience
pub use actor::{Actor, Permission, SimpleActor};
pub use command::{CategorySpec, CommandInvocation, CommandSpec, ParameterSpec};
pub use config::{ConfigManager, EngineConfig};
pub use either::Either;
pub use errors::{DispatchError, FailureKind, RegistrationError};
pub use handler::{CommandHandler, DispatchOutcome};
pub use path::CommandPath;
pub use schema::CommandSchema;
pub use types::{builtin, ArgValue, ParamType, TypeKey};

//! The command tree: parameters, commands and categories

pub mod executable;
pub mod parameter;

pub use executable::{
    action_fn, CategorySpec, CommandAction, CommandCategory, CommandInvocation, CommandSpec,
    ExecutableCommand,
};
pub use parameter::{CommandParameter, ParameterKind, ParameterSpec};

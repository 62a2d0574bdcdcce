//! Error types for command registration and dispatch
//!
//! Dispatch failures are returned as data: every variant of [`DispatchError`]
//! names the kind of failure, the command path that was attempted and, where it
//! applies, the offending parameter and raw token.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::path::CommandPath;
use crate::sanitizer::DefectTrace;

/// Failure of a single dispatch attempt
///
/// Everything except [`DispatchError::IllegalResolverState`] is an expected,
/// user-facing failure. The command handler is never invoked when any of
/// these is returned, apart from [`DispatchError::HandlerFailed`] which
/// reports an error produced by the handler itself.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Unknown command: {path}")]
    PathNotFound { path: CommandPath },

    #[error("You do not have permission to use '{path}' (requires '{permission}')")]
    PermissionDenied {
        path: CommandPath,
        permission: String,
    },

    #[error("Invalid value '{token}' for '{parameter}': {reason}")]
    ArgumentParse {
        path: CommandPath,
        parameter: String,
        token: String,
        reason: String,
    },

    #[error("Invalid value for '{parameter}': {reason}")]
    ValidationFailed {
        path: CommandPath,
        parameter: String,
        value: String,
        reason: String,
    },

    #[error("Missing required argument '{parameter}' for '{path}'")]
    MissingRequiredArgument {
        path: CommandPath,
        parameter: String,
    },

    #[error("Unexpected arguments for '{path}': {}", tokens.join(" "))]
    UnexpectedArguments {
        path: CommandPath,
        tokens: Vec<String>,
    },

    #[error("Resolver defect while resolving '{parameter}' of '{path}': {message}")]
    IllegalResolverState {
        path: CommandPath,
        parameter: String,
        message: String,
        trace: DefectTrace,
    },

    #[error("Command '{path}' failed: {source}")]
    HandlerFailed {
        path: CommandPath,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Discriminant of a [`DispatchError`], used for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    PathNotFound,
    PermissionDenied,
    ArgumentParse,
    ValidationFailed,
    MissingRequiredArgument,
    UnexpectedArguments,
    IllegalResolverState,
    HandlerFailed,
}

/// Serializable summary of a dispatch failure
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub kind: FailureKind,
    pub path: String,
    pub parameter: Option<String>,
    pub token: Option<String>,
    pub message: String,
}

/// Convenience type alias for dispatch results
pub type DispatchResult<T> = Result<T, DispatchError>;

impl DispatchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::PathNotFound { .. } => FailureKind::PathNotFound,
            Self::PermissionDenied { .. } => FailureKind::PermissionDenied,
            Self::ArgumentParse { .. } => FailureKind::ArgumentParse,
            Self::ValidationFailed { .. } => FailureKind::ValidationFailed,
            Self::MissingRequiredArgument { .. } => FailureKind::MissingRequiredArgument,
            Self::UnexpectedArguments { .. } => FailureKind::UnexpectedArguments,
            Self::IllegalResolverState { .. } => FailureKind::IllegalResolverState,
            Self::HandlerFailed { .. } => FailureKind::HandlerFailed,
        }
    }

    /// The command path that was attempted
    pub fn path(&self) -> &CommandPath {
        match self {
            Self::PathNotFound { path }
            | Self::PermissionDenied { path, .. }
            | Self::ArgumentParse { path, .. }
            | Self::ValidationFailed { path, .. }
            | Self::MissingRequiredArgument { path, .. }
            | Self::UnexpectedArguments { path, .. }
            | Self::IllegalResolverState { path, .. }
            | Self::HandlerFailed { path, .. } => path,
        }
    }

    /// Name of the offending parameter, if the failure concerns one
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::ArgumentParse { parameter, .. }
            | Self::ValidationFailed { parameter, .. }
            | Self::MissingRequiredArgument { parameter, .. }
            | Self::IllegalResolverState { parameter, .. } => Some(parameter),
            _ => None,
        }
    }

    /// The offending raw token, if the failure concerns one
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::ArgumentParse { token, .. } => Some(token),
            Self::UnexpectedArguments { tokens, .. } => tokens.first().map(String::as_str),
            _ => None,
        }
    }

    /// Whether this failure was caused by the actor's input rather than a defect
    pub fn is_user_error(&self) -> bool {
        !matches!(
            self,
            Self::IllegalResolverState { .. } | Self::HandlerFailed { .. }
        )
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::PathNotFound { .. } => "path",
            Self::PermissionDenied { .. } => "permission",
            Self::ArgumentParse { .. }
            | Self::MissingRequiredArgument { .. }
            | Self::UnexpectedArguments { .. } => "argument",
            Self::ValidationFailed { .. } => "validation",
            Self::IllegalResolverState { .. } => "defect",
            Self::HandlerFailed { .. } => "handler",
        }
    }

    pub fn report(&self) -> FailureReport {
        FailureReport {
            kind: self.kind(),
            path: self.path().to_string(),
            parameter: self.parameter().map(str::to_string),
            token: self.token().map(str::to_string),
            message: self.to_string(),
        }
    }
}

/// Failure raised by a resolver
///
/// Resolvers know nothing about the path or parameter name they are working
/// for; the dispatcher attaches both when converting into a [`DispatchError`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("could not parse '{token}': {reason}")]
    Parse { token: String, reason: String },

    #[error("no input left to resolve")]
    Exhausted,

    #[error("{message}")]
    IllegalState { message: String, trace: DefectTrace },
}

impl ResolveError {
    pub fn parse(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// A resolver defect, with the call stack captured here so the trace
    /// starts inside the resolver that detected it
    pub fn illegal_state(message: impl Into<String>) -> Self {
        let message = message.into();
        let trace = DefectTrace::capture(message.clone());
        Self::IllegalState { message, trace }
    }
}

/// Rejection of an already-resolved value by a parameter validator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct ValidationError {
    pub reason: String,
}

impl ValidationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors in a command declaration, detected at registration time
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Command path '{input}' contains an empty segment")]
    EmptyPathSegment { input: String },

    #[error("Command path must not be empty")]
    EmptyPath,

    #[error("Command '{path}' is already registered")]
    DuplicatePath { path: CommandPath },

    #[error("Category '{path}' already has a default action")]
    DuplicateDefaultAction { path: CommandPath },

    #[error("Command '{path}' has no handler")]
    MissingHandler { path: CommandPath },

    #[error("Parameter '{parameter}' of '{path}' must be optional because '{previous}' before it is optional")]
    OptionalChain {
        path: CommandPath,
        parameter: String,
        previous: String,
    },

    #[error("Parameter '{parameter}' of '{path}' consumes all input but is not the last parameter")]
    MisplacedConsumeAll { path: CommandPath, parameter: String },

    #[error("Parameter name '{parameter}' is used twice in '{path}'")]
    DuplicateParameter { path: CommandPath, parameter: String },

    #[error("Flag or switch name '{name}' is used twice in '{path}'")]
    DuplicateFlag { path: CommandPath, name: String },

    #[error("Switch '{parameter}' must have the boolean type, found '{found}'")]
    InvalidSwitchType { parameter: String, found: String },

    #[error("Malformed parameter type '{input}': {reason}")]
    InvalidType { input: String, reason: String },

    #[error("No resolver is registered for type '{type_name}' (parameter '{parameter}')")]
    NoResolver { parameter: String, type_name: String },

    #[error("Failed to read command schema '{path}'")]
    SchemaRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse command schema: {0}")]
    SchemaParse(#[from] toml::de::Error),

    #[error("Invalid command schema: {reason}")]
    InvalidSchema { reason: String },
}

/// Convenience type alias for registration results
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Errors loading or saving the engine configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to get base directories")]
    NoHomeDirectory,

    #[error("Failed to {operation} '{path}'")]
    Io {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
    pub fn io(path: impl Into<PathBuf>, operation: &'static str, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation,
            source,
        }
    }
}

/// Convenience type alias for configuration results
pub type ConfigResult<T> = Result<T, ConfigError>;

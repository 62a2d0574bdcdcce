//! Attaching dispatch context to resolver and validator failures
//!
//! Resolvers and validators report bare failures; the dispatcher knows which
//! command and parameter was being worked on and converts them into
//! [`DispatchError`]s through the extension traits defined here.

use super::types::{DispatchError, ResolveError, ValidationError};
use crate::command::CommandParameter;
use crate::path::CommandPath;
use crate::sanitizer::{DefectTrace, StackTraceSanitizer};
use crate::types::ArgValue;

/// Where a failure happened during one dispatch
#[derive(Clone, Copy)]
pub struct FailureSite<'a> {
    pub path: &'a CommandPath,
    pub parameter: &'a CommandParameter,
    pub sanitizer: &'a StackTraceSanitizer,
}

impl<'a> FailureSite<'a> {
    pub fn new(
        path: &'a CommandPath,
        parameter: &'a CommandParameter,
        sanitizer: &'a StackTraceSanitizer,
    ) -> Self {
        Self {
            path,
            parameter,
            sanitizer,
        }
    }

    pub fn missing(&self) -> DispatchError {
        DispatchError::MissingRequiredArgument {
            path: self.path.clone(),
            parameter: self.parameter.name().to_string(),
        }
    }

    /// Build a defect error from a trace captured by the resolver
    pub fn defect(&self, message: String, mut trace: DefectTrace) -> DispatchError {
        self.sanitizer.sanitize(&mut trace);
        DispatchError::IllegalResolverState {
            path: self.path.clone(),
            parameter: self.parameter.name().to_string(),
            message,
            trace,
        }
    }
}

/// Extension trait converting resolver failures into dispatch failures
pub trait ResolveResultExt<T> {
    fn at_site(self, site: &FailureSite<'_>) -> Result<T, DispatchError>;
}

impl<T> ResolveResultExt<T> for Result<T, ResolveError> {
    fn at_site(self, site: &FailureSite<'_>) -> Result<T, DispatchError> {
        self.map_err(|e| match e {
            ResolveError::Parse { token, reason } => DispatchError::ArgumentParse {
                path: site.path.clone(),
                parameter: site.parameter.name().to_string(),
                token,
                reason,
            },
            ResolveError::Exhausted => site.missing(),
            ResolveError::IllegalState { message, trace } => site.defect(message, trace),
        })
    }
}

/// Extension trait converting validator rejections into dispatch failures
pub trait ValidationResultExt {
    fn at_site(self, site: &FailureSite<'_>, value: Option<&ArgValue>) -> Result<(), DispatchError>;
}

impl ValidationResultExt for Result<(), ValidationError> {
    fn at_site(self, site: &FailureSite<'_>, value: Option<&ArgValue>) -> Result<(), DispatchError> {
        self.map_err(|e| DispatchError::ValidationFailed {
            path: site.path.clone(),
            parameter: site.parameter.name().to_string(),
            value: value
                .map(|v| format!("{:?}", v))
                .unwrap_or_else(|| "<absent>".to_string()),
            reason: e.reason,
        })
    }
}

//! Centralized error handling module
//!
//! Registration problems surface as [`RegistrationError`]; everything that can
//! go wrong while dispatching one input line surfaces as [`DispatchError`].

pub mod context;
pub mod types;

pub use context::{FailureSite, ResolveResultExt, ValidationResultExt};
pub use types::{
    ConfigError, ConfigResult, DispatchError, DispatchResult, FailureKind, FailureReport,
    RegistrationError, RegistrationResult, ResolveError, ValidationError,
};

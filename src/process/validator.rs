//! Parameter validation
//!
//! Validators run after a value has been resolved, whether it came from the
//! actor's input or from a declared default. A rejection is reported as a
//! validation failure, distinct from a parse failure.

use crate::actor::Actor;
use crate::command::CommandParameter;
use crate::errors::ValidationError;
use crate::types::ArgValue;

/// Trait for parameter validators
///
/// Validators registered for a type also apply to its declared subtypes, so a
/// validator on `number` checks `integer` and `float` parameters as well.
pub trait ParameterValidator: Send + Sync {
    /// Validate a resolved value
    ///
    /// # Arguments
    /// * `value` - The resolved value, `None` for an absent optional
    /// * `parameter` - The parameter that will receive the value
    /// * `actor` - The actor running the command
    fn validate(
        &self,
        value: Option<&ArgValue>,
        parameter: &CommandParameter,
        actor: &dyn Actor,
    ) -> Result<(), ValidationError>;
}

/// Wrap a closure as a validator
pub fn validator_fn<F>(f: F) -> impl ParameterValidator
where
    F: Fn(Option<&ArgValue>, &CommandParameter, &dyn Actor) -> Result<(), ValidationError> + Send + Sync,
{
    FnValidator(f)
}

struct FnValidator<F>(F);

impl<F> ParameterValidator for FnValidator<F>
where
    F: Fn(Option<&ArgValue>, &CommandParameter, &dyn Actor) -> Result<(), ValidationError> + Send + Sync,
{
    fn validate(
        &self,
        value: Option<&ArgValue>,
        parameter: &CommandParameter,
        actor: &dyn Actor,
    ) -> Result<(), ValidationError> {
        (self.0)(value, parameter, actor)
    }
}

/// Bounds a numeric value, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeValidator {
    min: Option<f64>,
    max: Option<f64>,
}

impl RangeValidator {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self::new(Some(min), Some(max))
    }

    fn numeric(value: &ArgValue) -> Option<f64> {
        value
            .downcast_ref::<i64>()
            .map(|n| *n as f64)
            .or_else(|| value.downcast_ref::<f64>().copied())
    }
}

impl ParameterValidator for RangeValidator {
    fn validate(
        &self,
        value: Option<&ArgValue>,
        _parameter: &CommandParameter,
        _actor: &dyn Actor,
    ) -> Result<(), ValidationError> {
        let Some(number) = value.and_then(Self::numeric) else {
            return Ok(());
        };

        if let Some(min) = self.min {
            if number < min {
                return Err(ValidationError::new(format!(
                    "Specified value ({}) is less than minimum {}",
                    number, min
                )));
            }
        }
        if let Some(max) = self.max {
            if number > max {
                return Err(ValidationError::new(format!(
                    "Specified value ({}) is greater than maximum {}",
                    number, max
                )));
            }
        }
        Ok(())
    }
}

/// Bounds the character length of a string value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthValidator {
    min: Option<usize>,
    max: Option<usize>,
}

impl LengthValidator {
    pub fn new(min: Option<usize>, max: Option<usize>) -> Self {
        Self { min, max }
    }
}

impl ParameterValidator for LengthValidator {
    fn validate(
        &self,
        value: Option<&ArgValue>,
        _parameter: &CommandParameter,
        _actor: &dyn Actor,
    ) -> Result<(), ValidationError> {
        let Some(text) = value.and_then(ArgValue::downcast_ref::<String>) else {
            return Ok(());
        };
        let length = text.chars().count();

        if self.min.is_some_and(|min| length < min) {
            return Err(ValidationError::new(format!(
                "Text is too short ({} characters, minimum {})",
                length,
                self.min.unwrap_or_default()
            )));
        }
        if self.max.is_some_and(|max| length > max) {
            return Err(ValidationError::new(format!(
                "Text is too long ({} characters, maximum {})",
                length,
                self.max.unwrap_or_default()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::SimpleActor;
    use crate::command::ParameterSpec;
    use crate::handler::CommandHandler;
    use crate::types::builtin::INTEGER;

    fn parameter() -> CommandParameter {
        let handler = CommandHandler::new();
        handler
            .build_parameter(ParameterSpec::new("amount", INTEGER), 0)
            .unwrap()
    }

    #[test]
    fn test_range_validator() {
        let validator = RangeValidator::between(1.0, 10.0);
        let actor = SimpleActor::new("tester");
        let param = parameter();

        assert!(validator.validate(Some(&ArgValue::new(5_i64)), &param, &actor).is_ok());
        assert!(validator.validate(Some(&ArgValue::new(10.0_f64)), &param, &actor).is_ok());
        assert!(validator.validate(None, &param, &actor).is_ok());

        let err = validator
            .validate(Some(&ArgValue::new(11_i64)), &param, &actor)
            .unwrap_err();
        assert!(err.reason.contains("greater than maximum"));

        let err = validator
            .validate(Some(&ArgValue::new(0.5_f64)), &param, &actor)
            .unwrap_err();
        assert!(err.reason.contains("less than minimum"));
    }

    #[test]
    fn test_length_validator() {
        let validator = LengthValidator::new(Some(2), Some(4));
        let actor = SimpleActor::new("tester");
        let param = parameter();

        let ok = ArgValue::new("abc".to_string());
        assert!(validator.validate(Some(&ok), &param, &actor).is_ok());

        let short = ArgValue::new("a".to_string());
        assert!(validator.validate(Some(&short), &param, &actor).is_err());

        let long = ArgValue::new("abcde".to_string());
        let err = validator.validate(Some(&long), &param, &actor).unwrap_err();
        assert!(err.reason.contains("too long"));
    }

    #[test]
    fn test_closure_validator() {
        let validator = validator_fn(|value, parameter, _actor| {
            match value.and_then(ArgValue::downcast_ref::<i64>) {
                Some(n) if n % 2 != 0 => Err(ValidationError::new(format!(
                    "{} must be even",
                    parameter.name()
                ))),
                _ => Ok(()),
            }
        });
        let actor = SimpleActor::new("tester");
        let param = parameter();

        assert!(validator.validate(Some(&ArgValue::new(4_i64)), &param, &actor).is_ok());
        let err = validator
            .validate(Some(&ArgValue::new(3_i64)), &param, &actor)
            .unwrap_err();
        assert_eq!(err.reason, "amount must be even");
    }
}

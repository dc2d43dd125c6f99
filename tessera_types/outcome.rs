use serde::{Serialize, Serializer, ser::SerializeStruct};
use std::borrow::Cow;
use thiserror::Error as ThisError;

use crate::{error::Error, validation::ValidationError};

static NO_ERROR: Error = Error::NONE;

/// Contract violations when building or reading an [`Outcome`].
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum OutcomeError {
    #[error("A successful result cannot have an error.")]
    SuccessWithError,

    #[error("A failure result must have an error.")]
    FailureWithoutError,

    #[error("A successful result must carry a value.")]
    SuccessWithoutValue,

    #[error("Cannot access the value of a failure result.")]
    ValueOfFailure,
}

#[derive(Debug, Clone, PartialEq)]
enum State<T> {
    Success(T),
    Failure {
        error: Error,
        validation_errors: Vec<ValidationError>,
    },
}

/// Success with a value, or failure with a non-empty [`Error`].
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    state: State<T>,
}

impl<T> Outcome<T> {
    pub fn success(value: T) -> Self {
        Self {
            state: State::Success(value),
        }
    }

    /// Builds a failure.
    ///
    /// # Panics
    /// When `error` is [`Error::NONE`]: a failure without an error is a bug in the caller.
    pub fn failure(error: Error) -> Self {
        assert!(!error.is_none(), "{}", OutcomeError::FailureWithoutError);
        Self {
            state: State::Failure {
                error,
                validation_errors: Vec::new(),
            },
        }
    }

    /// Checked constructor mirroring the success/error pairing rules.
    pub fn new(is_success: bool, value: Option<T>, error: Error) -> Result<Self, OutcomeError> {
        match (is_success, error.is_none()) {
            (true, false) => Err(OutcomeError::SuccessWithError),
            (false, true) => Err(OutcomeError::FailureWithoutError),
            (true, true) => value
                .map(Self::success)
                .ok_or(OutcomeError::SuccessWithoutValue),
            (false, false) => Ok(Self::failure(error)),
        }
    }

    /// A `ValidationFailed` failure carrying every violation; details hold one
    /// `property: message` line per error.
    pub fn invalid(errors: Vec<ValidationError>) -> Self {
        let details = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            state: State::Failure {
                error: Error::VALIDATION_FAILED.with_details(details),
                validation_errors: errors,
            },
        }
    }

    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::failure(Error::NOT_FOUND.with_message(message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self.state, State::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// The failure error, or [`Error::NONE`] on success.
    pub fn error(&self) -> &Error {
        match &self.state {
            State::Success(_) => &NO_ERROR,
            State::Failure { error, .. } => error,
        }
    }

    pub fn validation_errors(&self) -> &[ValidationError] {
        match &self.state {
            State::Success(_) => &[],
            State::Failure {
                validation_errors, ..
            } => validation_errors,
        }
    }

    pub fn value(&self) -> Result<&T, OutcomeError> {
        match &self.state {
            State::Success(value) => Ok(value),
            State::Failure { .. } => Err(OutcomeError::ValueOfFailure),
        }
    }

    pub fn into_value(self) -> Result<T, OutcomeError> {
        match self.state {
            State::Success(value) => Ok(value),
            State::Failure { .. } => Err(OutcomeError::ValueOfFailure),
        }
    }

    pub fn into_result(self) -> Result<T, Error> {
        match self.state {
            State::Success(value) => Ok(value),
            State::Failure { error, .. } => Err(error),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self.state {
            State::Success(value) => Outcome::success(f(value)),
            State::Failure {
                error,
                validation_errors,
            } => Outcome {
                state: State::Failure {
                    error,
                    validation_errors,
                },
            },
        }
    }

    pub fn and_then<U, F: FnOnce(T) -> Outcome<U>>(self, f: F) -> Outcome<U> {
        match self.state {
            State::Success(value) => f(value),
            State::Failure {
                error,
                validation_errors,
            } => Outcome {
                state: State::Failure {
                    error,
                    validation_errors,
                },
            },
        }
    }
}

impl Outcome<()> {
    pub fn ok() -> Self {
        Self::success(())
    }
}

impl<T> From<T> for Outcome<T> {
    fn from(value: T) -> Self {
        Self::success(value)
    }
}

impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Outcome", 4)?;
        s.serialize_field("isSuccess", &self.is_success())?;
        match &self.state {
            State::Success(value) => {
                s.serialize_field("value", value)?;
                s.serialize_field("error", &NO_ERROR)?;
                s.skip_field("validationErrors")?;
            }
            State::Failure {
                error,
                validation_errors,
            } => {
                s.skip_field("value")?;
                s.serialize_field("error", error)?;
                s.serialize_field("validationErrors", validation_errors)?;
            }
        }
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_carries_no_error() {
        let outcome = Outcome::success(42);
        assert!(outcome.is_success());
        assert!(outcome.error().is_none());
        assert_eq!(outcome.value(), Ok(&42));
    }

    #[test]
    fn failure_carries_error_and_hides_value() {
        let outcome: Outcome<i32> = Outcome::failure(Error::CONFLICT);
        assert!(outcome.is_failure());
        assert_eq!(outcome.error(), &Error::CONFLICT);
        assert_eq!(outcome.value(), Err(OutcomeError::ValueOfFailure));
        assert_eq!(outcome.into_value(), Err(OutcomeError::ValueOfFailure));
    }

    #[test]
    #[should_panic(expected = "A failure result must have an error.")]
    fn failure_with_none_panics() {
        let _ = Outcome::<()>::failure(Error::NONE);
    }

    #[test]
    fn checked_constructor_rejects_bad_pairings() {
        assert_eq!(
            Outcome::new(true, Some(1), Error::NOT_FOUND),
            Err(OutcomeError::SuccessWithError)
        );
        assert_eq!(
            Outcome::<i32>::new(false, None, Error::NONE),
            Err(OutcomeError::FailureWithoutError)
        );
        assert_eq!(
            Outcome::<i32>::new(true, None, Error::NONE),
            Err(OutcomeError::SuccessWithoutValue)
        );
        assert!(Outcome::new(true, Some(1), Error::NONE).unwrap().is_success());
        assert!(
            Outcome::<i32>::new(false, None, Error::UNAUTHORIZED)
                .unwrap()
                .is_failure()
        );
    }

    #[test]
    fn invalid_lists_property_messages_in_details() {
        let outcome: Outcome<()> = Outcome::invalid(vec![
            ValidationError::new("NotEmpty", "'name' must not be empty.", "name"),
            ValidationError::new("MaximumLength", "too long", "sku"),
        ]);

        assert_eq!(outcome.error().code(), "General.ValidationFailed");
        assert_eq!(
            outcome.error().details(),
            "name: 'name' must not be empty.\nsku: too long"
        );
        assert_eq!(outcome.validation_errors().len(), 2);
    }

    #[test]
    fn not_found_overrides_message() {
        let outcome: Outcome<()> = Outcome::not_found("Widget 3 does not exist");
        assert_eq!(outcome.error().code(), Error::NOT_FOUND.code());
        assert_eq!(outcome.error().message(), "Widget 3 does not exist");
    }

    #[test]
    fn map_and_and_then_keep_failures() {
        let ok = Outcome::success(2).map(|v| v * 10).and_then(|v| Outcome::success(v + 1));
        assert_eq!(ok.into_result(), Ok(21));

        let failed: Outcome<i32> = Outcome::invalid(vec![ValidationError::new("c", "m", "p")]);
        let mapped = failed.map(|v| v.to_string());
        assert_eq!(mapped.validation_errors().len(), 1);
        assert_eq!(mapped.error().code(), "General.ValidationFailed");
    }

    #[test]
    fn serializes_with_flag_and_error() {
        let json = serde_json::to_value(Outcome::success("hi")).unwrap();
        assert_eq!(json["isSuccess"], true);
        assert_eq!(json["value"], "hi");
        assert_eq!(json["error"]["code"], "");

        let json = serde_json::to_value(Outcome::<()>::failure(Error::UNAUTHORIZED)).unwrap();
        assert_eq!(json["isSuccess"], false);
        assert!(json.get("value").is_none());
        assert_eq!(json["error"]["code"], "General.Unauthorized");
    }

    #[test]
    fn from_value_is_success() {
        let outcome: Outcome<&str> = "x".into();
        assert!(outcome.is_success());
        assert!(Outcome::ok().is_success());
    }
}

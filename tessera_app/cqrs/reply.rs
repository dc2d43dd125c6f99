use tessera_types::{
    Error, Outcome, ValidationError,
    grid::{PagedResponse, PaginatedList},
};
use uuid::Uuid;

/// What a handler may answer with.
///
/// Responses that can carry a failure (`Outcome<T>`) turn validation and
/// transaction errors into failed outcomes. Plain values cannot, so the
/// pipeline returns those errors to the caller instead.
pub trait Reply: Send + 'static {
    /// Builds a `ValidationFailed` response, or gives the errors back.
    fn from_validation_errors(errors: Vec<ValidationError>) -> Result<Self, Vec<ValidationError>>
    where
        Self: Sized,
    {
        Err(errors)
    }

    /// Builds a failed response from `error`, if this type can hold one.
    fn from_error(_error: Error) -> Option<Self>
    where
        Self: Sized,
    {
        None
    }

    /// `Some(message)` when this response represents a failure.
    fn failure_message(&self) -> Option<String> {
        None
    }
}

impl<T: Send + 'static> Reply for Outcome<T> {
    fn from_validation_errors(errors: Vec<ValidationError>) -> Result<Self, Vec<ValidationError>> {
        Ok(Outcome::invalid(errors))
    }

    fn from_error(error: Error) -> Option<Self> {
        Some(Outcome::failure(error))
    }

    fn failure_message(&self) -> Option<String> {
        self.is_failure().then(|| self.error().to_string())
    }
}

macro_rules! plain_reply {
    ($($ty:ty),* $(,)?) => {
        $(impl Reply for $ty {})*
    };
}

plain_reply!(
    (), bool, u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64, String, Uuid,
    serde_json::Value,
);

impl<T: Send + 'static> Reply for Vec<T> {}
impl<T: Send + 'static> Reply for Option<T> {}
impl<T: Send + 'static> Reply for PagedResponse<T> {}
impl<T: Send + 'static> Reply for PaginatedList<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_absorbs_failures() {
        let invalid = <Outcome<u8> as Reply>::from_validation_errors(vec![ValidationError::new(
            "NotEmpty", "m", "name",
        )])
        .unwrap();
        assert_eq!(invalid.error().code(), Error::VALIDATION_FAILED.code());

        let failed = <Outcome<u8> as Reply>::from_error(Error::OPERATION_FAILED.with_details("x"))
            .unwrap();
        assert_eq!(
            failed.failure_message().as_deref(),
            Some("General.OperationFailed: The operation failed to complete. (x)")
        );
        assert_eq!(Outcome::success(1u8).failure_message(), None);
    }

    #[test]
    fn plain_values_hand_errors_back() {
        let errors = vec![ValidationError::new("NotEmpty", "m", "name")];
        assert_eq!(<u32 as Reply>::from_validation_errors(errors.clone()), Err(errors));
        assert!(<Vec<u8> as Reply>::from_error(Error::CONFLICT).is_none());
        assert_eq!(String::from("x").failure_message(), None);
    }
}

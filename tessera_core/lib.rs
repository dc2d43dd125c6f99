use thiserror::Error;

use tessera_types::ValidationError;

pub mod app_error;
pub mod db_error;

pub use app_error::AppError;
pub use db_error::DbError;

pub type Result<T, E = ApplicationError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Validation failed: {}", summarize(.0))]
    Validation(Vec<ValidationError>),

    #[error("The operation was cancelled")]
    Cancelled,

    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),

    #[error("An unknown error occurred: {0}")]
    Unknown(String),
}

impl ApplicationError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApplicationError::Cancelled)
    }
}

impl From<anyhow::Error> for ApplicationError {
    fn from(err: anyhow::Error) -> Self {
        ApplicationError::Unknown(err.to_string())
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_properties() {
        let err = ApplicationError::Validation(vec![
            ValidationError::new("NotEmpty", "must not be empty", "name"),
            ValidationError::new("MaximumLength", "too long", "sku"),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: name: must not be empty; sku: too long"
        );
    }

    #[test]
    fn anyhow_maps_to_unknown() {
        let err: ApplicationError = anyhow::anyhow!("disk full").into();
        assert!(matches!(err, ApplicationError::Unknown(ref m) if m == "disk full"));
    }

    #[test]
    fn nested_errors_are_transparent() {
        let err: ApplicationError = AppError::NoHandler("CreateWidget").into();
        assert_eq!(err.to_string(), "No handler registered for CreateWidget");
        assert!(!err.is_cancelled());
        assert!(ApplicationError::Cancelled.is_cancelled());
    }
}

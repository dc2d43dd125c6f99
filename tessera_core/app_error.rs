use thiserror::Error;
use uuid::Uuid;

use tessera_types::OutcomeError;

/// Errors for dispatch wiring and application logic.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No handler registered for {0}")]
    NoHandler(&'static str),

    #[error("More than one handler registered for {0}")]
    DuplicateHandler(&'static str),

    #[error("Validator registered for {0}, which has no handler")]
    ValidatorWithoutHandler(&'static str),

    #[error("No repository registered for entity {0}")]
    MissingRepository(&'static str),

    #[error("Field '{path}' does not exist on {entity}")]
    UnknownField { entity: &'static str, path: String },

    #[error("There is no active transaction")]
    NoActiveTransaction,

    #[error("Transaction {0} is not the current transaction")]
    TransactionNotCurrent(Uuid),

    #[error(transparent)]
    Outcome(#[from] OutcomeError),
}

use thiserror::Error;

/// Errors for db stuff.
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Field '{path}' cannot be queried on {entity}")]
    UnsupportedField { entity: &'static str, path: String },

    #[error("{entity} with ID {id} not found")]
    NotFound { entity: &'static str, id: String },
}

mod command_repository;
mod query_repository;

pub use command_repository::PostgresCommandRepository;
pub use query_repository::PostgresQueryRepository;

use sqlx::{FromRow, postgres::PgRow};

use tessera_app::{repository::Entity, specification::FieldValue};
use tessera_core::DbError;

/// An [`Entity`] stored in one Postgres table.
///
/// Only top-level fields with a column are translated into SQL; filtering
/// or sorting on anything else is a `DbError::UnsupportedField`.
pub trait PgEntity: Entity {
    type Row: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static;

    const TABLE: &'static str;
    /// Select list, in the order [`PgEntity::to_columns`] writes them.
    const COLUMNS: &'static [&'static str];

    fn from_row(row: Self::Row) -> Result<Self, DbError>;

    /// Column values to write, id included.
    fn to_columns(&self) -> Vec<(&'static str, FieldValue)>;
}

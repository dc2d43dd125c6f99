pub mod health;
pub mod mapping;
pub mod sql;
pub mod uow;

mod audit_sink;
mod connection;
mod models;
mod repository;

pub use audit_sink::PostgresAuditSink;
pub use connection::{DbPool, establish_connection_pool, establish_test_connection_pool};
pub use repository::*;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

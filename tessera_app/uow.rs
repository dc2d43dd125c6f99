use std::{fmt, sync::Arc};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use tessera_core::ApplicationError;

use crate::{
    auditable::ChangeStamper,
    repository::{CommandRepository, Entity, QueryRepository, Repositories},
};

/// Identifies the explicit transaction a unit of work has open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionHandle(Uuid);

impl TransactionHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for TransactionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Unit of Work (UoW) scopes one dispatch: its repositories share a
/// single session, and staged changes become durable on
/// [`UnitOfWork::save_changes`], or on commit while an explicit
/// transaction is open.
///
/// At most one explicit transaction is open at a time.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Opens an explicit transaction. When one is already open its handle
    /// is returned and nothing new is started.
    async fn begin_transaction(
        &self,
        cancel: &CancellationToken,
    ) -> Result<TransactionHandle, ApplicationError>;

    /// Saves pending changes and commits. `handle` must be the open
    /// transaction; if the commit fails the transaction is rolled back.
    async fn commit_transaction(
        &self,
        handle: TransactionHandle,
        cancel: &CancellationToken,
    ) -> Result<(), ApplicationError>;

    /// Discards the open transaction and anything staged. Without an open
    /// transaction this only logs a warning.
    async fn rollback_transaction(&self) -> Result<(), ApplicationError>;

    fn current_transaction(&self) -> Option<TransactionHandle>;

    fn has_active_transaction(&self) -> bool {
        self.current_transaction().is_some()
    }

    /// Flushes staged changes and returns how many were written.
    async fn save_changes(&self, cancel: &CancellationToken) -> Result<u64, ApplicationError>;

    /// Repositories bound to this unit of work.
    fn repositories(&self) -> &Repositories;
}

impl dyn UnitOfWork {
    pub fn commands<T: Entity>(&self) -> Result<Arc<dyn CommandRepository<T>>, ApplicationError> {
        self.repositories().commands::<T>()
    }

    pub fn queries<T: Entity>(&self) -> Result<Arc<dyn QueryRepository<T>>, ApplicationError> {
        self.repositories().queries::<T>()
    }
}

/// A factory for Unit of Work instances, one per dispatch. `stamper`
/// carries the dispatch's user and clock down to the command repositories.
pub trait UnitOfWorkProvider: Send + Sync {
    fn create(&self, stamper: ChangeStamper) -> Arc<dyn UnitOfWork>;
}

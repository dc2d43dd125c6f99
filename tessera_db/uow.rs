use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::{
    Arc, Mutex as StdMutex, PoisonError,
    atomic::{AtomicU64, Ordering},
};
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use tessera_app::{
    audit_log::AuditLog,
    auditable::ChangeStamper,
    context::cancellable,
    repository::Repositories,
    uow::{TransactionHandle, UnitOfWork, UnitOfWorkProvider},
};
use tessera_core::{AppError, ApplicationError, DbError};

use crate::repository::{PgEntity, PostgresCommandRepository, PostgresQueryRepository};

pub(crate) type PgTransaction = Transaction<'static, Postgres>;

/// The connection state shared by one unit of work and its repositories.
///
/// A database transaction is opened lazily by the first write. Without an
/// explicit transaction it's committed by `save_changes`; inside one it
/// stays open until commit or rollback. Dropping a session with an open
/// transaction rolls it back.
pub struct PgSession {
    pool: PgPool,
    stamper: ChangeStamper,
    tx: Mutex<Option<PgTransaction>>,
    explicit: StdMutex<Option<TransactionHandle>>,
    pending: AtomicU64,
}

impl PgSession {
    pub fn new(pool: PgPool, stamper: ChangeStamper) -> Self {
        Self {
            pool,
            stamper,
            tx: Mutex::new(None),
            explicit: StdMutex::new(None),
            pending: AtomicU64::new(0),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn stamper(&self) -> &ChangeStamper {
        &self.stamper
    }

    /// The open transaction, beginning one if there is none yet.
    pub(crate) async fn writer(
        &self,
    ) -> Result<MutexGuard<'_, Option<PgTransaction>>, ApplicationError> {
        let mut guard = self.tx.lock().await;
        if guard.is_none() {
            let tx = self
                .pool
                .begin()
                .await
                .map_err(|e| ApplicationError::Db(DbError::Database(e)))?;
            *guard = Some(tx);
        }
        Ok(guard)
    }

    /// Current transaction for reads; `None` reads go to the pool.
    pub(crate) async fn reader(&self) -> MutexGuard<'_, Option<PgTransaction>> {
        self.tx.lock().await
    }

    pub(crate) fn record_writes(&self, rows: u64) {
        self.pending.fetch_add(rows, Ordering::SeqCst);
    }

    fn explicit(&self) -> Option<TransactionHandle> {
        *self.explicit.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_explicit(&self, handle: Option<TransactionHandle>) {
        *self.explicit.lock().unwrap_or_else(PoisonError::into_inner) = handle;
    }

    async fn commit_open(&self) -> Result<(), ApplicationError> {
        if let Some(tx) = self.tx.lock().await.take() {
            tx.commit()
                .await
                .map_err(|e| ApplicationError::Db(DbError::Database(e)))?;
        }
        Ok(())
    }

    async fn rollback_open(&self) -> Result<(), ApplicationError> {
        self.pending.store(0, Ordering::SeqCst);
        if let Some(tx) = self.tx.lock().await.take() {
            tx.rollback()
                .await
                .map_err(|e| ApplicationError::Db(DbError::Database(e)))?;
        }
        Ok(())
    }

    pub(crate) async fn save(&self) -> Result<u64, ApplicationError> {
        let written = self.pending.swap(0, Ordering::SeqCst);
        if self.explicit().is_none() {
            self.commit_open().await?;
        }
        Ok(written)
    }
}

type Registrar = fn(Repositories, &Arc<PgSession>) -> Repositories;

fn register_entity<T: PgEntity>(
    repositories: Repositories,
    session: &Arc<PgSession>,
) -> Repositories {
    repositories
        .with_commands::<T>(Arc::new(PostgresCommandRepository::<T>::new(session.clone())))
        .with_queries::<T>(Arc::new(PostgresQueryRepository::<T>::new(session.clone())))
}

#[derive(Clone)]
pub struct PostgresUnitOfWorkProvider {
    pool: PgPool,
    registrars: Vec<Registrar>,
}

impl PostgresUnitOfWorkProvider {
    /// A provider with the audit log already mapped.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            registrars: Vec::new(),
        }
        .with_entity::<AuditLog>()
    }

    /// Exposes repositories for `T` on every unit of work.
    pub fn with_entity<T: PgEntity>(mut self) -> Self {
        self.registrars.push(register_entity::<T>);
        self
    }

    /// A unit of work acting as an anonymous user.
    pub fn unit_of_work(&self) -> PostgresUnitOfWork {
        self.unit_of_work_as(ChangeStamper::default())
    }

    pub fn unit_of_work_as(&self, stamper: ChangeStamper) -> PostgresUnitOfWork {
        let session = Arc::new(PgSession::new(self.pool.clone(), stamper));
        let repositories = self
            .registrars
            .iter()
            .fold(Repositories::new(), |repositories, register| {
                register(repositories, &session)
            });

        PostgresUnitOfWork {
            session,
            repositories,
        }
    }
}

impl UnitOfWorkProvider for PostgresUnitOfWorkProvider {
    fn create(&self, stamper: ChangeStamper) -> Arc<dyn UnitOfWork> {
        Arc::new(self.unit_of_work_as(stamper))
    }
}

pub struct PostgresUnitOfWork {
    session: Arc<PgSession>,
    repositories: Repositories,
}

impl PostgresUnitOfWork {
    pub fn session(&self) -> &Arc<PgSession> {
        &self.session
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn begin_transaction(
        &self,
        cancel: &CancellationToken,
    ) -> Result<TransactionHandle, ApplicationError> {
        if let Some(handle) = self.session.explicit() {
            tracing::warn!(transaction = %handle, "Transaction already active");
            return Ok(handle);
        }

        cancellable(cancel, async {
            drop(self.session.writer().await?);
            Ok::<_, ApplicationError>(())
        })
        .await?;

        let handle = TransactionHandle::new();
        self.session.set_explicit(Some(handle));
        tracing::debug!(transaction = %handle, "Transaction started");
        Ok(handle)
    }

    async fn commit_transaction(
        &self,
        handle: TransactionHandle,
        cancel: &CancellationToken,
    ) -> Result<(), ApplicationError> {
        match self.session.explicit() {
            None => return Err(AppError::NoActiveTransaction.into()),
            Some(current) if current != handle => {
                return Err(AppError::TransactionNotCurrent(handle.id()).into());
            }
            Some(_) => {}
        }

        let committed = cancellable(cancel, async {
            self.session.save().await?;
            self.session.commit_open().await
        })
        .await;

        self.session.set_explicit(None);
        match committed {
            Ok(()) => {
                tracing::debug!(transaction = %handle, "Transaction committed");
                Ok(())
            }
            Err(err) => {
                tracing::error!(transaction = %handle, error = %err, "Commit failed, rolling back");
                if let Err(rollback) = self.session.rollback_open().await {
                    tracing::error!(error = %rollback, "Rollback after failed commit failed");
                }
                Err(err)
            }
        }
    }

    async fn rollback_transaction(&self) -> Result<(), ApplicationError> {
        let Some(handle) = self.session.explicit() else {
            tracing::warn!("No active transaction to roll back");
            return Ok(());
        };

        self.session.set_explicit(None);
        self.session.rollback_open().await?;
        tracing::debug!(transaction = %handle, "Transaction rolled back");
        Ok(())
    }

    fn current_transaction(&self) -> Option<TransactionHandle> {
        self.session.explicit()
    }

    async fn save_changes(&self, cancel: &CancellationToken) -> Result<u64, ApplicationError> {
        cancellable(cancel, self.session.save()).await
    }

    fn repositories(&self) -> &Repositories {
        &self.repositories
    }
}

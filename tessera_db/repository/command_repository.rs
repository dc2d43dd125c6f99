use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use std::{marker::PhantomData, slice, sync::Arc};
use tokio_util::sync::CancellationToken;

use tessera_app::{context::cancellable, repository::CommandRepository};
use tessera_core::{ApplicationError, DbError};

use crate::{
    repository::PgEntity,
    sql::{delete_query, insert_queries, insert_query, update_query},
    uow::PgSession,
};

pub struct PostgresCommandRepository<T> {
    session: Arc<PgSession>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: PgEntity> PostgresCommandRepository<T> {
    pub fn new(session: Arc<PgSession>) -> Self {
        Self {
            session,
            _entity: PhantomData,
        }
    }

    /// Runs a write inside the session's transaction and returns the rows it touched.
    async fn execute(
        &self,
        mut query: QueryBuilder<'static, Postgres>,
    ) -> Result<u64, ApplicationError> {
        let mut tx_guard = self.session.writer().await?;
        let tx = tx_guard
            .as_mut()
            .ok_or_else(|| DbError::Transaction("session has no open transaction".into()))?;

        let rows = query
            .build()
            .execute(&mut **tx)
            .await
            .map_err(|e| ApplicationError::Db(DbError::Database(e)))?
            .rows_affected();

        self.session.record_writes(rows);
        Ok(rows)
    }

    fn not_found(entity: &T) -> ApplicationError {
        DbError::NotFound {
            entity: T::NAME,
            id: entity.id().to_string(),
        }
        .into()
    }
}

#[async_trait]
impl<T: PgEntity> CommandRepository<T> for PostgresCommandRepository<T> {
    async fn add(&self, mut entity: T, cancel: &CancellationToken) -> Result<T, ApplicationError> {
        self.session.stamper().on_added(&mut entity);
        cancellable(cancel, self.execute(insert_query(slice::from_ref(&entity)))).await?;
        Ok(entity)
    }

    /// Inserts in batches that stay under the bind parameter limit, all
    /// inside the session's transaction.
    async fn add_range(
        &self,
        mut entities: Vec<T>,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, ApplicationError> {
        for entity in &mut entities {
            self.session.stamper().on_added(entity);
        }
        cancellable(cancel, async {
            for query in insert_queries(&entities) {
                self.execute(query).await?;
            }
            Ok::<_, ApplicationError>(())
        })
        .await?;
        Ok(entities)
    }

    async fn update(&self, mut entity: T, cancel: &CancellationToken) -> Result<(), ApplicationError> {
        self.session.stamper().on_modified(&mut entity);
        let query = update_query(&entity)?;
        match cancellable(cancel, self.execute(query)).await? {
            0 => Err(Self::not_found(&entity)),
            _ => Ok(()),
        }
    }

    async fn update_range(
        &self,
        entities: Vec<T>,
        cancel: &CancellationToken,
    ) -> Result<(), ApplicationError> {
        for entity in entities {
            self.update(entity, cancel).await?;
        }
        Ok(())
    }

    async fn delete(&self, entity: T, cancel: &CancellationToken) -> Result<(), ApplicationError> {
        let query = delete_query(slice::from_ref(&entity))?;
        match cancellable(cancel, self.execute(query)).await? {
            0 => Err(Self::not_found(&entity)),
            _ => Ok(()),
        }
    }

    async fn delete_range(
        &self,
        entities: Vec<T>,
        cancel: &CancellationToken,
    ) -> Result<(), ApplicationError> {
        if entities.is_empty() {
            return Ok(());
        }
        let query = delete_query(&entities)?;
        cancellable(cancel, self.execute(query)).await?;
        Ok(())
    }

    async fn save_entities(&self, cancel: &CancellationToken) -> Result<u64, ApplicationError> {
        cancellable(cancel, self.session.save()).await
    }
}

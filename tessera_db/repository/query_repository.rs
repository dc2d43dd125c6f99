use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use std::{marker::PhantomData, sync::Arc};
use tokio_util::sync::CancellationToken;

use tessera_app::{
    context::cancellable,
    repository::{Entity, QueryRepository},
    specification::Specification,
};
use tessera_core::{ApplicationError, DbError};

use crate::{
    repository::PgEntity,
    sql::{count_query, exists_query, select_query},
    uow::PgSession,
};

/// Reads go through the session's transaction when one is open, so a
/// command sees its own writes; otherwise straight to the pool.
pub struct PostgresQueryRepository<T> {
    session: Arc<PgSession>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: PgEntity> PostgresQueryRepository<T> {
    pub fn new(session: Arc<PgSession>) -> Self {
        Self {
            session,
            _entity: PhantomData,
        }
    }

    async fn fetch(
        &self,
        mut query: QueryBuilder<'static, Postgres>,
    ) -> Result<Vec<T>, ApplicationError> {
        let rows = {
            let mut tx_guard = self.session.reader().await;
            let q = query.build_query_as::<T::Row>();
            match tx_guard.as_mut() {
                Some(tx) => q.fetch_all(&mut **tx).await,
                None => q.fetch_all(self.session.pool()).await,
            }
            .map_err(|e| ApplicationError::Db(DbError::Database(e)))?
        };

        rows.into_iter()
            .map(|row| T::from_row(row).map_err(ApplicationError::from))
            .collect()
    }

    async fn fetch_count(
        &self,
        mut query: QueryBuilder<'static, Postgres>,
    ) -> Result<u64, ApplicationError> {
        let mut tx_guard = self.session.reader().await;
        let q = query.build_query_scalar::<i64>();
        let count = match tx_guard.as_mut() {
            Some(tx) => q.fetch_one(&mut **tx).await,
            None => q.fetch_one(self.session.pool()).await,
        }
        .map_err(|e| ApplicationError::Db(DbError::Database(e)))?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn fetch_exists(
        &self,
        mut query: QueryBuilder<'static, Postgres>,
    ) -> Result<bool, ApplicationError> {
        let mut tx_guard = self.session.reader().await;
        let q = query.build_query_scalar::<bool>();
        match tx_guard.as_mut() {
            Some(tx) => q.fetch_one(&mut **tx).await,
            None => q.fetch_one(self.session.pool()).await,
        }
        .map_err(|e| ApplicationError::Db(DbError::Database(e)))
    }
}

#[async_trait]
impl<T: PgEntity> QueryRepository<T> for PostgresQueryRepository<T> {
    async fn get_by_id(
        &self,
        id: &<T as Entity>::Id,
        cancel: &CancellationToken,
    ) -> Result<Option<T>, ApplicationError> {
        let query = select_query(&Specification::<T>::by_id(id.clone()).skip_take(0, 1))?;
        let found = cancellable(cancel, self.fetch(query)).await?;
        Ok(found.into_iter().next())
    }

    async fn list(
        &self,
        spec: &Specification<T>,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, ApplicationError> {
        let query = select_query(spec)?;
        cancellable(cancel, self.fetch(query)).await
    }

    async fn count(
        &self,
        spec: &Specification<T>,
        cancel: &CancellationToken,
    ) -> Result<u64, ApplicationError> {
        let query = count_query(spec)?;
        cancellable(cancel, self.fetch_count(query)).await
    }

    async fn any(
        &self,
        spec: &Specification<T>,
        cancel: &CancellationToken,
    ) -> Result<bool, ApplicationError> {
        let query = exists_query(spec)?;
        cancellable(cancel, self.fetch_exists(query)).await
    }
}

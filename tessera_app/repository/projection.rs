use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use tessera_core::ApplicationError;
use tessera_types::grid::PageRequest;

use crate::{
    repository::{Entity, QueryRepository},
    specification::Specification,
};

/// Maps an entity onto a read-model shape (DTO).
///
/// Any `Fn(S) -> D` is a projection, so `Summary::from` works as is.
pub trait Projection<S, D>: Send + Sync {
    fn project(&self, source: S) -> D;
}

impl<S, D, F> Projection<S, D> for F
where
    F: Fn(S) -> D + Send + Sync,
{
    fn project(&self, source: S) -> D {
        self(source)
    }
}

/// Projected variants of the [`QueryRepository`] reads.
#[async_trait]
pub trait QueryRepositoryExt<T: Entity>: QueryRepository<T> {
    async fn get_by_id_as<D, P>(
        &self,
        id: &T::Id,
        projection: &P,
        cancel: &CancellationToken,
    ) -> Result<Option<D>, ApplicationError>
    where
        D: Send + 'static,
        P: Projection<T, D>,
    {
        Ok(self
            .get_by_id(id, cancel)
            .await?
            .map(|e| projection.project(e)))
    }

    async fn list_as<D, P>(
        &self,
        spec: &Specification<T>,
        projection: &P,
        cancel: &CancellationToken,
    ) -> Result<Vec<D>, ApplicationError>
    where
        D: Send + 'static,
        P: Projection<T, D>,
    {
        Ok(self
            .list(spec, cancel)
            .await?
            .into_iter()
            .map(|e| projection.project(e))
            .collect())
    }

    async fn first_as<D, P>(
        &self,
        spec: &Specification<T>,
        projection: &P,
        cancel: &CancellationToken,
    ) -> Result<Option<D>, ApplicationError>
    where
        D: Send + 'static,
        P: Projection<T, D>,
    {
        Ok(self
            .first(spec, cancel)
            .await?
            .map(|e| projection.project(e)))
    }

    async fn page_as<D, P>(
        &self,
        spec: &Specification<T>,
        page: PageRequest,
        projection: &P,
        cancel: &CancellationToken,
    ) -> Result<(Vec<D>, u64), ApplicationError>
    where
        D: Send + 'static,
        P: Projection<T, D>,
    {
        let (items, total) = self.page(spec, page, cancel).await?;
        Ok((
            items.into_iter().map(|e| projection.project(e)).collect(),
            total,
        ))
    }
}

impl<T: Entity, R: QueryRepository<T> + ?Sized> QueryRepositoryExt<T> for R {}

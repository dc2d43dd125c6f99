mod projection;
mod registry;

pub use projection::*;
pub use registry::*;

use async_trait::async_trait;
use std::fmt;
use tokio_util::sync::CancellationToken;

use tessera_core::ApplicationError;
use tessera_types::grid::PageRequest;

use crate::{
    auditable::Auditable,
    specification::{FieldValue, Fields, Specification},
};

/// An aggregate stored by the repositories.
pub trait Entity: Fields + Clone + Send + Sync + 'static {
    type Id: Clone + PartialEq + fmt::Debug + fmt::Display + Into<FieldValue> + Send + Sync + 'static;

    /// Name used in errors and logs.
    const NAME: &'static str;
    const ID_FIELD: &'static str = "id";

    fn id(&self) -> &Self::Id;

    /// `Some(self)` for entities that carry creation and modification stamps.
    fn as_auditable_mut(&mut self) -> Option<&mut dyn Auditable> {
        None
    }
}

/// Write side. Changes are staged in the unit of work the repository was
/// created from and become durable on save (or on commit, inside an
/// explicit transaction).
#[async_trait]
pub trait CommandRepository<T: Entity>: Send + Sync {
    async fn add(&self, entity: T, cancel: &CancellationToken) -> Result<T, ApplicationError>;

    async fn add_range(
        &self,
        entities: Vec<T>,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, ApplicationError>;

    async fn update(&self, entity: T, cancel: &CancellationToken) -> Result<(), ApplicationError>;

    async fn update_range(
        &self,
        entities: Vec<T>,
        cancel: &CancellationToken,
    ) -> Result<(), ApplicationError>;

    async fn delete(&self, entity: T, cancel: &CancellationToken) -> Result<(), ApplicationError>;

    async fn delete_range(
        &self,
        entities: Vec<T>,
        cancel: &CancellationToken,
    ) -> Result<(), ApplicationError>;

    /// Flushes staged changes, returning how many rows were written.
    async fn save_entities(&self, cancel: &CancellationToken) -> Result<u64, ApplicationError>;
}

/// Read side, driven by [`Specification`]s.
#[async_trait]
pub trait QueryRepository<T: Entity>: Send + Sync {
    async fn get_by_id(
        &self,
        id: &T::Id,
        cancel: &CancellationToken,
    ) -> Result<Option<T>, ApplicationError>;

    async fn list(
        &self,
        spec: &Specification<T>,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, ApplicationError>;

    /// Counts what the specification's filters match; order and paging are ignored.
    async fn count(
        &self,
        spec: &Specification<T>,
        cancel: &CancellationToken,
    ) -> Result<u64, ApplicationError>;

    async fn list_all(&self, cancel: &CancellationToken) -> Result<Vec<T>, ApplicationError> {
        self.list(&Specification::new(), cancel).await
    }

    async fn count_all(&self, cancel: &CancellationToken) -> Result<u64, ApplicationError> {
        self.count(&Specification::new(), cancel).await
    }

    async fn first(
        &self,
        spec: &Specification<T>,
        cancel: &CancellationToken,
    ) -> Result<Option<T>, ApplicationError> {
        let skip = spec.skip().unwrap_or(0);
        let single = spec.clone().skip_take(skip, 1);
        Ok(self.list(&single, cancel).await?.into_iter().next())
    }

    async fn any(
        &self,
        spec: &Specification<T>,
        cancel: &CancellationToken,
    ) -> Result<bool, ApplicationError> {
        Ok(self.count(spec, cancel).await? > 0)
    }

    /// One page of `spec`, overriding its skip/take, plus the total count
    /// of what its filters match.
    async fn page(
        &self,
        spec: &Specification<T>,
        page: PageRequest,
        cancel: &CancellationToken,
    ) -> Result<(Vec<T>, u64), ApplicationError> {
        let total = self.count(spec, cancel).await?;
        let items = self.list(&spec.clone().paged(page), cancel).await?;
        Ok((items, total))
    }
}

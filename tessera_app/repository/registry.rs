use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::Arc,
};

use tessera_core::{AppError, ApplicationError};

use crate::repository::{CommandRepository, Entity, QueryRepository};

type Erased = Arc<dyn Any + Send + Sync>;

/// Repositories of one unit of work, keyed by entity type.
#[derive(Clone, Default)]
pub struct Repositories {
    commands: HashMap<TypeId, Erased>,
    queries: HashMap<TypeId, Erased>,
}

impl Repositories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_commands<T: Entity>(mut self, repository: Arc<dyn CommandRepository<T>>) -> Self {
        self.commands.insert(TypeId::of::<T>(), Arc::new(repository));
        self
    }

    pub fn with_queries<T: Entity>(mut self, repository: Arc<dyn QueryRepository<T>>) -> Self {
        self.queries.insert(TypeId::of::<T>(), Arc::new(repository));
        self
    }

    pub fn commands<T: Entity>(&self) -> Result<Arc<dyn CommandRepository<T>>, ApplicationError> {
        self.commands
            .get(&TypeId::of::<T>())
            .and_then(|entry| (**entry).downcast_ref::<Arc<dyn CommandRepository<T>>>())
            .cloned()
            .ok_or_else(|| AppError::MissingRepository(T::NAME).into())
    }

    pub fn queries<T: Entity>(&self) -> Result<Arc<dyn QueryRepository<T>>, ApplicationError> {
        self.queries
            .get(&TypeId::of::<T>())
            .and_then(|entry| (**entry).downcast_ref::<Arc<dyn QueryRepository<T>>>())
            .cloned()
            .ok_or_else(|| AppError::MissingRepository(T::NAME).into())
    }
}

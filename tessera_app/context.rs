use std::{future::Future, sync::Arc};

use tokio_util::sync::CancellationToken;

use tessera_core::ApplicationError;

use crate::{
    config::Config,
    repository::{CommandRepository, Entity, QueryRepository},
    services::{AnonymousUser, Clock, CurrentUser},
    uow::UnitOfWork,
};

/// Everything a handler and the behaviors get to see for one dispatch.
#[derive(Clone)]
pub struct RequestContext {
    pub uow: Arc<dyn UnitOfWork>,
    pub user: Arc<dyn CurrentUser>,
    pub cancellation: CancellationToken,
    pub config: Arc<Config>,
    pub clock: Arc<dyn Clock>,
}

impl RequestContext {
    pub fn commands<T: Entity>(&self) -> Result<Arc<dyn CommandRepository<T>>, ApplicationError> {
        self.uow.commands::<T>()
    }

    pub fn queries<T: Entity>(&self) -> Result<Arc<dyn QueryRepository<T>>, ApplicationError> {
        self.uow.queries::<T>()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// Caller-provided part of a dispatch: who is asking, and how to stop it.
#[derive(Clone)]
pub struct DispatchScope {
    pub user: Arc<dyn CurrentUser>,
    pub cancellation: CancellationToken,
}

impl DispatchScope {
    pub fn new(user: impl CurrentUser + 'static) -> Self {
        Self {
            user: Arc::new(user),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }
}

impl Default for DispatchScope {
    fn default() -> Self {
        Self::new(AnonymousUser)
    }
}

/// Runs `fut` unless `token` fires first.
pub async fn cancellable<T, F>(token: &CancellationToken, fut: F) -> Result<T, ApplicationError>
where
    F: Future<Output = Result<T, ApplicationError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ApplicationError::Cancelled),
        result = fut => result,
    }
}

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;

use tessera_core::ApplicationError;

use crate::{
    behaviors::{Next, PipelineBehavior},
    context::RequestContext,
    cqrs::{Reply, Request},
    dispatcher::HandlerRegistry,
};

/// Runs every validator registered for the request concurrently and stops
/// the chain when any of them reports an error.
pub struct ValidationBehavior {
    registry: Arc<HandlerRegistry>,
}

impl ValidationBehavior {
    pub(crate) fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl PipelineBehavior for ValidationBehavior {
    async fn handle<R: Request>(
        &self,
        request: R,
        ctx: &RequestContext,
        next: Next<'_, R>,
    ) -> Result<R::Response, ApplicationError> {
        let validators = self.registry.validators::<R>();
        if validators.is_empty() {
            return next.run(request).await;
        }

        tracing::debug!(validators = validators.len(), "Validating {}", R::name());

        // join_all keeps registration order, whatever order they finish in
        let results = join_all(validators.iter().map(|v| v.validate(&request, ctx))).await;
        let mut errors: Vec<_> = results
            .into_iter()
            .flat_map(|result| result.into_errors())
            .collect();

        if errors.is_empty() {
            return next.run(request).await;
        }

        tracing::warn!(
            errors = errors.len(),
            "Validation failed for {}",
            R::name()
        );

        if let Some(max) = ctx.config.max_validation_errors {
            errors.truncate(max);
        }

        R::Response::from_validation_errors(errors).map_err(ApplicationError::Validation)
    }
}

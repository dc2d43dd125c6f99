use async_trait::async_trait;

use tessera_core::ApplicationError;
use tessera_types::Error;

use crate::{
    behaviors::{Next, PipelineBehavior},
    context::RequestContext,
    cqrs::{Reply, Request, RequestKind},
};

/// Wraps commands in a transaction and saves what the handler staged.
///
/// Any error on the way (handler, save, commit, cancellation) rolls the
/// transaction back. Responses that can carry an outcome get an
/// `OperationFailed` failure with the error message in its details; other
/// responses get the error back.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionBehavior;

#[async_trait]
impl PipelineBehavior for TransactionBehavior {
    async fn handle<R: Request>(
        &self,
        request: R,
        ctx: &RequestContext,
        next: Next<'_, R>,
    ) -> Result<R::Response, ApplicationError> {
        if R::KIND != RequestKind::Command {
            return next.run(request).await;
        }

        // a transaction opened further out is committed by whoever opened it
        let owned = !ctx.uow.has_active_transaction();
        tracing::info!("Beginning transaction for {}", R::name());

        match run_in_transaction(request, ctx, next, owned).await {
            Ok(response) => Ok(response),
            Err(err) => {
                tracing::error!(error = %err, "Error during transaction for {}", R::name());

                if owned && ctx.uow.has_active_transaction() {
                    if let Err(rollback) = ctx.uow.rollback_transaction().await {
                        tracing::error!(error = %rollback, "Rollback failed for {}", R::name());
                    }
                }

                match R::Response::from_error(Error::OPERATION_FAILED.with_details(err.to_string())) {
                    Some(failure) => Ok(failure),
                    None => Err(err),
                }
            }
        }
    }
}

async fn run_in_transaction<R: Request>(
    request: R,
    ctx: &RequestContext,
    next: Next<'_, R>,
    owned: bool,
) -> Result<R::Response, ApplicationError> {
    let handle = ctx.uow.begin_transaction(&ctx.cancellation).await?;

    let response = next.run(request).await?;

    if ctx.is_cancelled() {
        return Err(ApplicationError::Cancelled);
    }

    let written = ctx.uow.save_changes(&ctx.cancellation).await?;
    if owned {
        ctx.uow
            .commit_transaction(handle, &ctx.cancellation)
            .await?;
    }

    tracing::info!(written, "Committed transaction for {}", R::name());
    Ok(response)
}

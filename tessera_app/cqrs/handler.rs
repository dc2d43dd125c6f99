use async_trait::async_trait;
use tessera_core::ApplicationError;

use crate::{context::RequestContext, cqrs::Request};

/// Terminal step of the pipeline: exactly one handler per request type.
///
/// Handlers use the unit of work from the context but must NOT commit or
/// roll back; that's the job of the transaction behavior.
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync {
    async fn handle(
        &self,
        request: R,
        ctx: &RequestContext,
    ) -> Result<R::Response, ApplicationError>;
}

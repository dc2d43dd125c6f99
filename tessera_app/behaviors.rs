//! The behavior chain wrapped around every handler invocation.
//!
//! The order is fixed: logging, validation, performance, audit,
//! transaction, then the handler. Each behavior gets the request and a
//! [`Next`] continuation for the rest of the chain.

mod audit;
mod logging;
mod payload;
mod performance;
mod transaction;
mod validation;

pub use audit::AuditBehavior;
pub use logging::LoggingBehavior;
pub use payload::audit_payload;
pub use performance::{LONG_RUNNING_THRESHOLD, PerformanceBehavior};
pub use transaction::TransactionBehavior;
pub use validation::ValidationBehavior;

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;

use tessera_core::ApplicationError;

use crate::{
    context::RequestContext,
    cqrs::{Request, RequestHandler},
    dispatcher::HandlerRegistry,
    services::AuditSink,
};

type Continuation<'a, R> = Box<
    dyn FnOnce(R) -> BoxFuture<'a, Result<<R as Request>::Response, ApplicationError>> + Send + 'a,
>;

/// The remainder of the chain, consumed by calling [`Next::run`].
pub struct Next<'a, R: Request> {
    continuation: Continuation<'a, R>,
}

impl<'a, R: Request> Next<'a, R> {
    pub fn new<F>(continuation: F) -> Self
    where
        F: FnOnce(R) -> BoxFuture<'a, Result<R::Response, ApplicationError>> + Send + 'a,
    {
        Self {
            continuation: Box::new(continuation),
        }
    }

    pub async fn run(self, request: R) -> Result<R::Response, ApplicationError> {
        (self.continuation)(request).await
    }
}

#[async_trait]
pub trait PipelineBehavior: Send + Sync {
    async fn handle<R: Request>(
        &self,
        request: R,
        ctx: &RequestContext,
        next: Next<'_, R>,
    ) -> Result<R::Response, ApplicationError>;
}

/// The assembled chain.
pub struct Pipeline {
    logging: LoggingBehavior,
    validation: ValidationBehavior,
    performance: PerformanceBehavior,
    audit: AuditBehavior,
    transaction: TransactionBehavior,
}

impl Pipeline {
    pub(crate) fn new(registry: Arc<HandlerRegistry>, audit_sink: Arc<dyn AuditSink>) -> Self {
        Self {
            logging: LoggingBehavior,
            validation: ValidationBehavior::new(registry),
            performance: PerformanceBehavior,
            audit: AuditBehavior::new(audit_sink),
            transaction: TransactionBehavior,
        }
    }

    pub(crate) async fn run<'a, R: Request>(
        &'a self,
        request: R,
        ctx: &'a RequestContext,
        handler: &'a dyn RequestHandler<R>,
    ) -> Result<R::Response, ApplicationError> {
        let terminal = Next::new(move |req| handler.handle(req, ctx));
        let transaction = Next::new(move |req| self.transaction.handle(req, ctx, terminal));
        let audit = Next::new(move |req| self.audit.handle(req, ctx, transaction));
        let performance = Next::new(move |req| self.performance.handle(req, ctx, audit));
        let validation = Next::new(move |req| self.validation.handle(req, ctx, performance));

        self.logging.handle(request, ctx, validation).await
    }
}

use async_trait::async_trait;
use std::sync::Arc;
use tracing::Instrument;

use tessera_core::ApplicationError;
use tessera_types::audit::AuditRecord;

use crate::{
    behaviors::{Next, PipelineBehavior, audit_payload},
    context::RequestContext,
    cqrs::{Reply, Request, RequestKind},
    services::AuditSink,
};

/// Records every command execution, successful or not, to the audit sink.
///
/// The write runs on a detached task: the response never waits for it and
/// a failing sink is only logged. There is no retry and no ordering
/// guarantee relative to the request completing.
pub struct AuditBehavior {
    sink: Arc<dyn AuditSink>,
}

impl AuditBehavior {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl PipelineBehavior for AuditBehavior {
    async fn handle<R: Request>(
        &self,
        request: R,
        ctx: &RequestContext,
        next: Next<'_, R>,
    ) -> Result<R::Response, ApplicationError> {
        if R::KIND != RequestKind::Command || !ctx.config.audit_enabled {
            return next.run(request).await;
        }

        // the request moves down the chain, so capture what we need first
        let data = audit_payload(
            &request,
            ctx.config.audit_max_depth,
            &ctx.config.audit_redacted_fields,
        );
        let entity_id = request.entity_id();

        let result = next.run(request).await;

        let mut record = AuditRecord::new(R::name(), R::entity_type(), ctx.clock.now_utc());
        record.entity_id = entity_id;
        record.user_id = ctx.user.user_id();
        record.user_name = ctx.user.user_name();
        record.ip_address = ctx.user.ip_address();
        record.data = Some(data);

        let record = match &result {
            Ok(response) => match response.failure_message() {
                Some(message) => record.failed(message),
                None => record,
            },
            Err(err) => record.failed(err.to_string()),
        };

        let sink = self.sink.clone();
        tokio::spawn(
            async move {
                if let Err(err) = sink.record(record).await {
                    tracing::error!(error = %err, "Failed to write audit record");
                }
            }
            .in_current_span(),
        );

        result
    }
}

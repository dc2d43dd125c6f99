use async_trait::async_trait;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use tessera_core::ApplicationError;

use crate::{
    behaviors::{Next, PipelineBehavior},
    context::RequestContext,
    cqrs::{Reply, Request},
};

/// Opens a `request` span with a fresh correlation id and logs how each
/// request ended.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingBehavior;

#[async_trait]
impl PipelineBehavior for LoggingBehavior {
    async fn handle<R: Request>(
        &self,
        request: R,
        ctx: &RequestContext,
        next: Next<'_, R>,
    ) -> Result<R::Response, ApplicationError> {
        let request_id = Uuid::new_v4();
        let user = ctx
            .user
            .user_name()
            .unwrap_or_else(|| "anonymous".to_string());
        let span = tracing::info_span!(
            "request",
            %request_id,
            request = R::name(),
            kind = R::KIND.as_str(),
            %user,
        );

        async move {
            tracing::info!("Handling {}", R::name());
            let started = Instant::now();

            let result = next.run(request).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match &result {
                Ok(response) => match response.failure_message() {
                    Some(error) => tracing::warn!(
                        elapsed_ms,
                        %error,
                        "Completed {} with a failure",
                        R::name()
                    ),
                    None => tracing::info!(elapsed_ms, "Completed {}", R::name()),
                },
                Err(err) => tracing::error!(
                    elapsed_ms,
                    error = %err,
                    "Error handling {}",
                    R::name()
                ),
            }

            result
        }
        .instrument(span)
        .await
    }
}

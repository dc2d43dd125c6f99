use async_trait::async_trait;
use std::time::{Duration, Instant};

use tessera_core::ApplicationError;

use crate::{
    behaviors::{Next, PipelineBehavior},
    context::RequestContext,
    cqrs::Request,
};

pub const LONG_RUNNING_THRESHOLD: Duration = Duration::from_millis(500);

/// Flags slow requests. Nothing is ever aborted here.
///
/// The payload is left out of the warning; audited commands already carry
/// a redacted copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceBehavior;

#[async_trait]
impl PipelineBehavior for PerformanceBehavior {
    async fn handle<R: Request>(
        &self,
        request: R,
        _ctx: &RequestContext,
        next: Next<'_, R>,
    ) -> Result<R::Response, ApplicationError> {
        let started = Instant::now();
        let result = next.run(request).await;
        let elapsed = started.elapsed();

        if elapsed > LONG_RUNNING_THRESHOLD {
            tracing::warn!(
                request = R::name(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Long running request"
            );
        }

        result
    }
}

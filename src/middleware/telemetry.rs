//! Tracing span and timing for every invocation.

use super::{Middleware, Next, Options};
use crate::action::{ActionContext, ActionResult};
use crate::errors::ActionError;
use async_trait::async_trait;
use std::time::Instant;
use tracing::Instrument;

/// Opens an `action` span named after the command path.
///
/// Nested steps get their own span inside the parent's, so `up` traces show
/// `package`, `provision` and `deploy` as children.
#[derive(Debug, Default)]
pub struct TelemetryMiddleware;

#[async_trait]
impl Middleware for TelemetryMiddleware {
    fn name(&self) -> &'static str {
        "telemetry"
    }

    async fn run(
        &self,
        ctx: &ActionContext,
        options: &Options,
        next: Next<'_>,
    ) -> Result<ActionResult, ActionError> {
        let span = tracing::info_span!(
            "action",
            command = options.command_path(),
            child = options.is_child_action(),
            invocation_id = %ctx.invocation_id(),
        );

        async move {
            let start = Instant::now();
            tracing::debug!("action started");
            let result = next.run(ctx, options).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(_) => tracing::debug!(elapsed_ms, "action completed"),
                Err(err) if err.is_cancelled() => {
                    tracing::info!(elapsed_ms, "action cancelled")
                }
                Err(err) => tracing::warn!(elapsed_ms, error = %err, "action failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

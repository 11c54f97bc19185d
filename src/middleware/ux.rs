//! Result summary for top-level commands.

use super::{Middleware, Next, Options};
use crate::action::{ActionContext, ActionResult};
use crate::errors::ActionError;
use crate::ui::Console;
use crate::ui::format::{dim, elapsed, success};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Prints `SUCCESS: <header>` with the elapsed time and the follow-up text.
///
/// Child invocations are silent; their parent reports the overall outcome.
pub struct UxMiddleware {
    console: Arc<dyn Console>,
}

impl UxMiddleware {
    pub fn new(console: Arc<dyn Console>) -> Self {
        Self { console }
    }
}

#[async_trait]
impl Middleware for UxMiddleware {
    fn name(&self) -> &'static str {
        "ux"
    }

    async fn run(
        &self,
        ctx: &ActionContext,
        options: &Options,
        next: Next<'_>,
    ) -> Result<ActionResult, ActionError> {
        let start = Instant::now();
        let result = next.run(ctx, options).await;
        if options.is_child_action() {
            return result;
        }

        if let Ok(ActionResult {
            message: Some(message),
            ..
        }) = &result
        {
            self.console.message(&format!(
                "{} {}",
                success(format!("SUCCESS: {}", message.header)),
                dim(format!("({})", elapsed(start.elapsed())))
            ));
            if let Some(follow_up) = &message.follow_up {
                self.console.message(follow_up);
            }
        }
        result
    }
}

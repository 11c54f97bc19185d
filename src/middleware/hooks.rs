//! Project hooks around hookable commands.

use super::{Middleware, Next, Options};
use crate::action::{ActionContext, ActionResult};
use crate::container::Container;
use crate::environment::Environment;
use crate::errors::ActionError;
use crate::hooks::{HookContext, HookEvent, HookExecutor, HooksConfig};
use crate::project::ProjectConfig;
use crate::ui::format::{dim, warning};
use crate::ui::{Console, icons};
use async_trait::async_trait;
use std::sync::{Arc, Weak};

/// Runs `pre<command>` hooks before an invocation and `post<command>` hooks
/// after it succeeds.
///
/// The project and environment are resolved from the container only when
/// the command has hooks, so commands outside a project are unaffected.
pub struct HooksMiddleware {
    container: Weak<Container>,
    console: Arc<dyn Console>,
}

impl HooksMiddleware {
    /// Holds the container weakly; the container owns the runner that owns
    /// this middleware.
    pub fn new(container: &Arc<Container>, console: Arc<dyn Console>) -> Self {
        Self {
            container: Arc::downgrade(container),
            console,
        }
    }

    async fn run_hooks(
        &self,
        executor: &HookExecutor,
        hooks: &HooksConfig,
        event: &HookEvent,
        options: &Options,
        env: &Environment,
    ) -> Result<(), ActionError> {
        for hook in hooks.hooks_for(event) {
            self.console.message(&format!(
                "{}Running {} hook: {}",
                icons::HOOK,
                event,
                dim(&hook.command)
            ));
            let context = HookContext::new(event, options.command_path(), options.is_child_action())
                .with_environment(env.name())
                .with_args(options.args());

            let failure = match executor.execute(hook, &context, &env.values()).await {
                Ok(outcome) => {
                    let stdout = outcome.stdout.trim_end();
                    if !stdout.is_empty() {
                        self.console.message(stdout);
                    }
                    (!outcome.success()).then(|| outcome.failure_reason())
                }
                Err(e) => Some(format!("{:#}", e)),
            };

            if let Some(reason) = failure {
                if !hook.continue_on_error {
                    return Err(ActionError::Hook {
                        event: event.name(),
                        message: reason,
                    });
                }
                tracing::warn!(event = %event, reason = %reason, "hook failed, continuing");
                self.console.warn(&warning(format!(
                    "WARNING: {} hook failed: {}",
                    event, reason
                )));
            }
        }
        Ok(())
    }
}

fn resolve_failure(err: crate::errors::ContainerError) -> ActionError {
    ActionError::Failed(anyhow::Error::new(err))
}

#[async_trait]
impl Middleware for HooksMiddleware {
    fn name(&self) -> &'static str {
        "hooks"
    }

    async fn run(
        &self,
        ctx: &ActionContext,
        options: &Options,
        next: Next<'_>,
    ) -> Result<ActionResult, ActionError> {
        let pre = HookEvent::pre(options.name());
        let post = HookEvent::post(options.name());
        if !pre.is_hookable() {
            return next.run(ctx, options).await;
        }
        let Some(container) = self.container.upgrade() else {
            return next.run(ctx, options).await;
        };

        let project = container
            .resolve::<Arc<ProjectConfig>>()
            .map_err(resolve_failure)?;
        let hooks = project.hooks();
        if !hooks.has_hooks_for(&pre) && !hooks.has_hooks_for(&post) {
            return next.run(ctx, options).await;
        }
        let env = container.resolve::<Environment>().map_err(resolve_failure)?;
        let executor = HookExecutor::new(&project.root);

        self.run_hooks(&executor, &hooks, &pre, options, &env).await?;
        let result = next.run(ctx, options).await?;
        self.run_hooks(&executor, &hooks, &post, options, &env).await?;
        Ok(result)
    }
}

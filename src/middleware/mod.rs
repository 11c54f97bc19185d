//! Middleware pipeline wrapping every action invocation.
//!
//! The runner owns an ordered chain of [`Middleware`]. Each invocation walks
//! the chain outermost-first; every middleware decides what to do before and
//! after calling [`Next::run`], and the innermost link runs the action.
//!
//! There is one entry point, [`MiddlewareRunner::run_action`]. Nested steps
//! go through [`MiddlewareRunner::run_child_action`], which only flags the
//! [`Options`] as a child invocation before taking the same path, so hooks,
//! telemetry and output scoping behave identically at any depth.
//!
//! # Built-in middleware
//!
//! - [`TelemetryMiddleware`] - tracing span per invocation, timing, failure events
//! - [`UxMiddleware`] - prints the result summary of top-level actions
//! - [`HooksMiddleware`] - runs `pre<command>`/`post<command>` project hooks

pub mod hooks;
pub mod telemetry;
pub mod ux;

pub use hooks::HooksMiddleware;
pub use telemetry::TelemetryMiddleware;
pub use ux::UxMiddleware;

use crate::action::{Action, ActionContext, ActionResult};
use crate::errors::ActionError;
use async_trait::async_trait;
use std::sync::Arc;

/// Identity of one invocation.
///
/// Built once per invocation and consumed by the runner; there is no way to
/// change it after construction apart from turning it into a child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    command_path: String,
    args: Vec<String>,
    is_child_action: bool,
}

impl Options {
    /// Options for the command at `command_path` (e.g. `"provision"`, `"env new"`).
    pub fn new(command_path: impl Into<String>) -> Self {
        Self {
            command_path: command_path.into(),
            args: Vec::new(),
            is_child_action: false,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn command_path(&self) -> &str {
        &self.command_path
    }

    /// Last segment of the command path, e.g. `"new"` for `"env new"`.
    pub fn name(&self) -> &str {
        self.command_path
            .rsplit(' ')
            .next()
            .unwrap_or(&self.command_path)
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn is_child_action(&self) -> bool {
        self.is_child_action
    }

    fn into_child(mut self) -> Self {
        self.is_child_action = true;
        self
    }
}

/// Cross-cutting behaviour around an action invocation.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    async fn run(
        &self,
        ctx: &ActionContext,
        options: &Options,
        next: Next<'_>,
    ) -> Result<ActionResult, ActionError>;
}

/// The remainder of the chain, ending in the action itself.
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    action: &'a mut dyn Action,
}

impl<'a> Next<'a> {
    fn new(chain: &'a [Arc<dyn Middleware>], action: &'a mut dyn Action) -> Self {
        Self { chain, action }
    }

    /// Continue down the chain.
    pub async fn run(
        self,
        ctx: &ActionContext,
        options: &Options,
    ) -> Result<ActionResult, ActionError> {
        match self.chain.split_first() {
            Some((current, rest)) => {
                tracing::trace!(middleware = current.name(), "entering middleware");
                current.run(ctx, options, Next::new(rest, self.action)).await
            }
            None => self.action.run(ctx).await,
        }
    }
}

/// Executes actions through the middleware chain.
#[derive(Default)]
pub struct MiddlewareRunner {
    chain: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware. The first one added is the outermost.
    pub fn with(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.chain.push(middleware);
        self
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Run `action` through the full chain.
    ///
    /// Refuses to start once `ctx` is cancelled, and stops waiting on the
    /// chain as soon as cancellation is observed. The action's own error is
    /// returned as-is.
    pub async fn run_action(
        &self,
        ctx: &ActionContext,
        options: Options,
        action: &mut dyn Action,
    ) -> Result<ActionResult, ActionError> {
        ctx.check_cancelled()?;

        let next = Next::new(&self.chain, action);
        tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                tracing::debug!(command = options.command_path(), "invocation cancelled");
                Err(ActionError::Cancelled)
            }
            result = next.run(ctx, &options) => result,
        }
    }

    /// Run `action` as a step of another action.
    pub async fn run_child_action(
        &self,
        ctx: &ActionContext,
        options: Options,
        action: &mut dyn Action,
    ) -> Result<ActionResult, ActionError> {
        self.run_action(ctx, options.into_child(), action).await
    }
}

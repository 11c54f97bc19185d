//! The unit of orchestrated work.
//!
//! An [`Action`] has a single async entry point. It is invoked through the
//! [`MiddlewareRunner`](crate::middleware::MiddlewareRunner), either by the
//! top-level dispatcher or by a composite action such as `up`; the action
//! itself cannot tell the difference.

use crate::errors::ActionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Human-readable summary of a completed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultMessage {
    pub header: String,
    #[serde(default)]
    pub follow_up: Option<String>,
}

/// Success payload of one action invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    #[serde(default)]
    pub message: Option<ResultMessage>,
    /// Opaque to the orchestrator; actions put whatever their callers need here.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl ActionResult {
    /// A result carrying only a header line.
    pub fn with_header(header: impl Into<String>) -> Self {
        Self {
            message: Some(ResultMessage {
                header: header.into(),
                follow_up: None,
            }),
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_follow_up(mut self, follow_up: impl Into<String>) -> Self {
        if let Some(message) = self.message.as_mut() {
            message.follow_up = Some(follow_up.into());
        }
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Per-invocation context threaded through every call.
///
/// Carries the cancellation signal and a correlation id. Cloning shares the
/// same token, so cancelling the root cancels every nested step.
#[derive(Debug, Clone)]
pub struct ActionContext {
    cancel: CancellationToken,
    invocation_id: Uuid,
}

impl ActionContext {
    pub fn new() -> Self {
        Self::with_cancellation(CancellationToken::new())
    }

    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            invocation_id: Uuid::new_v4(),
        }
    }

    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the invocation has been cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns `Err(Cancelled)` if cancellation was requested.
    pub fn check_cancelled(&self) -> Result<(), ActionError> {
        if self.is_cancelled() {
            Err(ActionError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for ActionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A unit of work producing a result or a failure.
#[async_trait]
pub trait Action: Send {
    async fn run(&mut self, ctx: &ActionContext) -> Result<ActionResult, ActionError>;
}

//! Project lifecycle hooks.
//!
//! Hooks are shell commands declared in `shipyard.toml` that run before or
//! after a hookable command (`package`, `provision`, `deploy`, `up`). They are
//! fired by [`HooksMiddleware`](crate::middleware::HooksMiddleware), so a
//! `predeploy` hook runs both for `shipyard deploy` and for the deploy step of
//! `shipyard up`.
//!
//! # Hook contract
//!
//! - Runs as `sh -c <command>` from the project directory (or `working_dir`)
//! - Receives a JSON [`HookContext`] on stdin
//! - Sees every environment value as a process variable
//! - Exit code 0 continues; anything else aborts the command, unless the
//!   hook sets `continue_on_error`, in which case a warning is printed
//!
//! Post hooks only run when the command succeeded.

pub mod config;
pub mod executor;
pub mod types;

pub use config::{HookDefinition, HooksConfig};
pub use executor::HookExecutor;
pub use types::{HookContext, HookEvent, HookOutcome, HookPhase};

//! Hook definitions as declared in `shipyard.toml`.
//!
//! ```toml
//! [[hooks]]
//! event = "preprovision"
//! command = "./scripts/check-quota.sh"
//! timeout_secs = 60
//!
//! [[hooks]]
//! event = "postdeploy"
//! command = "./scripts/smoke-test.sh"
//! continue_on_error = true
//! ```

use super::types::HookEvent;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single hook definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookDefinition {
    /// Event name such as `predeploy` or `postup`
    pub event: String,

    /// Shell command, run with `sh -c` from the project directory
    pub command: String,

    /// Working directory, relative to the project directory
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Report a failure as a warning instead of aborting the command
    #[serde(default)]
    pub continue_on_error: bool,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub description: Option<String>,
}

fn default_timeout() -> u64 {
    300
}

fn default_enabled() -> bool {
    true
}

impl HookDefinition {
    pub fn new(event: &HookEvent, command: impl Into<String>) -> Self {
        Self {
            event: event.name(),
            command: command.into(),
            working_dir: None,
            timeout_secs: default_timeout(),
            continue_on_error: false,
            enabled: true,
            description: None,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn continue_on_error(mut self) -> Self {
        self.continue_on_error = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn matches(&self, event: &HookEvent) -> bool {
        self.event.eq_ignore_ascii_case(&event.name())
    }

    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Err(e) = self.event.parse::<HookEvent>() {
            warnings.push(e.to_string());
        }
        if self.command.trim().is_empty() {
            warnings.push(format!("Hook for event '{}' has an empty command", self.event));
        }
        if self.timeout_secs == 0 {
            warnings.push(format!(
                "Hook for event '{}' has timeout of 0 seconds",
                self.event
            ));
        }
        warnings
    }
}

/// All hooks of a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HooksConfig {
    #[serde(default)]
    pub hooks: Vec<HookDefinition>,
}

impl HooksConfig {
    pub fn new(hooks: Vec<HookDefinition>) -> Self {
        Self { hooks }
    }

    /// Enabled hooks for `event`, in declaration order.
    pub fn hooks_for(&self, event: &HookEvent) -> Vec<&HookDefinition> {
        self.hooks
            .iter()
            .filter(|h| h.enabled && h.matches(event))
            .collect()
    }

    pub fn has_hooks_for(&self, event: &HookEvent) -> bool {
        self.hooks.iter().any(|h| h.enabled && h.matches(event))
    }

    pub fn enabled_hook_count(&self) -> usize {
        self.hooks.iter().filter(|h| h.enabled).count()
    }

    pub fn validate(&self) -> Vec<String> {
        self.hooks.iter().flat_map(|h| h.validate()).collect()
    }
}

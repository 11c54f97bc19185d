//! Hook event and context types.
//!
//! - `HookPhase`: whether a hook runs before or after its command
//! - `HookEvent`: a phase bound to a hookable command (`predeploy`, `postup`)
//! - `HookContext`: JSON document written to the hook's stdin

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Commands that fire lifecycle hooks.
pub const HOOKABLE_COMMANDS: &[&str] = &["package", "provision", "deploy", "up"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPhase {
    Pre,
    Post,
}

impl HookPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookPhase::Pre => "pre",
            HookPhase::Post => "post",
        }
    }
}

/// A lifecycle point such as `preprovision`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HookEvent {
    pub phase: HookPhase,
    pub command: String,
}

impl HookEvent {
    pub fn new(phase: HookPhase, command: impl Into<String>) -> Self {
        Self {
            phase,
            command: command.into(),
        }
    }

    pub fn pre(command: impl Into<String>) -> Self {
        Self::new(HookPhase::Pre, command)
    }

    pub fn post(command: impl Into<String>) -> Self {
        Self::new(HookPhase::Post, command)
    }

    /// The event name as written in `shipyard.toml`.
    pub fn name(&self) -> String {
        format!("{}{}", self.phase.as_str(), self.command)
    }

    pub fn is_hookable(&self) -> bool {
        HOOKABLE_COMMANDS.contains(&self.command.as_str())
    }
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for HookEvent {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        let event = if let Some(command) = lower.strip_prefix("pre") {
            HookEvent::pre(command)
        } else if let Some(command) = lower.strip_prefix("post") {
            HookEvent::post(command)
        } else {
            anyhow::bail!(
                "Invalid hook event '{}'. Expected pre<command> or post<command>",
                s
            )
        };
        if !event.is_hookable() {
            anyhow::bail!(
                "Invalid hook event '{}'. Hookable commands: {}",
                s,
                HOOKABLE_COMMANDS.join(", ")
            );
        }
        Ok(event)
    }
}

/// Context handed to a hook on stdin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookContext {
    /// Event name, e.g. `predeploy`
    pub event: String,
    /// Full command path of the invocation that fired the hook
    pub command_path: String,
    /// Whether the command runs as a step of another command
    pub is_child_action: bool,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl HookContext {
    pub fn new(event: &HookEvent, command_path: &str, is_child_action: bool) -> Self {
        Self {
            event: event.name(),
            command_path: command_path.to_string(),
            is_child_action,
            environment: None,
            args: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_environment(mut self, name: impl Into<String>) -> Self {
        self.environment = Some(name.into());
        self
    }

    pub fn with_args(mut self, args: &[String]) -> Self {
        self.args = args.to_vec();
        self
    }
}

/// What a finished hook process reported.
#[derive(Debug, Clone)]
pub struct HookOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl HookOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Best single-line explanation of a failure.
    pub fn failure_reason(&self) -> String {
        let detail = if !self.stderr.trim().is_empty() {
            self.stderr.trim()
        } else {
            self.stdout.trim()
        };
        if detail.is_empty() {
            format!("exit code {}", self.exit_code)
        } else {
            format!("exit code {}: {}", self.exit_code, detail)
        }
    }
}

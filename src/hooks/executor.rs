//! Hook execution engine.
//!
//! Each hook runs as `sh -c <command>`:
//! - the [`HookContext`] is written as JSON to stdin
//! - environment values are exported, plus `SHIPYARD_HOOK_EVENT`
//! - exit code 0 is success, anything else is a failure
//! - exceeding `timeout_secs` kills the process and fails the hook

use super::config::HookDefinition;
use super::types::{HookContext, HookOutcome};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

pub struct HookExecutor {
    /// Project directory (default working directory)
    project_dir: PathBuf,
}

impl HookExecutor {
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            project_dir: project_dir.as_ref().to_path_buf(),
        }
    }

    fn working_dir(&self, hook: &HookDefinition) -> PathBuf {
        match &hook.working_dir {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => self.project_dir.join(p),
            None => self.project_dir.clone(),
        }
    }

    /// Run one hook to completion.
    ///
    /// Spawn and I/O problems are returned as errors; a non-zero exit is a
    /// normal [`HookOutcome`] for the caller to judge.
    pub async fn execute(
        &self,
        hook: &HookDefinition,
        context: &HookContext,
        env: &BTreeMap<String, String>,
    ) -> Result<HookOutcome> {
        let context_json =
            serde_json::to_string(context).context("Failed to serialize hook context to JSON")?;

        tracing::debug!(
            event = %hook.event,
            command = %hook.command,
            timeout_secs = hook.timeout_secs,
            "executing hook"
        );

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&hook.command)
            .current_dir(self.working_dir(hook))
            .envs(env)
            .env("SHIPYARD_HOOK_EVENT", &context.event)
            .env("SHIPYARD_COMMAND", &context.command_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn hook command: {}", hook.command))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A hook that never reads stdin closes the pipe early; that is not a failure.
            if let Err(e) = stdin.write_all(context_json.as_bytes()).await
                && e.kind() != std::io::ErrorKind::BrokenPipe
            {
                return Err(e).context("Failed to write context to hook stdin");
            }
        }

        let output = match timeout(
            Duration::from_secs(hook.timeout_secs),
            child.wait_with_output(),
        )
        .await
        {
            Ok(result) => result.context("Failed to wait for hook command")?,
            Err(_) => anyhow::bail!("timed out after {} seconds", hook.timeout_secs),
        };

        let outcome = HookOutcome {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        tracing::debug!(event = %hook.event, exit_code = outcome.exit_code, "hook finished");
        Ok(outcome)
    }
}

//! `shipyard provision`: create or update the project's infrastructure.

use crate::action::{Action, ActionContext, ActionResult};
use crate::container::{Container, FromContainer};
use crate::environment::Environment;
use crate::errors::{ActionError, ContainerError};
use crate::flags::{BindFlags, EnvFlag};
use crate::lifecycle::Provisioner;
use crate::ui::format::{deprecated_flag, dim, highlight};
use crate::ui::{Console, icons};
use async_trait::async_trait;
use clap::Args;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Args)]
pub struct ProvisionArgs {
    /// Deprecated: has no effect
    #[arg(long, hide = true)]
    pub no_progress: bool,

    /// Show the changes provisioning would make without applying them
    #[arg(long)]
    pub preview: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ProvisionFlags {
    /// Accepted for compatibility only
    pub no_progress: bool,
    pub preview: bool,
    env: EnvFlag,
}

impl BindFlags for ProvisionFlags {
    type Args = ProvisionArgs;

    fn bind_non_common(&mut self, args: &ProvisionArgs) {
        self.no_progress = args.no_progress;
        self.preview = args.preview;
    }

    fn set_common(&mut self, env: &EnvFlag) {
        self.env = env.clone();
    }

    fn env_flag(&self) -> &EnvFlag {
        &self.env
    }
}

pub struct ProvisionAction {
    flags: ProvisionFlags,
    env: Environment,
    provisioner: Arc<dyn Provisioner>,
    console: Arc<dyn Console>,
}

impl ProvisionAction {
    pub fn new(
        flags: ProvisionFlags,
        env: Environment,
        provisioner: Arc<dyn Provisioner>,
        console: Arc<dyn Console>,
    ) -> Self {
        Self {
            flags,
            env,
            provisioner,
            console,
        }
    }

    pub fn flags(&self) -> &ProvisionFlags {
        &self.flags
    }

    pub fn set_flags(&mut self, flags: ProvisionFlags) {
        self.flags = flags;
    }
}

impl FromContainer for ProvisionAction {
    fn from_container(container: &Arc<Container>) -> Result<Self, ContainerError> {
        Ok(Self::new(
            container.resolve()?,
            container.resolve()?,
            container.resolve()?,
            container.resolve()?,
        ))
    }
}

#[async_trait]
impl Action for ProvisionAction {
    async fn run(&mut self, ctx: &ActionContext) -> Result<ActionResult, ActionError> {
        if self.flags.no_progress {
            self.console.warn(&deprecated_flag("--no-progress"));
        }
        ctx.check_cancelled()?;

        let verb = if self.flags.preview {
            "Previewing"
        } else {
            "Provisioning"
        };
        self.console.message(&format!(
            "{}{} infrastructure for environment {}",
            icons::CLOUD,
            verb,
            highlight(self.env.name())
        ));

        let output = self
            .provisioner
            .provision(&self.env, self.flags.preview)
            .await?;

        for (key, value) in &output.outputs {
            self.console.message(&format!("  {} = {}", key, dim(value)));
        }

        let header = match (output.applied, output.preview) {
            (false, _) => "There is no infrastructure to provision".to_string(),
            (true, true) => "Generated provisioning preview".to_string(),
            (true, false) => format!(
                "Provisioned infrastructure for environment {}",
                highlight(self.env.name())
            ),
        };
        let payload = serde_json::to_value(&output).map_err(anyhow::Error::from)?;
        Ok(ActionResult::with_header(header).with_payload(payload))
    }
}

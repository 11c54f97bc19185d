//! `shipyard deploy`: ship packaged services to their targets.

use super::resolve_targets;
use crate::action::{Action, ActionContext, ActionResult};
use crate::container::{Container, FromContainer};
use crate::environment::Environment;
use crate::errors::{ActionError, ContainerError};
use crate::flags::{BindFlags, EnvFlag};
use crate::lifecycle::Deployer;
use crate::project::ProjectConfig;
use crate::ui::format::{deprecated_flag, dim, highlight};
use crate::ui::{Console, icons};
use async_trait::async_trait;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Args)]
pub struct DeployArgs {
    /// Deploy every service
    #[arg(long)]
    pub all: bool,

    /// Deprecated: pass the service name as a positional argument instead
    #[arg(id = "service_flag", long = "service", hide = true, value_name = "SERVICE")]
    pub service: Option<String>,

    /// Deploy this package instead of the latest packaged artifact
    #[arg(long, value_name = "PATH")]
    pub from_package: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct DeployFlags {
    pub all: bool,
    /// Value of the deprecated `--service` flag
    pub service_name: Option<String>,
    pub from_package: Option<PathBuf>,
    env: EnvFlag,
}

impl BindFlags for DeployFlags {
    type Args = DeployArgs;

    fn bind_non_common(&mut self, args: &DeployArgs) {
        self.all = args.all;
        self.service_name = args.service.clone();
        self.from_package = args.from_package.clone();
    }

    fn set_common(&mut self, env: &EnvFlag) {
        self.env = env.clone();
    }

    fn env_flag(&self) -> &EnvFlag {
        &self.env
    }
}

pub struct DeployAction {
    flags: DeployFlags,
    args: Vec<String>,
    project: Arc<ProjectConfig>,
    env: Environment,
    deployer: Arc<dyn Deployer>,
    console: Arc<dyn Console>,
}

impl DeployAction {
    pub fn new(
        flags: DeployFlags,
        project: Arc<ProjectConfig>,
        env: Environment,
        deployer: Arc<dyn Deployer>,
        console: Arc<dyn Console>,
    ) -> Self {
        Self {
            flags,
            args: Vec::new(),
            project,
            env,
            deployer,
            console,
        }
    }

    pub fn flags(&self) -> &DeployFlags {
        &self.flags
    }

    pub fn set_flags(&mut self, flags: DeployFlags) {
        self.flags = flags;
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Positional arguments: an optional service name.
    pub fn set_args(&mut self, args: Vec<String>) {
        self.args = args;
    }

    /// The positional service, falling back to the deprecated `--service`.
    fn service_name(&self) -> Option<String> {
        self.args
            .first()
            .cloned()
            .or_else(|| self.flags.service_name.clone())
            .filter(|name| !name.is_empty())
    }
}

impl FromContainer for DeployAction {
    fn from_container(container: &Arc<Container>) -> Result<Self, ContainerError> {
        Ok(Self::new(
            container.resolve()?,
            container.resolve()?,
            container.resolve()?,
            container.resolve()?,
            container.resolve()?,
        ))
    }
}

#[async_trait]
impl Action for DeployAction {
    async fn run(&mut self, ctx: &ActionContext) -> Result<ActionResult, ActionError> {
        if self.flags.service_name.as_deref().is_some_and(|s| !s.is_empty()) {
            self.console.warn(&deprecated_flag("--service"));
        }

        let service_name = self.service_name();
        let targets = resolve_targets(&self.project, service_name.as_deref(), self.flags.all)?;
        if self.flags.from_package.is_some() && targets.len() > 1 {
            return Err(anyhow::anyhow!(
                "'--from-package' requires a single service; name the service to deploy"
            )
            .into());
        }

        let mut deployments = Vec::new();
        for service in targets {
            ctx.check_cancelled()?;
            self.console.message(&format!(
                "{}Deploying service {}",
                icons::ROCKET,
                highlight(&service.name)
            ));
            let output = self
                .deployer
                .deploy(service, &self.env, self.flags.from_package.as_deref())
                .await?;
            if output.skipped {
                self.console.message(&dim("  No deploy command, skipped"));
            }
            deployments.push(output);
        }

        let deployed = deployments.iter().filter(|d| !d.skipped).count();
        let header = if deployed == 0 {
            "There was nothing to deploy".to_string()
        } else {
            format!(
                "Deployed {} service(s) to environment {}",
                deployed,
                highlight(self.env.name())
            )
        };
        let mut result = ActionResult::with_header(header)
            .with_payload(serde_json::json!({ "deployments": deployments }));
        if let Some(endpoint) = self.env.get("SHIPYARD_ENDPOINT") {
            result = result.with_follow_up(format!("Endpoint: {}", highlight(endpoint)));
        }
        Ok(result)
    }
}

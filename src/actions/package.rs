//! `shipyard package`: build deployable artifacts for services.

use super::resolve_targets;
use crate::action::{Action, ActionContext, ActionResult};
use crate::container::{Container, FromContainer};
use crate::environment::Environment;
use crate::errors::{ActionError, ContainerError};
use crate::flags::{BindFlags, EnvFlag};
use crate::lifecycle::Packager;
use crate::project::ProjectConfig;
use crate::ui::format::{dim, highlight};
use crate::ui::{Console, icons};
use async_trait::async_trait;
use clap::Args;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Args)]
pub struct PackageArgs {
    /// Package every service
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PackageFlags {
    pub all: bool,
    env: EnvFlag,
}

impl BindFlags for PackageFlags {
    type Args = PackageArgs;

    fn bind_non_common(&mut self, args: &PackageArgs) {
        self.all = args.all;
    }

    fn set_common(&mut self, env: &EnvFlag) {
        self.env = env.clone();
    }

    fn env_flag(&self) -> &EnvFlag {
        &self.env
    }
}

pub struct PackageAction {
    flags: PackageFlags,
    args: Vec<String>,
    project: Arc<ProjectConfig>,
    env: Environment,
    packager: Arc<dyn Packager>,
    console: Arc<dyn Console>,
}

impl PackageAction {
    pub fn new(
        flags: PackageFlags,
        project: Arc<ProjectConfig>,
        env: Environment,
        packager: Arc<dyn Packager>,
        console: Arc<dyn Console>,
    ) -> Self {
        Self {
            flags,
            args: Vec::new(),
            project,
            env,
            packager,
            console,
        }
    }

    /// Positional arguments: an optional service name.
    pub fn set_args(&mut self, args: Vec<String>) {
        self.args = args;
    }
}

impl FromContainer for PackageAction {
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
impl Action for PackageAction {
    async fn run(&mut self, ctx: &ActionContext) -> Result<ActionResult, ActionError> {
        let targets = resolve_targets(
            &self.project,
            self.args.first().map(String::as_str),
            self.flags.all,
        )?;

        let mut packages = Vec::new();
        let mut built = 0;
        for service in targets {
            ctx.check_cancelled()?;
            self.console.message(&format!(
                "{}Packaging service {}",
                icons::PACKAGE,
                highlight(&service.name)
            ));
            let output = self.packager.package(service, &self.env).await?;
            match (&output.artifact, &service.package) {
                (Some(path), _) => self
                    .console
                    .message(&format!("  Package: {}", dim(path.display().to_string()))),
                (None, Some(_)) => self.console.message(&dim("  Packaged, no artifact produced")),
                (None, None) => self.console.message(&dim("  No package command, skipped")),
            }
            if service.package.is_some() || output.artifact.is_some() {
                built += 1;
            }
            packages.push(output);
        }

        let header = if built == 0 {
            "There was nothing to package".to_string()
        } else {
            format!(
                "Packaged {} service(s) for environment {}",
                built,
                highlight(self.env.name())
            )
        };
        Ok(ActionResult::with_header(header)
            .with_payload(serde_json::json!({ "packages": packages })))
    }
}

//! `shipyard up`: package, provision and deploy in one command.
//!
//! `up` owns no business logic. It resolves the environment's account
//! context, then builds and runs the three child actions in a fixed order
//! through the middleware runner, so each step gets the same hooks, tracing
//! and output handling it would get as a standalone command.

use super::{DeployAction, DeployArgs, DeployFlags, PackageAction, ProvisionAction};
use super::{ProvisionArgs, ProvisionFlags};
use crate::account::AccountManager;
use crate::action::{Action, ActionContext, ActionResult};
use crate::container::{ActionInitializer, Container, FromContainer};
use crate::environment::Environment;
use crate::errors::{ActionError, ContainerError};
use crate::flags::{EnvArgs, EnvFlag, bind_flag_group};
use crate::middleware::{MiddlewareRunner, Options};
use crate::precondition::ensure_subscription_and_location;
use crate::ui::Console;
use crate::ui::format::deprecated_flag;
use async_trait::async_trait;
use clap::Args;
use std::sync::Arc;

/// Flags of `up`: the provision and deploy groups plus one environment selector.
#[derive(Debug, Clone, Default, Args)]
pub struct UpArgs {
    #[command(flatten)]
    pub env: EnvArgs,

    #[command(flatten)]
    pub provision: ProvisionArgs,

    #[command(flatten)]
    pub deploy: DeployArgs,
}

#[derive(Debug, Clone, Default)]
pub struct UpFlags {
    env: EnvFlag,
    pub provision: ProvisionFlags,
    pub deploy: DeployFlags,
}

impl UpFlags {
    /// Flags whose groups share `env` as their environment selector.
    pub fn new(env: &EnvFlag) -> Self {
        Self {
            env: env.clone(),
            ..Default::default()
        }
    }

    /// Bind parsed arguments. Each group binds its own fields first and is
    /// then linked to the shared selector; rebinding keeps the same cell.
    pub fn bind(&mut self, args: &UpArgs) {
        self.env.bind(&args.env);
        bind_flag_group(&mut self.provision, &args.provision, &self.env);
        bind_flag_group(&mut self.deploy, &args.deploy, &self.env);
    }

    pub fn env_flag(&self) -> &EnvFlag {
        &self.env
    }
}

pub struct UpAction {
    flags: UpFlags,
    env: Environment,
    account_manager: Arc<dyn AccountManager>,
    package_init: ActionInitializer<PackageAction>,
    provision_init: ActionInitializer<ProvisionAction>,
    deploy_init: ActionInitializer<DeployAction>,
    console: Arc<dyn Console>,
    runner: Arc<MiddlewareRunner>,
}

impl UpAction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        flags: UpFlags,
        env: Environment,
        account_manager: Arc<dyn AccountManager>,
        package_init: ActionInitializer<PackageAction>,
        provision_init: ActionInitializer<ProvisionAction>,
        deploy_init: ActionInitializer<DeployAction>,
        console: Arc<dyn Console>,
        runner: Arc<MiddlewareRunner>,
    ) -> Self {
        Self {
            flags,
            env,
            account_manager,
            package_init,
            provision_init,
            deploy_init,
            console,
            runner,
        }
    }

    pub fn flags(&self) -> &UpFlags {
        &self.flags
    }
}

impl FromContainer for UpAction {
    fn from_container(container: &Arc<Container>) -> Result<Self, ContainerError> {
        Ok(Self::new(
            container.resolve()?,
            container.resolve()?,
            container.resolve()?,
            ActionInitializer::from_container("package", container),
            ActionInitializer::from_container("provision", container),
            ActionInitializer::from_container("deploy", container),
            container.resolve()?,
            container.resolve()?,
        ))
    }
}

#[async_trait]
impl Action for UpAction {
    async fn run(&mut self, ctx: &ActionContext) -> Result<ActionResult, ActionError> {
        if self.flags.provision.no_progress {
            self.console.warn(&deprecated_flag("--no-progress"));
            self.flags.provision.no_progress = false;
        }
        if self
            .flags
            .deploy
            .service_name
            .as_deref()
            .is_some_and(|s| !s.is_empty())
        {
            self.console.warn(&deprecated_flag("--service"));
        }

        ensure_subscription_and_location(
            ctx,
            self.console.as_ref(),
            &self.env,
            self.account_manager.as_ref(),
        )
        .await?;

        let mut package = self.package_init.initialize()?;
        self.runner
            .run_child_action(ctx, Options::new("package"), &mut package)
            .await?;

        let mut provision = self.provision_init.initialize()?;
        provision.set_flags(self.flags.provision.clone());
        self.runner
            .run_child_action(ctx, Options::new("provision"), &mut provision)
            .await?;

        self.console.message("");

        let mut deploy = self.deploy_init.initialize()?;
        let service_name = self.flags.deploy.service_name.take();
        deploy.set_flags(self.flags.deploy.clone());
        if let Some(name) = service_name.filter(|name| !name.is_empty()) {
            deploy.set_args(vec![name]);
        }
        let options = Options::new("deploy").with_args(deploy.args().to_vec());
        self.runner
            .run_child_action(ctx, options, &mut deploy)
            .await
    }
}

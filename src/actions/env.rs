//! `shipyard env`: manage named environments.

use crate::action::{Action, ActionContext, ActionResult};
use crate::environment::{EnvironmentManager, LOCATION_KEY, SUBSCRIPTION_ID_KEY};
use crate::errors::ActionError;
use crate::ui::Console;
use crate::ui::format::{dim, highlight};
use async_trait::async_trait;
use clap::Args;
use std::sync::Arc;

#[derive(Debug, Clone, Args)]
pub struct EnvNewArgs {
    /// Name of the new environment
    pub name: String,

    /// Subscription to deploy into
    #[arg(long)]
    pub subscription: Option<String>,

    /// Location for new resources
    #[arg(short = 'l', long)]
    pub location: Option<String>,
}

pub struct EnvNewAction {
    args: EnvNewArgs,
    manager: EnvironmentManager,
}

impl EnvNewAction {
    pub fn new(args: EnvNewArgs, manager: EnvironmentManager) -> Self {
        Self { args, manager }
    }
}

#[async_trait]
impl Action for EnvNewAction {
    async fn run(&mut self, _ctx: &ActionContext) -> Result<ActionResult, ActionError> {
        let env = self
            .manager
            .create(&self.args.name)
            .map_err(anyhow::Error::from)?;
        if let Some(subscription) = &self.args.subscription {
            env.set(SUBSCRIPTION_ID_KEY, subscription.clone());
        }
        if let Some(location) = &self.args.location {
            env.set(LOCATION_KEY, location.clone());
        }
        env.save().map_err(anyhow::Error::from)?;
        self.manager
            .set_default(&self.args.name)
            .map_err(anyhow::Error::from)?;

        tracing::info!(environment = %self.args.name, "environment created");
        Ok(ActionResult::with_header(format!(
            "New environment {} created and selected",
            highlight(&self.args.name)
        )))
    }
}

pub struct EnvSelectAction {
    name: String,
    manager: EnvironmentManager,
}

impl EnvSelectAction {
    pub fn new(name: String, manager: EnvironmentManager) -> Self {
        Self { name, manager }
    }
}

#[async_trait]
impl Action for EnvSelectAction {
    async fn run(&mut self, _ctx: &ActionContext) -> Result<ActionResult, ActionError> {
        self.manager
            .set_default(&self.name)
            .map_err(anyhow::Error::from)?;
        Ok(ActionResult::with_header(format!(
            "Environment {} selected",
            highlight(&self.name)
        )))
    }
}

pub struct EnvListAction {
    manager: EnvironmentManager,
    console: Arc<dyn Console>,
}

impl EnvListAction {
    pub fn new(manager: EnvironmentManager, console: Arc<dyn Console>) -> Self {
        Self { manager, console }
    }
}

#[async_trait]
impl Action for EnvListAction {
    async fn run(&mut self, _ctx: &ActionContext) -> Result<ActionResult, ActionError> {
        let names = self.manager.list().map_err(anyhow::Error::from)?;
        let default = self.manager.default_name().map_err(anyhow::Error::from)?;

        if names.is_empty() {
            self.console
                .message(&dim("No environments. Create one with 'shipyard env new <name>'."));
        }
        for name in &names {
            if default.as_deref() == Some(name.as_str()) {
                self.console.message(&format!("{} {}", name, dim("(default)")));
            } else {
                self.console.message(name);
            }
        }
        Ok(ActionResult::default().with_payload(serde_json::json!({
            "environments": names,
            "default": default,
        })))
    }
}

//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module      | Commands handled                         |
//! |-------------|------------------------------------------|
//! | `lifecycle` | `Up`, `Package`, `Provision`, `Deploy`   |
//! | `env`       | `Env`                                    |
//!
//! Commands bind their flags, register them in the container, build the
//! action through an initializer and hand it to the middleware runner.

pub mod env;
pub mod lifecycle;

pub use env::cmd_env;
pub use lifecycle::{cmd_deploy, cmd_package, cmd_provision, cmd_up};

use anyhow::Result;
use shipyard::action::{Action, ActionContext};
use shipyard::bootstrap;
use shipyard::config::Config;
use shipyard::container::Container;
use shipyard::flags::{EnvArgs, EnvFlag, GlobalCommandOptions};
use shipyard::middleware::{MiddlewareRunner, Options};
use shipyard::ui::{Console, TerminalConsole};
use std::sync::Arc;

/// Per-invocation state shared by every command.
pub struct App {
    pub env_flag: EnvFlag,
    pub container: Arc<Container>,
    runner: Arc<MiddlewareRunner>,
}

impl App {
    pub fn new(global: &GlobalCommandOptions, env: Option<&EnvArgs>) -> Result<Self> {
        let config = Config::from_options(global)?;
        tracing::debug!(project_dir = %config.project_dir.display(), "resolved project directory");

        let console: Arc<dyn Console> = Arc::new(TerminalConsole::new(config.no_prompt));
        let env_flag = EnvFlag::default();
        if let Some(args) = env {
            env_flag.bind(args);
        }

        let container = bootstrap::build_container(&config, console, &env_flag);
        let runner = container.resolve::<Arc<MiddlewareRunner>>()?;
        Ok(Self {
            env_flag,
            container,
            runner,
        })
    }

    /// Run a top-level action through the middleware chain.
    pub async fn execute<A: Action + 'static>(
        &self,
        ctx: &ActionContext,
        options: Options,
        mut action: A,
    ) -> Result<()> {
        self.runner.run_action(ctx, options, &mut action).await?;
        Ok(())
    }
}

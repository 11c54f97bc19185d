//! Environment management commands: `shipyard env`.

use super::App;
use crate::EnvCommands;
use anyhow::Result;
use shipyard::action::ActionContext;
use shipyard::actions::{EnvListAction, EnvNewAction, EnvSelectAction};
use shipyard::container::ActionInitializer;
use shipyard::flags::GlobalCommandOptions;
use shipyard::middleware::Options;

pub async fn cmd_env(
    ctx: &ActionContext,
    global: &GlobalCommandOptions,
    command: &EnvCommands,
) -> Result<()> {
    let app = App::new(global, None)?;
    let container = app.container.clone();

    match command {
        EnvCommands::New(args) => {
            let args = args.clone();
            let init = ActionInitializer::new("env new", move || {
                Ok(EnvNewAction::new(args.clone(), container.resolve()?))
            });
            app.execute(ctx, Options::new("env new"), init.initialize()?).await
        }
        EnvCommands::Select { name } => {
            let name = name.clone();
            let init = ActionInitializer::new("env select", move || {
                Ok(EnvSelectAction::new(name.clone(), container.resolve()?))
            });
            app.execute(ctx, Options::new("env select"), init.initialize()?).await
        }
        EnvCommands::List => {
            let init = ActionInitializer::new("env list", move || {
                Ok(EnvListAction::new(container.resolve()?, container.resolve()?))
            });
            app.execute(ctx, Options::new("env list"), init.initialize()?).await
        }
    }
}

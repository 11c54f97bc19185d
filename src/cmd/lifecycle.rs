//! Delivery commands: `shipyard up`, `package`, `provision` and `deploy`.

use super::App;
use crate::{DeployCommand, PackageCommand, ProvisionCommand};
use anyhow::Result;
use shipyard::action::ActionContext;
use shipyard::actions::{
    DeployAction, DeployFlags, PackageAction, PackageArgs, PackageFlags, ProvisionAction,
    ProvisionFlags, UpAction, UpArgs, UpFlags,
};
use shipyard::container::ActionInitializer;
use shipyard::flags::{GlobalCommandOptions, bind_flag_group};
use shipyard::middleware::Options;

pub async fn cmd_up(ctx: &ActionContext, global: &GlobalCommandOptions, args: &UpArgs) -> Result<()> {
    let app = App::new(global, Some(&args.env))?;

    let mut flags = UpFlags::new(&app.env_flag);
    flags.bind(args);

    // `up` always packages every service.
    let mut package_flags = PackageFlags::default();
    bind_flag_group(&mut package_flags, &PackageArgs { all: true }, &app.env_flag);

    app.container.register_instance(package_flags);
    app.container.register_instance(flags.provision.clone());
    app.container.register_instance(flags.deploy.clone());
    app.container.register_instance(flags);

    let action = ActionInitializer::<UpAction>::from_container("up", &app.container).initialize()?;
    app.execute(ctx, Options::new("up"), action).await
}

pub async fn cmd_package(
    ctx: &ActionContext,
    global: &GlobalCommandOptions,
    command: &PackageCommand,
) -> Result<()> {
    let app = App::new(global, Some(&command.env))?;

    let mut flags = PackageFlags::default();
    bind_flag_group(&mut flags, &command.flags, &app.env_flag);
    app.container.register_instance(flags);

    let mut action =
        ActionInitializer::<PackageAction>::from_container("package", &app.container).initialize()?;
    let args: Vec<String> = command.service.iter().cloned().collect();
    action.set_args(args.clone());
    app.execute(ctx, Options::new("package").with_args(args), action).await
}

pub async fn cmd_provision(
    ctx: &ActionContext,
    global: &GlobalCommandOptions,
    command: &ProvisionCommand,
) -> Result<()> {
    let app = App::new(global, Some(&command.env))?;

    let mut flags = ProvisionFlags::default();
    bind_flag_group(&mut flags, &command.flags, &app.env_flag);
    app.container.register_instance(flags);

    let action = ActionInitializer::<ProvisionAction>::from_container("provision", &app.container)
        .initialize()?;
    app.execute(ctx, Options::new("provision"), action).await
}

pub async fn cmd_deploy(
    ctx: &ActionContext,
    global: &GlobalCommandOptions,
    command: &DeployCommand,
) -> Result<()> {
    let app = App::new(global, Some(&command.env))?;

    let mut flags = DeployFlags::default();
    bind_flag_group(&mut flags, &command.flags, &app.env_flag);
    app.container.register_instance(flags);

    let mut action =
        ActionInitializer::<DeployAction>::from_container("deploy", &app.container).initialize()?;
    let args: Vec<String> = command.service.iter().cloned().collect();
    action.set_args(args.clone());
    app.execute(ctx, Options::new("deploy").with_args(args), action).await
}

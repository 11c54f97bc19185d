use clap::{Args, Parser, Subcommand};
use shipyard::action::ActionContext;
use shipyard::actions::{DeployArgs, EnvNewArgs, PackageArgs, ProvisionArgs, UpArgs};
use shipyard::errors::ActionError;
use shipyard::flags::{EnvArgs, GlobalCommandOptions};
use shipyard::ui::format;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

mod cmd;

#[derive(Parser)]
#[command(name = "shipyard")]
#[command(version, about = "Package, provision and deploy applications")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalCommandOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Package, provision and deploy the application in one step
    Up(UpArgs),
    /// Package services for deployment
    Package(PackageCommand),
    /// Provision infrastructure for the environment
    Provision(ProvisionCommand),
    /// Deploy packaged services to the environment
    Deploy(DeployCommand),
    /// Manage environments
    Env {
        #[command(subcommand)]
        command: EnvCommands,
    },
}

#[derive(Args)]
pub struct PackageCommand {
    /// Service to package (defaults to every service)
    pub service: Option<String>,

    #[command(flatten)]
    pub env: EnvArgs,

    #[command(flatten)]
    pub flags: PackageArgs,
}

#[derive(Args)]
pub struct ProvisionCommand {
    #[command(flatten)]
    pub env: EnvArgs,

    #[command(flatten)]
    pub flags: ProvisionArgs,
}

#[derive(Args)]
pub struct DeployCommand {
    /// Service to deploy (defaults to every service)
    pub service: Option<String>,

    #[command(flatten)]
    pub env: EnvArgs,

    #[command(flatten)]
    pub flags: DeployArgs,
}

#[derive(Subcommand)]
pub enum EnvCommands {
    /// Create an environment and make it the default
    New(EnvNewArgs),
    /// Make an existing environment the default
    Select { name: String },
    /// List environments
    List,
}

fn init_tracing(debug: bool) {
    let default_level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Failed actions carry their own context chain; everything else is an
/// `anyhow` chain from setup.
fn render_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ActionError>() {
        Some(ActionError::Failed(inner)) => format!("{:#}", inner),
        Some(action_err) => action_err.to_string(),
        None => format!("{:#}", err),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.debug);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::debug!("interrupt received");
                cancel.cancel();
            }
        });
    }
    let ctx = ActionContext::with_cancellation(cancel);

    let result = match &cli.command {
        Commands::Up(args) => cmd::cmd_up(&ctx, &cli.global, args).await,
        Commands::Package(command) => cmd::cmd_package(&ctx, &cli.global, command).await,
        Commands::Provision(command) => cmd::cmd_provision(&ctx, &cli.global, command).await,
        Commands::Deploy(command) => cmd::cmd_deploy(&ctx, &cli.global, command).await,
        Commands::Env { command } => cmd::cmd_env(&ctx, &cli.global, command).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("\n{}", format::error(&format!("ERROR: {}", render_error(&err))));
            let cancelled = err
                .downcast_ref::<ActionError>()
                .is_some_and(ActionError::is_cancelled);
            if cancelled {
                ExitCode::from(130)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

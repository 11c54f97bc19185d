//! Command actions.
//!
//! | Module      | Command                                 |
//! |-------------|-----------------------------------------|
//! | `package`   | `package [service] [--all]`             |
//! | `provision` | `provision [--preview]`                 |
//! | `deploy`    | `deploy [service] [--all] [--from-package]` |
//! | `up`        | `up` (package, provision, deploy)       |
//! | `env`       | `env new`, `env select`, `env list`     |
//!
//! Every action is built by an [`ActionInitializer`](crate::container::ActionInitializer)
//! from the container and run through the
//! [`MiddlewareRunner`](crate::middleware::MiddlewareRunner).

pub mod deploy;
pub mod env;
pub mod package;
pub mod provision;
pub mod up;

pub use deploy::{DeployAction, DeployArgs, DeployFlags};
pub use env::{EnvListAction, EnvNewAction, EnvNewArgs, EnvSelectAction};
pub use package::{PackageAction, PackageArgs, PackageFlags};
pub use provision::{ProvisionAction, ProvisionArgs, ProvisionFlags};
pub use up::{UpAction, UpArgs, UpFlags};

use crate::project::{ProjectConfig, ServiceConfig};
use anyhow::Result;

/// Services a command applies to: the named one, or all of them.
pub(crate) fn resolve_targets<'a>(
    project: &'a ProjectConfig,
    service: Option<&str>,
    all: bool,
) -> Result<Vec<&'a ServiceConfig>> {
    match service {
        Some(name) if all => {
            anyhow::bail!("'--all' cannot be combined with a service name ('{}')", name)
        }
        Some(name) => match project.service(name) {
            Some(service) => Ok(vec![service]),
            None => anyhow::bail!(
                "service '{}' is not defined in shipyard.toml (available: {})",
                name,
                project.service_names().join(", ")
            ),
        },
        None => Ok(project.services.iter().collect()),
    }
}

//! Flag groups and the shared environment selector.
//!
//! Every command owns a flag group made of two parts:
//!
//! - *non-common* fields that only that command declares (bound from its
//!   clap `Args` struct by [`BindFlags::bind_non_common`])
//! - the *common* environment selector, which is linked to an externally
//!   owned [`EnvFlag`] by [`BindFlags::set_common`]
//!
//! A composite command declares `-e/--environment` once, binds it into a
//! single [`EnvFlag`], and links every embedded group to that same cell.
//! Writing the selector through any group is visible through all of them.

use clap::Args;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Options that apply to every command.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalCommandOptions {
    /// Run as if started in this directory
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Never prompt; use defaults or fail when input is required
    #[arg(long, global = true, env = "SHIPYARD_NO_PROMPT")]
    pub no_prompt: bool,
}

/// The `-e/--environment` declaration, flattened into commands that accept it.
#[derive(Debug, Clone, Default, Args)]
pub struct EnvArgs {
    /// Name of the environment to use
    #[arg(short = 'e', long = "environment", value_name = "NAME", env = "SHIPYARD_ENVIRONMENT")]
    pub environment: Option<String>,
}

/// The shared environment selector.
///
/// Clones share one cell, so the value is owned exactly once no matter how
/// many flag groups hold it.
#[derive(Debug, Clone, Default)]
pub struct EnvFlag {
    cell: Arc<RwLock<Option<String>>>,
}

impl EnvFlag {
    pub fn new(value: Option<String>) -> Self {
        Self {
            cell: Arc::new(RwLock::new(value)),
        }
    }

    /// Store the parsed `--environment` value. Empty strings count as unset.
    pub fn bind(&self, args: &EnvArgs) {
        self.set(args.environment.clone().filter(|name| !name.is_empty()));
    }

    pub fn get(&self) -> Option<String> {
        self.cell.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set(&self, value: Option<String>) {
        *self.cell.write().unwrap_or_else(|e| e.into_inner()) = value;
    }

    /// Whether `self` and `other` are the same cell.
    pub fn same_cell(&self, other: &EnvFlag) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

/// A command's flag group.
pub trait BindFlags {
    /// The clap arguments holding this group's own fields.
    type Args;

    fn bind_non_common(&mut self, args: &Self::Args);

    /// Link the group's environment selector to `env`.
    fn set_common(&mut self, env: &EnvFlag);

    fn env_flag(&self) -> &EnvFlag;
}

/// Bind one group: non-common fields first, then the shared selector, so a
/// non-common binding can never shadow the common field.
pub fn bind_flag_group<F: BindFlags>(flags: &mut F, args: &F::Args, env: &EnvFlag) {
    flags.bind_non_common(args);
    flags.set_common(env);
}

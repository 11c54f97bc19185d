use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;
use crate::flags::GlobalCommandOptions;
use crate::project::PROJECT_FILE;

const CONFIG_DIR_ENV: &str = "SHIPYARD_CONFIG_DIR";
const USER_CONFIG_FILE: &str = "config.toml";

/// Runtime configuration for one shipyard invocation.
///
/// Built from the global command options; locates the project directory and
/// the user configuration directory.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_dir: PathBuf,
    pub state_dir: PathBuf,
    pub user_config_dir: Option<PathBuf>,
    pub debug: bool,
    pub no_prompt: bool,
}

impl Config {
    pub fn from_options(options: &GlobalCommandOptions) -> Result<Self> {
        let start = match &options.cwd {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Failed to read current directory")?,
        };
        let start = start
            .canonicalize()
            .with_context(|| format!("Failed to resolve directory: {}", start.display()))?;
        let project_dir = Self::find_project_dir(&start).unwrap_or(start);

        Ok(Self {
            state_dir: project_dir.join(".shipyard"),
            project_dir,
            user_config_dir: Self::default_user_config_dir(),
            debug: options.debug,
            no_prompt: options.no_prompt,
        })
    }

    /// Nearest ancestor of `start` (inclusive) holding a project file.
    pub fn find_project_dir(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|dir| dir.join(PROJECT_FILE).is_file())
            .map(Path::to_path_buf)
    }

    /// `$SHIPYARD_CONFIG_DIR`, or `shipyard/` under the platform config dir.
    pub fn default_user_config_dir() -> Option<PathBuf> {
        match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
            _ => dirs::config_dir().map(|d| d.join("shipyard")),
        }
    }

    pub fn user_config(&self) -> Result<UserConfig, ConfigError> {
        match &self.user_config_dir {
            Some(dir) => UserConfig::load_or_default(&dir.join(USER_CONFIG_FILE)),
            None => Ok(UserConfig::default()),
        }
    }
}

/// Account defaults used when an environment lacks a subscription or location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountDefaults {
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionEntry {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationEntry {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Per-user settings from `config.toml`.
///
/// ```toml
/// [defaults]
/// subscription = "0000-1111"
/// location = "eastus"
///
/// [[subscriptions]]
/// id = "0000-1111"
/// name = "Production"
///
/// [[locations]]
/// name = "eastus"
/// display_name = "East US"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub defaults: AccountDefaults,
    #[serde(default)]
    pub subscriptions: Vec<SubscriptionEntry>,
    #[serde(default)]
    pub locations: Vec<LocationEntry>,
}

impl UserConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Returns the default configuration when the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

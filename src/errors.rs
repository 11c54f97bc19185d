//! Typed error hierarchy for shipyard.
//!
//! - `ActionError`: everything an action invocation can fail with
//! - `ContainerError`: dependency resolution failures
//! - `EnvironmentError`: environment storage failures
//! - `PreconditionError`: subscription/location resolution failures
//! - `ConfigError`: project and user configuration failures

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by an action invocation, nested or top-level.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Subscription/location could not be established before the steps ran.
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    /// The action could not be constructed. Nothing was executed.
    #[error("failed to initialize the '{action}' action: {source}")]
    Initialization {
        action: &'static str,
        #[source]
        source: ContainerError,
    },

    #[error("{event} hook failed: {message}")]
    Hook { event: String, message: String },

    #[error("operation cancelled")]
    Cancelled,

    /// The action's own business failure, carried through untouched.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl ActionError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ActionError::Cancelled)
    }
}

/// Errors from the dependency container.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("no registration for {type_name}")]
    NotRegistered { type_name: &'static str },

    /// `type_name` is kept for diagnostics; the message is the factory's own.
    #[error("{source}")]
    Resolve {
        type_name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

/// Errors from environment storage.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error(
        "no environment selected: run 'shipyard env new <name>' or pass --environment <name>"
    )]
    NoDefault,

    #[error("environment '{0}' not found")]
    NotFound(String),

    #[error("environment '{0}' already exists")]
    AlreadyExists(String),

    #[error(
        "invalid environment name '{0}': use 1-64 letters, digits, '-', '_' or '.'"
    )]
    InvalidName(String),

    #[error("failed to read environment file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Errors from subscription/location resolution.
#[derive(Debug, Error)]
pub enum PreconditionError {
    #[error("no subscriptions are available for the current account")]
    NoSubscriptions,

    #[error("no locations are available for subscription '{0}'")]
    NoLocations(String),

    #[error(
        "a subscription is required: set a default subscription or run 'shipyard env new' with --subscription"
    )]
    SubscriptionRequired,

    #[error(
        "a location is required: set a default location or run 'shipyard env new' with --location"
    )]
    LocationRequired,

    #[error("failed to query account: {0}")]
    Account(#[source] anyhow::Error),

    #[error("prompt failed: {0}")]
    Prompt(#[source] anyhow::Error),

    #[error(transparent)]
    Environment(#[from] EnvironmentError),
}

/// Errors from loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("project file not found at {0}: run shipyard from a project directory or pass --cwd")]
    ProjectNotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid project configuration: {0}")]
    Invalid(String),
}

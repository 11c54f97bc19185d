//! Named deployment environments.
//!
//! Layout under the project's `.shipyard/` directory:
//!
//! ```text
//! .shipyard/
//!   config.json        {"default_environment": "dev"}
//!   dev/.env           SHIPYARD_ENV_NAME="dev"
//!                      SHIPYARD_SUBSCRIPTION_ID="..."
//!                      SHIPYARD_LOCATION="eastus"
//! ```
//!
//! [`Environment`] is a cheap-to-clone handle; every clone sees the same
//! values, so the copy resolved for `up` is the copy its child steps read.

use crate::errors::EnvironmentError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

pub const ENV_NAME_KEY: &str = "SHIPYARD_ENV_NAME";
pub const SUBSCRIPTION_ID_KEY: &str = "SHIPYARD_SUBSCRIPTION_ID";
pub const LOCATION_KEY: &str = "SHIPYARD_LOCATION";

const DOTENV_FILE: &str = ".env";
const CONFIG_FILE: &str = "config.json";
const MAX_NAME_LEN: usize = 64;

#[derive(Debug)]
struct EnvironmentState {
    name: String,
    values: BTreeMap<String, String>,
    dotenv_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Environment {
    state: Arc<RwLock<EnvironmentState>>,
}

impl Environment {
    fn from_parts(name: &str, values: BTreeMap<String, String>, dotenv_path: PathBuf) -> Self {
        Self {
            state: Arc::new(RwLock::new(EnvironmentState {
                name: name.to_string(),
                values,
                dotenv_path,
            })),
        }
    }

    /// An environment that lives only in memory until [`save`](Self::save)
    /// is called with a path set. Used by tests and dry runs.
    pub fn ephemeral(name: &str) -> Self {
        let mut values = BTreeMap::new();
        values.insert(ENV_NAME_KEY.to_string(), name.to_string());
        Self::from_parts(name, values, PathBuf::new())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, EnvironmentState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, EnvironmentState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn name(&self) -> String {
        self.read().name.clone()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.read()
            .values
            .get(key)
            .filter(|v| !v.is_empty())
            .cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.write().values.insert(key.into(), value.into());
    }

    /// Snapshot of every value, sorted by key.
    pub fn values(&self) -> BTreeMap<String, String> {
        self.read().values.clone()
    }

    pub fn subscription_id(&self) -> Option<String> {
        self.get(SUBSCRIPTION_ID_KEY)
    }

    pub fn location(&self) -> Option<String> {
        self.get(LOCATION_KEY)
    }

    pub fn is_same(&self, other: &Environment) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Persist values to the environment's `.env` file.
    ///
    /// Ephemeral environments have no file and saving them is a no-op.
    pub fn save(&self) -> Result<(), EnvironmentError> {
        let state = self.read();
        if state.dotenv_path.as_os_str().is_empty() {
            return Ok(());
        }
        if let Some(parent) = state.dotenv_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&state.dotenv_path, render_dotenv(&state.values))?;
        tracing::debug!(environment = %state.name, path = %state.dotenv_path.display(), "environment saved");
        Ok(())
    }
}

/// Serialise values as `KEY="value"` lines with quotes and backslashes escaped.
fn render_dotenv(values: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in values {
        let escaped = value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('$', "\\$")
            .replace('\n', "\\n");
        out.push_str(&format!("{}=\"{}\"\n", key, escaped));
    }
    out
}

pub fn validate_name(name: &str) -> Result<(), EnvironmentError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(EnvironmentError::InvalidName(name.to_string()))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LocalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_environment: Option<String>,
}

/// Creates, loads and lists environments under a `.shipyard` directory.
#[derive(Debug, Clone)]
pub struct EnvironmentManager {
    root: PathBuf,
}

impl EnvironmentManager {
    /// Manager for `<project_dir>/.shipyard`.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            root: project_dir.as_ref().join(".shipyard"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dotenv_path(&self, name: &str) -> PathBuf {
        self.root.join(name).join(DOTENV_FILE)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.dotenv_path(name).is_file()
    }

    pub fn create(&self, name: &str) -> Result<Environment, EnvironmentError> {
        validate_name(name)?;
        if self.exists(name) {
            return Err(EnvironmentError::AlreadyExists(name.to_string()));
        }
        let mut values = BTreeMap::new();
        values.insert(ENV_NAME_KEY.to_string(), name.to_string());
        let env = Environment::from_parts(name, values, self.dotenv_path(name));
        env.save()?;
        Ok(env)
    }

    pub fn load(&self, name: &str) -> Result<Environment, EnvironmentError> {
        validate_name(name)?;
        let path = self.dotenv_path(name);
        if !path.is_file() {
            return Err(EnvironmentError::NotFound(name.to_string()));
        }
        let mut values = BTreeMap::new();
        let iter = dotenvy::from_path_iter(&path).map_err(|source| EnvironmentError::Parse {
            path: path.clone(),
            source,
        })?;
        for item in iter {
            let (key, value) = item.map_err(|source| EnvironmentError::Parse {
                path: path.clone(),
                source,
            })?;
            values.insert(key, value);
        }
        Ok(Environment::from_parts(name, values, path))
    }

    /// Names of all environments, sorted.
    pub fn list(&self) -> Result<Vec<String>, EnvironmentError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                let name = entry.file_name().to_string_lossy().to_string();
                if self.exists(&name) {
                    names.push(name);
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn default_name(&self) -> Result<Option<String>, EnvironmentError> {
        let path = self.root.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        let config: LocalConfig = serde_json::from_str(&content)?;
        Ok(config.default_environment)
    }

    pub fn set_default(&self, name: &str) -> Result<(), EnvironmentError> {
        if !self.exists(name) {
            return Err(EnvironmentError::NotFound(name.to_string()));
        }
        std::fs::create_dir_all(&self.root)?;
        let config = LocalConfig {
            default_environment: Some(name.to_string()),
        };
        std::fs::write(
            self.root.join(CONFIG_FILE),
            serde_json::to_string_pretty(&config)?,
        )?;
        Ok(())
    }

    /// Load `selected` if given, otherwise the default environment.
    pub fn resolve(&self, selected: Option<&str>) -> Result<Environment, EnvironmentError> {
        match selected {
            Some(name) => self.load(name),
            None => {
                let name = self.default_name()?.ok_or(EnvironmentError::NoDefault)?;
                self.load(&name)
            }
        }
    }
}

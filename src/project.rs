//! The `shipyard.toml` project file.
//!
//! ```toml
//! [project]
//! name = "todo-app"
//!
//! [infra]
//! provision = "./infra/apply.sh"
//!
//! [[services]]
//! name = "api"
//! path = "src/api"
//! package = "tar czf ../../dist/api.tgz ."
//! artifact = "dist/api.tgz"
//! deploy = "./scripts/deploy-api.sh"
//!
//! [[hooks]]
//! event = "predeploy"
//! command = "./scripts/migrate.sh"
//! ```

use crate::errors::ConfigError;
use crate::hooks::{HookDefinition, HooksConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const PROJECT_FILE: &str = "shipyard.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSection {
    pub name: String,
}

/// Infrastructure provisioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfraConfig {
    /// Command that applies the infrastructure
    pub provision: String,

    /// Command that previews changes without applying them
    #[serde(default)]
    pub preview: Option<String>,

    /// Relative to the project root
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,

    /// Service source directory, relative to the project root
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Command producing the deployable artifact
    #[serde(default)]
    pub package: Option<String>,

    /// Glob (relative to the project root) locating the packaged artifact
    #[serde(default)]
    pub artifact: Option<String>,

    /// Command shipping the artifact to its target
    #[serde(default)]
    pub deploy: Option<String>,
}

impl ServiceConfig {
    pub fn source_dir(&self, root: &Path) -> PathBuf {
        match &self.path {
            Some(p) => root.join(p),
            None => root.to_path_buf(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub project: ProjectSection,

    #[serde(default)]
    pub infra: Option<InfraConfig>,

    #[serde(default)]
    pub services: Vec<ServiceConfig>,

    #[serde(default)]
    pub hooks: Vec<HookDefinition>,

    /// Directory containing `shipyard.toml`
    #[serde(skip)]
    pub root: PathBuf,
}

impl ProjectConfig {
    /// Load `shipyard.toml` from `dir`.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(PROJECT_FILE);
        if !path.is_file() {
            return Err(ConfigError::ProjectNotFound(dir.to_path_buf()));
        }
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let mut config: ProjectConfig =
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
        config.root = dir.to_path_buf();
        config.check()?;

        for warning in config.validate() {
            tracing::warn!(path = %path.display(), "{}", warning);
        }
        Ok(config)
    }

    /// Hard errors: the project cannot be used as written.
    fn check(&self) -> Result<(), ConfigError> {
        if self.project.name.trim().is_empty() {
            return Err(ConfigError::Invalid("project name is empty".into()));
        }
        let mut seen = HashSet::new();
        for service in &self.services {
            if service.name.trim().is_empty() {
                return Err(ConfigError::Invalid("service with an empty name".into()));
            }
            if !seen.insert(service.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "service '{}' is declared more than once",
                    service.name
                )));
            }
        }
        if let Some(infra) = &self.infra
            && infra.provision.trim().is_empty()
        {
            return Err(ConfigError::Invalid("[infra] provision command is empty".into()));
        }
        Ok(())
    }

    /// Soft problems worth a warning.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.hooks().validate();
        for service in &self.services {
            if service.package.is_some() && service.artifact.is_none() {
                warnings.push(format!(
                    "Service '{}' has a package command but no artifact pattern",
                    service.name
                ));
            }
            if service.deploy.is_none() {
                warnings.push(format!(
                    "Service '{}' has no deploy command and will be skipped by deploy",
                    service.name
                ));
            }
        }
        warnings
    }

    pub fn hooks(&self) -> HooksConfig {
        HooksConfig::new(self.hooks.clone())
    }

    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn service_names(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.name.as_str()).collect()
    }
}

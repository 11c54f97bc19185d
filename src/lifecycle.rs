//! Packaging, provisioning and deployment back ends.
//!
//! Actions only talk to the [`Packager`], [`Provisioner`] and [`Deployer`]
//! traits. [`ScriptLifecycle`] implements all three by running the shell
//! commands declared in `shipyard.toml`:
//!
//! - every command runs as `sh -c` with the environment's values exported
//! - `SHIPYARD_SERVICE_NAME` is set for service commands
//! - `SHIPYARD_PACKAGE_PATH` points deploy commands at the packaged artifact
//! - provision commands may write `KEY=VALUE` lines to `$SHIPYARD_OUTPUTS_FILE`;
//!   those values are stored in the environment afterwards

use crate::environment::Environment;
use crate::project::{ProjectConfig, ServiceConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use glob::glob;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageOutput {
    pub service: String,
    /// `None` when the service has no package command or no artifact pattern
    pub artifact: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvisionOutput {
    /// False when the project declares no infrastructure
    pub applied: bool,
    pub preview: bool,
    pub outputs: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployOutput {
    pub service: String,
    pub artifact: Option<PathBuf>,
    /// True when the service has no deploy command
    pub skipped: bool,
}

#[async_trait]
pub trait Packager: Send + Sync {
    async fn package(&self, service: &ServiceConfig, env: &Environment) -> Result<PackageOutput>;
}

#[async_trait]
pub trait Provisioner: Send + Sync {
    async fn provision(&self, env: &Environment, preview: bool) -> Result<ProvisionOutput>;
}

#[async_trait]
pub trait Deployer: Send + Sync {
    /// Deploy `service`, from `package` when given, otherwise from the
    /// newest artifact matching the service's pattern (if any).
    async fn deploy(
        &self,
        service: &ServiceConfig,
        env: &Environment,
        package: Option<&Path>,
    ) -> Result<DeployOutput>;
}

pub struct ScriptLifecycle {
    project: Arc<ProjectConfig>,
}

impl ScriptLifecycle {
    pub fn new(project: Arc<ProjectConfig>) -> Self {
        Self { project }
    }

    fn service_vars(&self, service: &ServiceConfig, env: &Environment) -> BTreeMap<String, String> {
        let mut vars = env.values();
        vars.insert("SHIPYARD_PROJECT_NAME".into(), self.project.project.name.clone());
        vars.insert("SHIPYARD_SERVICE_NAME".into(), service.name.clone());
        vars
    }

    /// Most recently modified file matching `pattern` under the project root.
    fn find_artifact(&self, pattern: &str) -> Result<Option<PathBuf>> {
        let pattern = self.project.root.join(pattern).to_string_lossy().to_string();
        let mut matches: Vec<PathBuf> = glob(&pattern)
            .with_context(|| format!("Invalid artifact pattern: {}", pattern))?
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .collect();

        matches.sort_by(|a, b| {
            let a_time = a.metadata().and_then(|m| m.modified()).ok();
            let b_time = b.metadata().and_then(|m| m.modified()).ok();
            b_time.cmp(&a_time)
        });
        Ok(matches.into_iter().next())
    }
}

/// Run `command` with `sh -c` and return its stdout.
async fn run_script(command: &str, cwd: &Path, vars: &BTreeMap<String, String>) -> Result<String> {
    tracing::debug!(command, cwd = %cwd.display(), "running script");
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(cwd)
        .envs(vars)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("Failed to run '{}'", command))?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        anyhow::bail!(
            "'{}' failed with exit code {}: {}",
            command,
            output.status.code().unwrap_or(-1),
            detail
        );
    }
    for line in stdout.lines() {
        tracing::debug!(command, "{}", line);
    }
    Ok(stdout)
}

#[async_trait]
impl Packager for ScriptLifecycle {
    async fn package(&self, service: &ServiceConfig, env: &Environment) -> Result<PackageOutput> {
        let Some(command) = &service.package else {
            return Ok(PackageOutput {
                service: service.name.clone(),
                artifact: None,
            });
        };

        run_script(
            command,
            &service.source_dir(&self.project.root),
            &self.service_vars(service, env),
        )
        .await
        .with_context(|| format!("Packaging service '{}' failed", service.name))?;

        let artifact = match &service.artifact {
            Some(pattern) => Some(self.find_artifact(pattern)?.with_context(|| {
                format!(
                    "Packaging service '{}' produced no file matching '{}'",
                    service.name, pattern
                )
            })?),
            None => None,
        };
        Ok(PackageOutput {
            service: service.name.clone(),
            artifact,
        })
    }
}

#[async_trait]
impl Provisioner for ScriptLifecycle {
    async fn provision(&self, env: &Environment, preview: bool) -> Result<ProvisionOutput> {
        let Some(infra) = &self.project.infra else {
            return Ok(ProvisionOutput {
                preview,
                ..Default::default()
            });
        };
        let command = if preview {
            infra
                .preview
                .as_deref()
                .context("No preview command configured under [infra]")?
        } else {
            infra.provision.as_str()
        };
        let cwd = match &infra.working_dir {
            Some(dir) => self.project.root.join(dir),
            None => self.project.root.clone(),
        };

        let outputs_file =
            std::env::temp_dir().join(format!("shipyard-outputs-{}.env", uuid::Uuid::new_v4()));
        let mut vars = env.values();
        vars.insert("SHIPYARD_PROJECT_NAME".into(), self.project.project.name.clone());
        vars.insert(
            "SHIPYARD_OUTPUTS_FILE".into(),
            outputs_file.to_string_lossy().to_string(),
        );

        let result = run_script(command, &cwd, &vars).await;
        let outputs = if outputs_file.is_file() {
            let outputs = read_outputs(&outputs_file);
            let _ = std::fs::remove_file(&outputs_file);
            outputs
        } else {
            Ok(BTreeMap::new())
        };
        // A failed script wins over whatever it left in the outputs file.
        result.context("Provisioning failed")?;
        let outputs = outputs?;

        if !preview && !outputs.is_empty() {
            for (key, value) in &outputs {
                env.set(key.clone(), value.clone());
            }
            env.save()
                .context("Failed to store provisioning outputs in the environment")?;
        }
        Ok(ProvisionOutput {
            applied: true,
            preview,
            outputs,
        })
    }
}

fn read_outputs(path: &Path) -> Result<BTreeMap<String, String>> {
    let mut outputs = BTreeMap::new();
    for item in dotenvy::from_path_iter(path)
        .with_context(|| format!("Failed to read provisioning outputs: {}", path.display()))?
    {
        let (key, value) = item.context("Invalid line in provisioning outputs")?;
        outputs.insert(key, value);
    }
    Ok(outputs)
}

#[async_trait]
impl Deployer for ScriptLifecycle {
    async fn deploy(
        &self,
        service: &ServiceConfig,
        env: &Environment,
        package: Option<&Path>,
    ) -> Result<DeployOutput> {
        let Some(command) = &service.deploy else {
            return Ok(DeployOutput {
                service: service.name.clone(),
                artifact: None,
                skipped: true,
            });
        };

        let artifact = match (package, &service.artifact) {
            (Some(path), _) => {
                if !path.exists() {
                    anyhow::bail!("Package '{}' does not exist", path.display());
                }
                Some(path.to_path_buf())
            }
            (None, Some(pattern)) => self.find_artifact(pattern)?,
            (None, None) => None,
        };

        let mut vars = self.service_vars(service, env);
        if let Some(path) = &artifact {
            vars.insert(
                "SHIPYARD_PACKAGE_PATH".into(),
                path.to_string_lossy().to_string(),
            );
        }
        run_script(command, &service.source_dir(&self.project.root), &vars)
            .await
            .with_context(|| format!("Deploying service '{}' failed", service.name))?;

        Ok(DeployOutput {
            service: service.name.clone(),
            artifact,
            skipped: false,
        })
    }
}

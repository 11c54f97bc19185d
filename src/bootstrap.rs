//! Process-wide container wiring.
//!
//! Everything an action needs is registered here. Expensive or fallible
//! services (project file, environment, account manager, lifecycle back end)
//! are lazy so that commands which never touch them never load them.

use crate::account::{AccountManager, LocalAccountManager};
use crate::config::Config;
use crate::container::Container;
use crate::environment::{Environment, EnvironmentManager};
use crate::flags::EnvFlag;
use crate::lifecycle::{Deployer, Packager, Provisioner, ScriptLifecycle};
use crate::middleware::{HooksMiddleware, MiddlewareRunner, TelemetryMiddleware, UxMiddleware};
use crate::project::ProjectConfig;
use crate::ui::Console;
use std::sync::Arc;

/// Build the container for one invocation.
///
/// `env_flag` is the selector the command bound from `--environment`; the
/// environment is resolved from it on first use.
pub fn build_container(config: &Config, console: Arc<dyn Console>, env_flag: &EnvFlag) -> Arc<Container> {
    let container = Arc::new(Container::new());

    container.register_instance(config.clone());
    container.register_instance(console.clone());
    container.register_instance(env_flag.clone());
    container.register_instance(EnvironmentManager::new(&config.project_dir));

    container.register_lazy::<Environment, _>(|c| {
        let manager: EnvironmentManager = c.resolve()?;
        let selected = c.resolve::<EnvFlag>()?.get();
        let env = manager.resolve(selected.as_deref())?;
        tracing::debug!(environment = %env.name(), "environment loaded");
        Ok(env)
    });

    container.register_lazy::<Arc<ProjectConfig>, _>(|c| {
        let config: Config = c.resolve()?;
        Ok(Arc::new(ProjectConfig::load(&config.project_dir)?))
    });

    container.register_lazy::<Arc<dyn AccountManager>, _>(|c| {
        let config: Config = c.resolve()?;
        let accounts: Arc<dyn AccountManager> =
            Arc::new(LocalAccountManager::new(config.user_config()?));
        Ok(accounts)
    });

    container.register_lazy::<Arc<ScriptLifecycle>, _>(|c| {
        Ok(Arc::new(ScriptLifecycle::new(c.resolve()?)))
    });
    container.register_lazy::<Arc<dyn Packager>, _>(|c| {
        let lifecycle: Arc<dyn Packager> = c.resolve::<Arc<ScriptLifecycle>>()?;
        Ok(lifecycle)
    });
    container.register_lazy::<Arc<dyn Provisioner>, _>(|c| {
        let lifecycle: Arc<dyn Provisioner> = c.resolve::<Arc<ScriptLifecycle>>()?;
        Ok(lifecycle)
    });
    container.register_lazy::<Arc<dyn Deployer>, _>(|c| {
        let lifecycle: Arc<dyn Deployer> = c.resolve::<Arc<ScriptLifecycle>>()?;
        Ok(lifecycle)
    });

    let runner = build_runner(&container, console);
    container.register_instance(Arc::new(runner));
    container
}

/// The standard middleware chain, outermost first.
pub fn build_runner(container: &Arc<Container>, console: Arc<dyn Console>) -> MiddlewareRunner {
    MiddlewareRunner::new()
        .with(Arc::new(TelemetryMiddleware))
        .with(Arc::new(UxMiddleware::new(console.clone())))
        .with(Arc::new(HooksMiddleware::new(container, console)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{DeployAction, DeployFlags, PackageAction, PackageFlags};
    use crate::container::ActionInitializer;
    use crate::errors::ActionError;
    use crate::flags::GlobalCommandOptions;
    use crate::project::PROJECT_FILE;
    use crate::testing::RecordingConsole;
    use tempfile::tempdir;

    fn config(dir: &std::path::Path) -> Config {
        let mut config = Config::from_options(&GlobalCommandOptions {
            cwd: Some(dir.to_path_buf()),
            debug: false,
            no_prompt: true,
        })
        .unwrap();
        config.user_config_dir = Some(dir.join("user"));
        config
    }

    #[test]
    fn test_environment_resolves_from_selector() {
        let dir = tempdir().unwrap();
        let manager = EnvironmentManager::new(dir.path());
        manager.create("dev").unwrap();
        manager.create("prod").unwrap();
        manager.set_default("dev").unwrap();

        let env_flag = EnvFlag::new(Some("prod".into()));
        let container = build_container(
            &config(dir.path()),
            Arc::new(RecordingConsole::new()),
            &env_flag,
        );

        let env = container.resolve::<Environment>().unwrap();
        assert_eq!(env.name(), "prod");
        assert!(env.is_same(&container.resolve::<Environment>().unwrap()));
    }

    #[test]
    fn test_missing_environment_is_initialization_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(PROJECT_FILE), "[project]\nname = \"demo\"\n").unwrap();
        let env_flag = EnvFlag::default();
        let container = build_container(
            &config(dir.path()),
            Arc::new(RecordingConsole::new()),
            &env_flag,
        );
        container.register_instance(DeployFlags::default());

        let init = ActionInitializer::<DeployAction>::from_container("deploy", &container);
        match init.initialize() {
            Err(err @ ActionError::Initialization { .. }) => {
                assert!(err.to_string().contains("no environment selected"))
            }
            Err(other) => panic!("Expected Initialization, got {other:?}"),
            Ok(_) => panic!("Expected Initialization error"),
        }
    }

    #[test]
    fn test_actions_resolve_with_project_and_environment() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(PROJECT_FILE), "[project]\nname = \"demo\"\n").unwrap();
        EnvironmentManager::new(dir.path()).create("dev").unwrap();
        let env_flag = EnvFlag::new(Some("dev".into()));
        let container = build_container(
            &config(dir.path()),
            Arc::new(RecordingConsole::new()),
            &env_flag,
        );
        container.register_instance(PackageFlags::default());

        let init = ActionInitializer::<PackageAction>::from_container("package", &container);
        assert!(init.initialize().is_ok());
        assert_eq!(container.resolve::<Arc<MiddlewareRunner>>().unwrap().len(), 3);
    }
}

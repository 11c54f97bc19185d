//! Integration tests for shipyard
//!
//! These drive the binary end to end against throwaway projects whose
//! lifecycle commands are small shell scripts.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const PROJECT: &str = r#"
[project]
name = "todo"

[infra]
provision = "echo \"API_URL=https://$SHIPYARD_ENV_NAME.example.com\" > \"$SHIPYARD_OUTPUTS_FILE\" && echo provisioned >> steps.log"

[[services]]
name = "api"
package = "mkdir -p dist && echo api > dist/api.tgz && echo package:api >> steps.log"
artifact = "dist/api.tgz"
deploy = "echo deploy:api:$(basename \"$SHIPYARD_PACKAGE_PATH\") >> steps.log"

[[services]]
name = "web"
package = "echo package:web >> steps.log"
deploy = "echo deploy:web >> steps.log"
"#;

/// Helper to create a shipyard Command isolated from the user's config
fn shipyard(home: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("shipyard");
    cmd.env("SHIPYARD_CONFIG_DIR", home.path())
        .env_remove("SHIPYARD_ENVIRONMENT")
        .env_remove("SHIPYARD_NO_PROMPT")
        .env_remove("RUST_LOG");
    cmd
}

/// A user config with a default subscription and location
fn create_home() -> TempDir {
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join("config.toml"),
        "[defaults]\nsubscription = \"sub-123\"\nlocation = \"westus\"\n",
    )
    .unwrap();
    home
}

/// A project directory with `shipyard.toml` and a `dev` environment
fn create_project(home: &TempDir, manifest: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("shipyard.toml"), manifest).unwrap();
    shipyard(home)
        .current_dir(dir.path())
        .args(["env", "new", "dev"])
        .assert()
        .success();
    dir
}

fn steps(dir: &TempDir) -> Vec<String> {
    fs::read_to_string(dir.path().join("steps.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_shipyard_help() {
        let home = create_home();
        shipyard(&home)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("up"))
            .stdout(predicate::str::contains("provision"));
    }

    #[test]
    fn test_shipyard_version() {
        let home = create_home();
        shipyard(&home).arg("--version").assert().success();
    }

    #[test]
    fn test_up_help_hides_deprecated_flags() {
        let home = create_home();
        shipyard(&home)
            .args(["up", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--environment"))
            .stdout(predicate::str::contains("--no-progress").not())
            .stdout(predicate::str::contains("--service ").not());
    }

    #[test]
    fn test_unknown_command_fails() {
        let home = create_home();
        shipyard(&home).arg("launch").assert().failure();
    }
}

// =============================================================================
// Environment Tests
// =============================================================================

mod environments {
    use super::*;

    #[test]
    fn test_env_new_list_select() {
        let home = create_home();
        let dir = create_project(&home, PROJECT);

        shipyard(&home)
            .current_dir(dir.path())
            .args(["env", "new", "prod", "--location", "eastus"])
            .assert()
            .success()
            .stdout(predicate::str::contains("New environment"));

        shipyard(&home)
            .current_dir(dir.path())
            .args(["env", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("dev"))
            .stdout(predicate::str::contains("prod (default)"));

        shipyard(&home)
            .current_dir(dir.path())
            .args(["env", "select", "dev"])
            .assert()
            .success();

        shipyard(&home)
            .current_dir(dir.path())
            .args(["env", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("dev (default)"));

        let env_file = fs::read_to_string(dir.path().join(".shipyard/prod/.env")).unwrap();
        assert!(env_file.contains("SHIPYARD_LOCATION=\"eastus\""));
    }

    #[test]
    fn test_env_new_rejects_duplicate_and_invalid_names() {
        let home = create_home();
        let dir = create_project(&home, PROJECT);

        shipyard(&home)
            .current_dir(dir.path())
            .args(["env", "new", "dev"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));

        shipyard(&home)
            .current_dir(dir.path())
            .args(["env", "new", "bad name"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid environment name"));
    }

    #[test]
    fn test_env_select_unknown() {
        let home = create_home();
        let dir = create_project(&home, PROJECT);

        shipyard(&home)
            .current_dir(dir.path())
            .args(["env", "select", "qa"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("environment 'qa' not found"));
    }
}

// =============================================================================
// Up Tests
// =============================================================================

mod up {
    use super::*;

    #[test]
    fn test_up_runs_package_provision_deploy_in_order() {
        let home = create_home();
        let dir = create_project(&home, PROJECT);

        shipyard(&home)
            .current_dir(dir.path())
            .args(["up", "--no-prompt"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Packaging service"))
            .stdout(predicate::str::contains("Deployed 2 service(s)"))
            .stdout(predicate::str::contains("SUCCESS"));

        assert_eq!(
            steps(&dir),
            vec![
                "package:api",
                "package:web",
                "provisioned",
                "deploy:api:api.tgz",
                "deploy:web",
            ]
        );

        let env_file = fs::read_to_string(dir.path().join(".shipyard/dev/.env")).unwrap();
        assert!(env_file.contains("SHIPYARD_SUBSCRIPTION_ID=\"sub-123\""));
        assert!(env_file.contains("SHIPYARD_LOCATION=\"westus\""));
        assert!(env_file.contains("API_URL=\"https://dev.example.com\""));
    }

    #[test]
    fn test_up_reports_success_once() {
        let home = create_home();
        let dir = create_project(&home, PROJECT);

        let output = shipyard(&home)
            .current_dir(dir.path())
            .args(["up", "--no-prompt"])
            .output()
            .unwrap();
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert_eq!(stdout.matches("SUCCESS").count(), 1);
    }

    #[test]
    fn test_up_with_explicit_environment() {
        let home = create_home();
        let dir = create_project(&home, PROJECT);
        shipyard(&home)
            .current_dir(dir.path())
            .args(["env", "new", "prod"])
            .assert()
            .success();
        shipyard(&home)
            .current_dir(dir.path())
            .args(["env", "select", "dev"])
            .assert()
            .success();

        shipyard(&home)
            .current_dir(dir.path())
            .args(["up", "--no-prompt", "-e", "prod"])
            .assert()
            .success()
            .stdout(predicate::str::contains("environment prod"));

        let prod = fs::read_to_string(dir.path().join(".shipyard/prod/.env")).unwrap();
        assert!(prod.contains("API_URL=\"https://prod.example.com\""));
        let dev = fs::read_to_string(dir.path().join(".shipyard/dev/.env")).unwrap();
        assert!(!dev.contains("API_URL"));
    }

    #[test]
    fn test_up_deprecated_service_flag_targets_one_service() {
        let home = create_home();
        let dir = create_project(&home, PROJECT);

        shipyard(&home)
            .current_dir(dir.path())
            .args(["up", "--no-prompt", "--service", "web"])
            .assert()
            .success()
            .stderr(predicate::str::contains("'--service' flag is deprecated").count(1));

        let steps = steps(&dir);
        assert!(steps.contains(&"deploy:web".to_string()));
        assert!(!steps.iter().any(|s| s.starts_with("deploy:api")));
        // Packaging is not narrowed by the deploy target.
        assert!(steps.contains(&"package:api".to_string()));
    }

    #[test]
    fn test_up_deprecated_no_progress_warns_once() {
        let home = create_home();
        let dir = create_project(&home, PROJECT);

        shipyard(&home)
            .current_dir(dir.path())
            .args(["up", "--no-prompt", "--no-progress"])
            .assert()
            .success()
            .stderr(predicate::str::contains("'--no-progress' flag is deprecated").count(1));
    }

    #[test]
    fn test_up_stops_when_provision_fails() {
        let home = create_home();
        let manifest = PROJECT.replace(
            "provision = \"echo",
            "provision = \"echo broken >&2 && exit 3 && echo",
        );
        let dir = create_project(&home, &manifest);

        shipyard(&home)
            .current_dir(dir.path())
            .args(["up", "--no-prompt"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("ERROR:"))
            .stderr(predicate::str::contains("exit code 3"))
            .stdout(predicate::str::contains("SUCCESS").not());

        let steps = steps(&dir);
        assert_eq!(steps, vec!["package:api", "package:web"]);
    }

    #[test]
    fn test_up_without_account_defaults_fails_non_interactive() {
        let home = TempDir::new().unwrap();
        let dir = create_project(&home, PROJECT);

        shipyard(&home)
            .current_dir(dir.path())
            .args(["up", "--no-prompt"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("subscription"));

        assert!(steps(&dir).is_empty());
    }

    #[test]
    fn test_up_without_environment_fails_before_running() {
        let home = create_home();
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("shipyard.toml"), PROJECT).unwrap();

        shipyard(&home)
            .current_dir(dir.path())
            .args(["up", "--no-prompt"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to initialize the 'up' action"))
            .stderr(predicate::str::contains("no environment selected"));

        assert!(steps(&dir).is_empty());
    }

    #[test]
    fn test_up_from_subdirectory_with_cwd_flag() {
        let home = create_home();
        let dir = create_project(&home, PROJECT);
        let nested = dir.path().join("src/nested");
        fs::create_dir_all(&nested).unwrap();

        shipyard(&home)
            .arg("--cwd")
            .arg(&nested)
            .args(["up", "--no-prompt"])
            .assert()
            .success();

        assert_eq!(steps(&dir).len(), 5);
    }
}

// =============================================================================
// Hook Tests
// =============================================================================

mod hooks {
    use super::*;

    #[test]
    fn test_hooks_wrap_each_step() {
        let home = create_home();
        let manifest = format!(
            "{}\n{}",
            PROJECT,
            r#"
[[hooks]]
event = "preup"
command = "echo hook:preup >> steps.log"

[[hooks]]
event = "preprovision"
command = "echo hook:preprovision >> steps.log"

[[hooks]]
event = "postdeploy"
command = "echo hook:postdeploy >> steps.log"

[[hooks]]
event = "postup"
command = "echo hook:postup:$SHIPYARD_HOOK_EVENT >> steps.log"
"#
        );
        let dir = create_project(&home, &manifest);

        shipyard(&home)
            .current_dir(dir.path())
            .args(["up", "--no-prompt"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Running preprovision hook"));

        assert_eq!(
            steps(&dir),
            vec![
                "hook:preup",
                "package:api",
                "package:web",
                "hook:preprovision",
                "provisioned",
                "deploy:api:api.tgz",
                "deploy:web",
                "hook:postdeploy",
                "hook:postup:postup",
            ]
        );
    }

    #[test]
    fn test_failing_pre_hook_blocks_command() {
        let home = create_home();
        let manifest = format!(
            "{}\n[[hooks]]\nevent = \"predeploy\"\ncommand = \"echo nope >&2; exit 2\"\n",
            PROJECT
        );
        let dir = create_project(&home, &manifest);

        shipyard(&home)
            .current_dir(dir.path())
            .args(["deploy", "--no-prompt"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("predeploy hook failed"));

        assert!(steps(&dir).is_empty());
    }

    #[test]
    fn test_continue_on_error_hook_warns() {
        let home = create_home();
        let manifest = format!(
            "{}\n[[hooks]]\nevent = \"prepackage\"\ncommand = \"exit 5\"\ncontinue_on_error = true\n",
            PROJECT
        );
        let dir = create_project(&home, &manifest);

        shipyard(&home)
            .current_dir(dir.path())
            .args(["package"])
            .assert()
            .success()
            .stderr(predicate::str::contains("WARNING: prepackage hook failed"));

        assert_eq!(steps(&dir), vec!["package:api", "package:web"]);
    }
}

// =============================================================================
// Standalone Command Tests
// =============================================================================

mod commands {
    use super::*;

    #[test]
    fn test_package_single_service() {
        let home = create_home();
        let dir = create_project(&home, PROJECT);

        shipyard(&home)
            .current_dir(dir.path())
            .args(["package", "api"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Package:"))
            .stdout(predicate::str::contains("Packaged 1 service(s)"));

        assert_eq!(steps(&dir), vec!["package:api"]);
        assert!(dir.path().join("dist/api.tgz").is_file());
    }

    #[test]
    fn test_package_service_without_artifact() {
        let home = create_home();
        let dir = create_project(&home, PROJECT);

        shipyard(&home)
            .current_dir(dir.path())
            .args(["package", "web"])
            .assert()
            .success()
            .stdout(predicate::str::contains("no artifact produced"))
            .stdout(predicate::str::contains("Packaged 1 service(s)"));

        assert_eq!(steps(&dir), vec!["package:web"]);
    }

    #[test]
    fn test_deploy_single_service() {
        let home = create_home();
        let dir = create_project(&home, PROJECT);

        shipyard(&home)
            .current_dir(dir.path())
            .args(["deploy", "web"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Deployed 1 service(s)"))
            .stderr(predicate::str::contains("deprecated").not());

        assert_eq!(steps(&dir), vec!["deploy:web"]);
    }

    #[test]
    fn test_deploy_deprecated_service_flag_warns_once() {
        let home = create_home();
        let dir = create_project(&home, PROJECT);
        fs::create_dir_all(dir.path().join("dist")).unwrap();
        fs::write(dir.path().join("dist/api.tgz"), "tgz").unwrap();

        shipyard(&home)
            .current_dir(dir.path())
            .args(["deploy", "--service", "api"])
            .assert()
            .success()
            .stderr(predicate::str::contains("'--service' flag is deprecated").count(1));

        assert_eq!(steps(&dir), vec!["deploy:api:api.tgz"]);
    }

    #[test]
    fn test_package_unknown_service() {
        let home = create_home();
        let dir = create_project(&home, PROJECT);

        shipyard(&home)
            .current_dir(dir.path())
            .args(["package", "db"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("available: api, web"));
    }

    #[test]
    fn test_provision_preview_without_command() {
        let home = create_home();
        let dir = create_project(&home, PROJECT);

        shipyard(&home)
            .current_dir(dir.path())
            .args(["provision", "--preview"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No preview command configured"));
    }

    #[test]
    fn test_deploy_from_package() {
        let home = create_home();
        let dir = create_project(&home, PROJECT);
        fs::write(dir.path().join("release.zip"), "zip").unwrap();

        shipyard(&home)
            .current_dir(dir.path())
            .args(["deploy", "api", "--from-package"])
            .arg(dir.path().join("release.zip"))
            .assert()
            .success();

        assert_eq!(steps(&dir), vec!["deploy:api:release.zip"]);
    }

    #[test]
    fn test_deploy_from_package_requires_single_service() {
        let home = create_home();
        let dir = create_project(&home, PROJECT);

        shipyard(&home)
            .current_dir(dir.path())
            .args(["deploy", "--from-package", "release.zip"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("requires a single service"));
    }

    #[test]
    fn test_missing_project_file() {
        let home = create_home();
        let dir = TempDir::new().unwrap();
        shipyard(&home)
            .current_dir(dir.path())
            .args(["env", "new", "dev"])
            .assert()
            .success();

        shipyard(&home)
            .current_dir(dir.path())
            .args(["package"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("project file not found"));
    }
}

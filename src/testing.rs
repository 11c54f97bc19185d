//! Test doubles shared by unit tests.

use crate::account::{AccountManager, Location, Subscription};
use crate::environment::Environment;
use crate::lifecycle::{
    DeployOutput, Deployer, PackageOutput, Packager, ProvisionOutput, Provisioner,
};
use crate::project::ServiceConfig;
use crate::ui::{Console, Handles, SharedWriter};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// In-memory writer whose clones share one buffer.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock().unwrap()).to_string()
    }

    /// Contents with ANSI styling removed.
    pub fn plain(&self) -> String {
        console::strip_ansi_codes(&self.contents()).to_string()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Console that records messages and answers prompts from a script.
pub struct RecordingConsole {
    handles: Handles,
    stdout: CaptureBuffer,
    stderr: CaptureBuffer,
    messages: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
    selections: Mutex<VecDeque<usize>>,
    interactive: bool,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::build(false, Vec::new())
    }

    /// Interactive console answering prompts with `selections` in order.
    pub fn interactive(selections: Vec<usize>) -> Self {
        Self::build(true, selections)
    }

    fn build(interactive: bool, selections: Vec<usize>) -> Self {
        let stdout = CaptureBuffer::default();
        let stderr = CaptureBuffer::default();
        Self {
            handles: Handles {
                stdout: SharedWriter::new(stdout.clone()),
                stderr: SharedWriter::new(stderr.clone()),
            },
            stdout,
            stderr,
            messages: Mutex::default(),
            prompts: Mutex::default(),
            selections: Mutex::new(selections.into()),
            interactive,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn stderr(&self) -> String {
        self.stderr.plain()
    }

    pub fn stdout(&self) -> String {
        self.stdout.plain()
    }
}

impl Console for RecordingConsole {
    fn message(&self, msg: &str) {
        self.messages.lock().unwrap().push(msg.to_string());
        let mut out = self.handles.stdout.clone();
        let _ = writeln!(out, "{}", msg);
    }

    fn handles(&self) -> &Handles {
        &self.handles
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn select(&self, prompt: &str, items: &[String], default: usize) -> Result<usize> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let choice = self.selections.lock().unwrap().pop_front().unwrap_or(default);
        if choice >= items.len() {
            anyhow::bail!("selection {} out of range for '{}'", choice, prompt);
        }
        Ok(choice)
    }
}

/// Account manager with fixed answers.
#[derive(Default)]
pub struct FakeAccounts {
    pub subscriptions: Vec<Subscription>,
    pub default_subscription: Option<String>,
    pub locations: Vec<Location>,
    pub default_location: Option<String>,
    pub fail: bool,
}

impl FakeAccounts {
    pub fn with_defaults(subscription: &str, location: &str) -> Self {
        Self {
            subscriptions: vec![Subscription {
                id: subscription.into(),
                name: subscription.into(),
            }],
            default_subscription: Some(subscription.into()),
            locations: vec![Location {
                name: location.into(),
                display_name: location.into(),
            }],
            default_location: Some(location.into()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            anyhow::bail!("account service unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl AccountManager for FakeAccounts {
    async fn subscriptions(&self) -> Result<Vec<Subscription>> {
        self.check()?;
        Ok(self.subscriptions.clone())
    }

    async fn default_subscription(&self) -> Result<Option<String>> {
        self.check()?;
        Ok(self.default_subscription.clone())
    }

    async fn locations(&self, _subscription_id: &str) -> Result<Vec<Location>> {
        self.check()?;
        Ok(self.locations.clone())
    }

    async fn default_location(&self) -> Result<Option<String>> {
        self.check()?;
        Ok(self.default_location.clone())
    }
}

/// Shared, ordered record of lifecycle calls.
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Lifecycle back end that records calls and can be told to fail.
#[derive(Default, Clone)]
pub struct FakeLifecycle {
    pub log: CallLog,
    pub fail_package: bool,
    pub fail_provision: bool,
    pub fail_deploy: bool,
    /// Package commands run but leave no artifact behind.
    pub no_artifacts: bool,
}

impl FakeLifecycle {
    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.log.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Packager for FakeLifecycle {
    async fn package(&self, service: &ServiceConfig, _env: &Environment) -> Result<PackageOutput> {
        self.record(format!("package:{}", service.name));
        if self.fail_package {
            anyhow::bail!("package failed for {}", service.name);
        }
        let artifact = (service.package.is_some() && !self.no_artifacts)
            .then(|| PathBuf::from(format!("dist/{}.zip", service.name)));
        Ok(PackageOutput {
            service: service.name.clone(),
            artifact,
        })
    }
}

#[async_trait]
impl Provisioner for FakeLifecycle {
    async fn provision(&self, env: &Environment, preview: bool) -> Result<ProvisionOutput> {
        self.record(format!("provision:{}:preview={}", env.name(), preview));
        if self.fail_provision {
            anyhow::bail!("provision failed");
        }
        Ok(ProvisionOutput {
            applied: true,
            preview,
            outputs: Default::default(),
        })
    }
}

#[async_trait]
impl Deployer for FakeLifecycle {
    async fn deploy(
        &self,
        service: &ServiceConfig,
        _env: &Environment,
        package: Option<&Path>,
    ) -> Result<DeployOutput> {
        self.record(format!(
            "deploy:{}:{}",
            service.name,
            package.map(|p| p.display().to_string()).unwrap_or_default()
        ));
        if self.fail_deploy {
            anyhow::bail!("deploy failed for {}", service.name);
        }
        Ok(DeployOutput {
            service: service.name.clone(),
            artifact: package.map(Path::to_path_buf),
            skipped: false,
        })
    }
}

/// A service with package and deploy commands.
pub fn service(name: &str) -> ServiceConfig {
    ServiceConfig {
        name: name.into(),
        path: None,
        package: Some("true".into()),
        artifact: None,
        deploy: Some("true".into()),
    }
}

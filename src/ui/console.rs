//! User-facing console abstraction.
//!
//! Actions never write to the process streams directly; they go through a
//! [`Console`] so that nested steps share one output channel and tests can
//! capture everything that was printed.

use anyhow::{Context, Result};
use dialoguer::{Select, theme::ColorfulTheme};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// A cloneable, thread-safe writer.
#[derive(Clone)]
pub struct SharedWriter {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl SharedWriter {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .flush()
    }
}

impl std::fmt::Debug for SharedWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedWriter").finish_non_exhaustive()
    }
}

/// Output streams of a console.
#[derive(Debug, Clone)]
pub struct Handles {
    pub stdout: SharedWriter,
    pub stderr: SharedWriter,
}

impl Handles {
    pub fn standard() -> Self {
        Self {
            stdout: SharedWriter::stdout(),
            stderr: SharedWriter::stderr(),
        }
    }
}

pub trait Console: Send + Sync {
    /// Print one line of user-facing output to stdout.
    fn message(&self, msg: &str);

    fn handles(&self) -> &Handles;

    /// Whether prompts may be shown.
    fn is_interactive(&self) -> bool;

    /// Ask the user to pick one of `items`; returns the chosen index.
    fn select(&self, prompt: &str, items: &[String], default: usize) -> Result<usize>;

    /// Write one line to stderr. Write failures are dropped.
    fn warn(&self, msg: &str) {
        let mut stderr = self.handles().stderr.clone();
        let _ = writeln!(stderr, "{}", msg);
    }
}

/// Console bound to the process terminal.
pub struct TerminalConsole {
    handles: Handles,
    interactive: bool,
}

impl TerminalConsole {
    /// `no_prompt` disables prompts even on a terminal.
    pub fn new(no_prompt: bool) -> Self {
        let interactive = !no_prompt && console::Term::stdout().is_term();
        Self {
            handles: Handles::standard(),
            interactive,
        }
    }

    pub fn with_handles(handles: Handles, interactive: bool) -> Self {
        Self {
            handles,
            interactive,
        }
    }
}

impl Console for TerminalConsole {
    fn message(&self, msg: &str) {
        let mut stdout = self.handles.stdout.clone();
        if writeln!(stdout, "{}", msg).is_err() {
            eprintln!("{}", msg);
        }
    }

    fn handles(&self) -> &Handles {
        &self.handles
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn select(&self, prompt: &str, items: &[String], default: usize) -> Result<usize> {
        if !self.interactive {
            anyhow::bail!("cannot prompt for '{}' in non-interactive mode", prompt);
        }
        Select::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .items(items)
            .default(default.min(items.len().saturating_sub(1)))
            .interact()
            .with_context(|| format!("Failed to read selection for '{}'", prompt))
    }
}

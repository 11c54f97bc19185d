//! Text styling helpers shared by the console and the middleware.

use console::style;
use std::time::Duration;

/// Yellow text for warnings written to stderr.
pub fn warning(msg: impl AsRef<str>) -> String {
    style(msg.as_ref()).yellow().for_stderr().to_string()
}

/// Red bold text for the final error line.
pub fn error(msg: impl AsRef<str>) -> String {
    style(msg.as_ref()).red().bold().for_stderr().to_string()
}

pub fn success(msg: impl AsRef<str>) -> String {
    style(msg.as_ref()).green().bold().to_string()
}

/// Cyan text used for commands, services and environment names.
pub fn highlight(msg: impl AsRef<str>) -> String {
    style(msg.as_ref()).cyan().to_string()
}

pub fn dim(msg: impl AsRef<str>) -> String {
    style(msg.as_ref()).dim().to_string()
}

/// Standard deprecation warning for a flag that is still accepted.
pub fn deprecated_flag(flag: &str) -> String {
    warning(format!(
        "WARNING: The '{}' flag is deprecated and will be removed in a future release.",
        flag
    ))
}

/// `Xs` below a minute, `Xm Ys` from a minute on.
pub fn elapsed(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

pub mod console;
pub mod format;
pub mod icons;

pub use console::{Console, Handles, SharedWriter, TerminalConsole};

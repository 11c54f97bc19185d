//! Shared UI icons.
//!
//! Each icon falls back to plain ASCII on terminals without emoji support.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK] ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR] ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");

// Step indicators
pub static PACKAGE: Emoji<'_, '_> = Emoji("📦 ", "");
pub static CLOUD: Emoji<'_, '_> = Emoji("☁️  ", "");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "");
pub static HOOK: Emoji<'_, '_> = Emoji("🪝 ", "");

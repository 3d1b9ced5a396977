//! Colored output for pkgfetch
//!
//! Uses owo-colors for terminal colors. Every line goes through the shared
//! progress display so concurrent download bars are not torn by log output.

use super::progress;
use owo_colors::OwoColorize;
use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Enable or disable debug lines
pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

fn out(line: String) {
    progress::multi().suspend(|| println!("{}", line));
}

fn err(line: String) {
    progress::multi().suspend(|| eprintln!("{}", line));
}

/// Print an action header (blue, bold)
/// Example: "==> Downloading packages..."
pub fn action(message: &str) {
    out(format!("{} {}", "==>".blue().bold(), message.bold()));
}

/// Print an action with package counter (blue, bold)
/// Example: "(1/5) Installing linux-5.11.13.arch1-1-x86_64.pkg.tar.zst"
pub fn action_numbered(current: usize, total: usize, message: &str) {
    out(format!(
        "{} {}",
        format!("({}/{})", current, total).cyan(),
        message.bold()
    ));
}

/// Print a sub-action (cyan arrow)
/// Example: "  -> decompressing"
pub fn sub_action(phase: &str) {
    out(format!("  {} {}", "->".cyan(), phase));
}

/// Print a detail line (dimmed prefix)
/// Example: "     GET https://... returned 200: OK"
pub fn detail(message: &str) {
    out(format!("     {}", message.dimmed()));
}

/// Print a debug line, only in verbose mode
pub fn debug(message: &str) {
    if is_verbose() {
        err(format!("{} {}", "debug:".dimmed(), message.dimmed()));
    }
}

/// Print a success message (green)
pub fn success(message: &str) {
    out(format!("{} {}", "==>".green().bold(), message.green()));
}

/// Print an info message (cyan)
pub fn info(message: &str) {
    out(format!("{} {}", "::".cyan(), message));
}

/// Print a warning message (yellow)
pub fn warning(message: &str) {
    err(format!("{} {}", "warning:".yellow().bold(), message.yellow()));
}

/// Print an error message (red)
pub fn error(message: &str) {
    err(format!("{} {}", "error:".red().bold(), message.red()));
}

/// Print a skip message (dimmed)
/// Example: "==> usr/bin/tar already exists, skipping"
pub fn skip(message: &str) {
    out(format!("{} {}", "==>".dimmed(), message.dimmed()));
}

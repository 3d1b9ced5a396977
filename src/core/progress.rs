//! Progress reporting
//!
//! The fetch and install code only sees the [`ProgressSink`] capability. The
//! terminal implementation draws one indicatif bar per active download or
//! install, all attached to a single shared `MultiProgress`.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::OnceLock;
use std::time::Duration;

/// Standard spinner characters
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Standard tick interval for spinners
const TICK_INTERVAL_MS: u64 = 80;

/// Labels longer than this are cut and suffixed with "..."
const MAX_LABEL_CHARS: usize = 36;

/// Per-operation progress handle: one download or one install.
pub trait ProgressTracker: Send + Sync {
    /// Total amount of work in bytes. Zero means unknown.
    fn set_total(&self, total: u64);
    fn advance(&self, bytes: u64);
    fn finish(&self);
}

/// Hands out a tracker for each labelled operation.
pub trait ProgressSink: Send + Sync {
    fn track(&self, label: &str) -> Box<dyn ProgressTracker>;
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn track(&self, _label: &str) -> Box<dyn ProgressTracker> {
        Box::new(NoProgress)
    }
}

impl ProgressTracker for NoProgress {
    fn set_total(&self, _total: u64) {}
    fn advance(&self, _bytes: u64) {}
    fn finish(&self) {}
}

/// Terminal progress bars.
#[derive(Debug, Default, Clone, Copy)]
pub struct BarProgress;

impl ProgressSink for BarProgress {
    fn track(&self, label: &str) -> Box<dyn ProgressTracker> {
        let pb = multi().add(create_spinner(&shorten_label(label)));
        Box::new(BarTracker(pb))
    }
}

struct BarTracker(ProgressBar);

impl ProgressTracker for BarTracker {
    fn set_total(&self, total: u64) {
        if total > 0 {
            upgrade_to_bytes(&self.0, total);
        }
    }

    fn advance(&self, bytes: u64) {
        self.0.inc(bytes);
    }

    fn finish(&self) {
        self.0.finish();
    }
}

/// The shared multi-bar display. Output helpers print through it.
pub fn multi() -> &'static MultiProgress {
    static MULTI: OnceLock<MultiProgress> = OnceLock::new();
    MULTI.get_or_init(MultiProgress::new)
}

/// Cut a label to the width the bars are laid out for.
pub fn shorten_label(label: &str) -> String {
    if label.chars().count() < MAX_LABEL_CHARS {
        return label.to_string();
    }
    let head: String = label.chars().take(MAX_LABEL_CHARS - 3).collect();
    format!("{}...", head)
}

/// Create a spinner progress bar with standard styling.
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("     {spinner:.cyan} {msg:36}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(SPINNER_CHARS),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(TICK_INTERVAL_MS));
    pb
}

/// Upgrade a spinner to a byte progress bar when the total becomes known.
pub fn upgrade_to_bytes(pb: &ProgressBar, total_bytes: u64) {
    pb.set_length(total_bytes);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "     {spinner:.cyan} {msg:36} [{bar:30.cyan/dim}] {bytes}/{total_bytes} ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸━"),
    );
}

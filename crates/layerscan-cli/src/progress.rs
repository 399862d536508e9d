//! Progress spinner for CLI operations.

use console::Term;
use indicatif::ProgressBar;
use indicatif::ProgressState;
use indicatif::ProgressStyle;
use layerscan_core::ProgressCallback;
use std::fmt::Write;
use std::time::Duration;

/// CLI spinner wrapper implementing `ProgressCallback`.
///
/// The total number of entries in a layer is unknown until the stream ends,
/// so a spinner with entry count and bytes seen is shown instead of a bar.
/// Automatically cleans up on drop.
pub struct CliProgress {
    bar: ProgressBar,
    bytes_seen: u64,
}

impl CliProgress {
    /// Creates a new CLI spinner.
    ///
    /// # Arguments
    ///
    /// * `message` - Message to display (e.g., "Inspecting")
    #[must_use]
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();

        // Template: "⠋ Inspecting 1024 entries (15.2 MB, 12s)"
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {prefix} {pos} entries ({msg}, {elapsed_short})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .with_key("elapsed_short", |state: &ProgressState, w: &mut dyn Write| {
                    write!(w, "{}s", state.elapsed().as_secs()).unwrap_or(());
                }),
        );
        bar.set_prefix(message.to_string());
        bar.set_message(humanize_bytes(0));
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar, bytes_seen: 0 }
    }

    /// Creates a spinner that draws nothing.
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            bytes_seen: 0,
        }
    }

    /// Checks if we should show progress (TTY detection).
    #[must_use]
    pub fn should_show() -> bool {
        Term::stderr().is_term()
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for CliProgress {
    fn on_entry(&mut self, _path: &str, size: u64) {
        self.bytes_seen += size;
        self.bar.set_message(humanize_bytes(self.bytes_seen));
        self.bar.inc(1);
    }

    fn on_complete(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Converts bytes to human-readable format (KB, MB, GB, TB).
pub fn humanize_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.1} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

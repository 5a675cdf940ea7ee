//! Batch progress display.

use indicatif::{ProgressBar, ProgressStyle};
use sheetsplit_files::{FileOutcome, FileState};

/// Batch progress tracker, one tick per finished file
pub struct BatchProgress {
    bar: ProgressBar,
}

impl BatchProgress {
    /// Create a hidden tracker (used for machine-readable output)
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Create a visible tracker
    #[must_use]
    pub fn visible() -> Self {
        let bar = ProgressBar::new(0);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} files {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("#>-"),
        );

        Self { bar }
    }

    /// Handle to the underlying bar, for writers that must not overwrite it
    #[must_use]
    pub fn bar(&self) -> ProgressBar {
        self.bar.clone()
    }

    /// Set the number of files in the batch
    pub fn start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
    }

    /// Record one finished file
    pub fn record(&self, outcome: &FileOutcome) {
        let name = outcome
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mark = match outcome.state() {
            FileState::Archived => "done",
            FileState::Rejected => "rejected",
            _ => "failed",
        };
        self.bar.set_message(format!("{name} ({mark})"));
        self.bar.inc(1);
    }

    /// Finish with custom message
    pub fn finish_with_message(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }

    /// Abandon the progress bar (for errors)
    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

/// Human-readable size with binary units, used in batch summaries
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = UNITS[0];

    for &next in &UNITS[1..] {
        if size < 1024.0 {
            break;
        }
        size /= 1024.0;
        unit = next;
    }

    format!("{size:.2} {unit}")
}

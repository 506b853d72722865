//! Batch progress display for a run over many work units

use std::sync::LazyLock;

use indicatif::{ProgressBar, ProgressStyle};

use crate::algorithm::unit::WorkResult;
use crate::io::configuration::PROGRESS_BAR_WIDTH;

static BATCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "[{{elapsed_precise}}] Units: [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} {{msg}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Tracks resolved units on a single progress bar
///
/// The message shows the failure tally and the most recently resolved unit.
pub struct ProgressManager {
    bar: Option<ProgressBar>,
    resolved: usize,
    failed: usize,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressManager {
    /// Create a manager with no bar attached yet
    pub const fn new() -> Self {
        Self {
            bar: None,
            resolved: 0,
            failed: 0,
        }
    }

    /// Show a bar sized to the number of units
    pub fn initialize(&mut self, unit_count: usize) {
        let bar = ProgressBar::new(unit_count as u64);
        bar.set_style(BATCH_STYLE.clone());
        self.bar = Some(bar);
        self.resolved = 0;
        self.failed = 0;
    }

    /// Record one resolved unit
    pub fn record(&mut self, result: &WorkResult) {
        self.resolved += 1;
        if !result.is_success() {
            self.failed += 1;
        }
        if let Some(ref bar) = self.bar {
            bar.inc(1);
            bar.set_message(format!("{} failed | {}", self.failed, result.unit()));
        }
    }

    /// Units resolved so far
    pub const fn resolved(&self) -> usize {
        self.resolved
    }

    /// Units that failed so far
    pub const fn failed(&self) -> usize {
        self.failed
    }

    /// Clear the bar from the terminal
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

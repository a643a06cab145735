//! Download progress reporting.
//!
//! Progress is best-effort user feedback: the fetcher reports cumulative bytes
//! through a [`ProgressReporter`] handed to it at construction. The default
//! [`NoProgress`] discards updates; [`BarProgress`] renders an `indicatif`
//! bar on stderr, or a spinner when the server did not declare a length.

use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Receives download progress updates.
pub trait ProgressReporter {
    /// Report `current` bytes transferred out of `total`, when known.
    fn update(&self, current: u64, total: Option<u64>);

    /// Mark the current transfer as complete.
    fn finish(&self);
}

/// A reporter that ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn update(&self, _current: u64, _total: Option<u64>) {}

    fn finish(&self) {}
}

/// Terminal progress bar backed by `indicatif`.
///
/// A bar is created lazily on the first update of each transfer and cleared by
/// [`ProgressReporter::finish`], so one reporter can serve every download of a
/// run.
#[derive(Default)]
pub struct BarProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl fmt::Debug for BarProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BarProgress").finish_non_exhaustive()
    }
}

impl BarProgress {
    /// Create a reporter with no active bar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressReporter for BarProgress {
    fn update(&self, current: u64, total: Option<u64>) {
        let mut slot = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        let bar = slot.get_or_insert_with(|| new_bar(total));
        bar.set_position(current);
    }

    fn finish(&self) {
        let mut slot = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bar) = slot.take() {
            bar.finish_and_clear();
        }
    }
}

fn new_bar(total: Option<u64>) -> ProgressBar {
    match total {
        Some(len) => {
            let bar = ProgressBar::new(len);
            let style = ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes}")
                .map_or_else(|_| ProgressStyle::default_bar(), |s| s.progress_chars("#>-"));
            bar.set_style(style);
            bar
        }
        None => {
            let bar = ProgressBar::new_spinner();
            let style = ProgressStyle::default_spinner()
                .template("{spinner:.green} {bytes} downloaded")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            bar.set_style(style);
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        }
    }
}

/// Select the reporter for a run.
#[must_use]
pub fn reporter_for(enabled: bool) -> Box<dyn ProgressReporter> {
    if enabled {
        Box::new(BarProgress::new())
    } else {
        Box::new(NoProgress)
    }
}

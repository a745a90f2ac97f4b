//! Progress reporting for directory runs.

use indicatif::{ProgressBar, ProgressStyle};

/// Receives progress events from the orchestration layer
pub trait Progress {
    /// Called once with the number of files about to be visited
    fn begin(&mut self, total: usize);

    /// Called after each file is handled, whether it was processed or skipped
    fn advance(&mut self, file_name: &str);

    fn finish(&mut self);
}

/// Reporter that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl Progress for SilentProgress {
    fn begin(&mut self, _total: usize) {}

    fn advance(&mut self, _file_name: &str) {}

    fn finish(&mut self) {}
}

/// Terminal progress bar backed by indicatif
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        // Hidden until we know how many files there are
        BarProgress {
            bar: ProgressBar::hidden(),
        }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        BarProgress::new()
    }
}

impl Progress for BarProgress {
    fn begin(&mut self, total: usize) {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        self.bar = bar;
    }

    fn advance(&mut self, file_name: &str) {
        self.bar.set_message(file_name.to_string());
        self.bar.inc(1);
    }

    fn finish(&mut self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_tracks_position() {
        let mut progress = BarProgress::new();
        progress.begin(3);
        progress.advance("a.php");
        progress.advance("b.php");
        assert_eq!(progress.bar.position(), 2);
        assert_eq!(progress.bar.length(), Some(3));
        progress.finish();
        assert!(progress.bar.is_finished());
    }

    #[test]
    fn test_silent_progress_is_usable_as_trait_object() {
        let mut silent = SilentProgress;
        let progress: &mut dyn Progress = &mut silent;
        progress.begin(10);
        progress.advance("x.js");
        progress.finish();
    }
}

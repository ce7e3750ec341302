//! Terminal progress display for conversion jobs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use ocrbridge::error::{ConversionError, ErrorClassifier};
use ocrbridge::services::ProgressReporter;

use super::icons::success;

/// Spinner showing the current stage and the latest status line.
pub struct SpinnerProgress {
    bar: ProgressBar,
    step: AtomicUsize,
    total_steps: usize,
}

impl SpinnerProgress {
    pub fn new(total_steps: usize, message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {prefix:.dim} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        let progress = Self {
            bar,
            step: AtomicUsize::new(0),
            total_steps,
        };
        progress.update_prefix();
        progress.bar.set_message(message.to_string());
        progress
    }

    fn update_prefix(&self) {
        let step = (self.step.load(Ordering::Relaxed) + 1).min(self.total_steps);
        self.bar.set_prefix(format!("[{}/{}]", step, self.total_steps));
    }

    /// Stop the spinner and leave a success line behind.
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(format!("{} {}", success(), message));
    }

    /// Stop the spinner without a final line.
    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for SpinnerProgress {
    fn advance_step(&self) {
        self.step.fetch_add(1, Ordering::Relaxed);
        self.update_prefix();
    }

    fn report_timing(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn report_error(&self, error: &ConversionError, context: &str) {
        let classified = ErrorClassifier::new().classify(error);
        tracing::debug!(context, kind = ?classified.kind, "{}", classified.technical_detail);
        self.bar.abandon_with_message(format!(
            "{} {} failed: {}",
            super::icons::error(),
            context,
            classified.user_message
        ));
    }
}

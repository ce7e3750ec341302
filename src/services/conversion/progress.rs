//! Progress collaborator driven by the conversion services.

use crate::error::ConversionError;

/// Receives progress notifications from submission, polling and retrieval.
///
/// Implementations must be cheap and non-blocking; they are called inline
/// from the async flow.
pub trait ProgressReporter: Send + Sync {
    /// A pipeline stage finished (submitted, completed, retrieved).
    fn advance_step(&self);

    /// Status line with elapsed time, emitted on every poll iteration.
    fn report_timing(&self, message: &str);

    /// Called with every error before it propagates.
    fn report_error(&self, error: &ConversionError, context: &str);
}

/// Discards all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn advance_step(&self) {}

    fn report_timing(&self, _message: &str) {}

    fn report_error(&self, _error: &ConversionError, _context: &str) {}
}

/// Forwards progress to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn advance_step(&self) {}

    fn report_timing(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn report_error(&self, error: &ConversionError, context: &str) {
        tracing::warn!(context, "{}", error);
    }
}

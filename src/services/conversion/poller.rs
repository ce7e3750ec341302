//! Status polling with backoff, an attempt ceiling and cooperative cancellation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::api::ConversionApi;
use super::progress::ProgressReporter;
use crate::config::PollingConfig;
use crate::error::{ConversionError, Result};
use crate::models::{Job, JobStatus, StatusRecord};
use crate::utils::format_elapsed;

/// Wait schedule between status queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    /// Attempt number from which `backoff_multiplier` applies.
    pub backoff_after: u32,
    pub backoff_multiplier: u32,
    /// Maximum number of status queries.
    pub max_polls: u32,
}

impl From<&PollingConfig> for PollSchedule {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms),
            backoff_after: config.backoff_after,
            backoff_multiplier: config.backoff_multiplier.max(1),
            max_polls: config.max_polls.max(1),
        }
    }
}

impl PollSchedule {
    /// Wait after the `attempt`-th query (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt >= self.backoff_after {
            self.interval.saturating_mul(self.backoff_multiplier)
        } else {
            self.interval
        }
    }
}

/// Polls a job until it completes, fails or exhausts its attempts.
pub struct StatusPoller {
    api: Arc<dyn ConversionApi>,
    schedule: PollSchedule,
}

impl StatusPoller {
    pub fn new(api: Arc<dyn ConversionApi>, schedule: PollSchedule) -> Self {
        Self { api, schedule }
    }

    /// Poll until a terminal state and return the completed record.
    ///
    /// A job reporting `error` fails with [`ConversionError::Processing`];
    /// running out of attempts fails with [`ConversionError::Timeout`].
    pub async fn poll(
        &self,
        job_id: &str,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<StatusRecord> {
        self.poll_with(job_id, progress, cancel, |_| {}).await
    }

    /// Like [`poll`](Self::poll), recording status transitions on `job`.
    pub async fn poll_job(
        &self,
        job: &mut Job,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<StatusRecord> {
        let job_id = job.id.clone();
        self.poll_with(&job_id, progress, cancel, |record| {
            if job.transition(record.status.clone()) {
                info!(job_id = %job_id, status = %record.status, "Job status changed");
            }
        })
        .await
    }

    /// Issue a single status query.
    pub async fn check(&self, job_id: &str) -> Result<StatusRecord> {
        self.query(job_id, Instant::now()).await
    }

    async fn query(&self, job_id: &str, started: Instant) -> Result<StatusRecord> {
        let response = self
            .api
            .status(job_id)
            .await
            .map_err(|e| ConversionError::StatusCheck {
                job_id: job_id.to_string(),
                status: None,
                message: e.into_detail(),
            })?;

        if !response.is_success() {
            let status = response.status.as_u16();
            return Err(ConversionError::StatusCheck {
                job_id: job_id.to_string(),
                status: Some(status),
                message: format!("HTTP {}: {}", status, response.body_preview()),
            });
        }

        let body: Value = response.json().map_err(|e| {
            ConversionError::InvalidResponse(format!(
                "Status for job {} is not JSON: {}",
                job_id, e
            ))
        })?;

        Ok(StatusRecord::from_response(body, started.elapsed()))
    }

    async fn poll_with(
        &self,
        job_id: &str,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
        mut on_status: impl FnMut(&StatusRecord),
    ) -> Result<StatusRecord> {
        let started = Instant::now();
        let max_polls = self.schedule.max_polls;

        for attempt in 1..=max_polls {
            if cancel.is_cancelled() {
                return Err(cancelled(job_id));
            }

            let result = self.query(job_id, started).await;

            if cancel.is_cancelled() {
                debug!(job_id, attempt, "Discarding status response after cancellation");
                return Err(cancelled(job_id));
            }

            let record = result?;
            progress.report_timing(&status_message(&record, attempt, max_polls));
            on_status(&record);

            match record.status {
                JobStatus::Completed => {
                    debug!(job_id, attempt, "Job completed");
                    return Ok(record);
                }
                JobStatus::Error => {
                    return Err(ConversionError::Processing {
                        job_id: job_id.to_string(),
                        message: record.error_message.unwrap_or_else(|| {
                            "The service reported an error without details".to_string()
                        }),
                    });
                }
                JobStatus::Other(ref state) if !state.is_empty() => {
                    debug!(job_id, state = %state, "Unrecognized job state, still polling");
                }
                _ => {}
            }

            if attempt == max_polls {
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(job_id)),
                _ = tokio::time::sleep(self.schedule.delay_for(attempt)) => {}
            }
        }

        Err(ConversionError::Timeout {
            job_id: job_id.to_string(),
            attempts: max_polls,
        })
    }
}

fn cancelled(job_id: &str) -> ConversionError {
    ConversionError::Cancelled {
        job_id: job_id.to_string(),
    }
}

/// Progress line for one poll iteration.
pub fn status_message(record: &StatusRecord, attempt: u32, max_polls: u32) -> String {
    let state = if record.status.as_str().is_empty() {
        "unknown"
    } else {
        record.status.as_str()
    };
    let mut message = format!("Status: {}", state);

    let mut details = Vec::new();
    if let Some(percent) = record.percent_done {
        details.push(format!("{:.0}%", percent));
    }
    if let (Some(done), Some(total)) = (record.pages_completed, record.total_pages) {
        details.push(format!("{}/{} pages", done, total));
    }
    if !details.is_empty() {
        message.push_str(&format!(" ({})", details.join(", ")));
    }

    message.push_str(&format!(
        " after {} [poll {}/{}]",
        format_elapsed(record.elapsed),
        attempt,
        max_polls
    ));
    message
}

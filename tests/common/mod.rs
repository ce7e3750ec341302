//! Scripted conversion API and recording progress for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use ocrbridge::config::Config;
use ocrbridge::http_client::{HttpResponse, TransportError};
use ocrbridge::services::conversion::{ConversionApi, UploadRequest};
use ocrbridge::services::ProgressReporter;
use ocrbridge::ConversionError;
use serde_json::Value;

/// Replays queued responses per endpoint and records what was sent.
#[derive(Default)]
pub struct ScriptedApi {
    submits: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    statuses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    downloads: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    pub uploads: Mutex<Vec<UploadRequest>>,
    pub downloaded: Mutex<Vec<(String, String)>>,
    pub submit_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub download_calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_submit(self, status: u16, body: Value) -> Self {
        push(&self.submits, Ok(HttpResponse::json_body(status, &body)));
        self
    }

    pub fn on_status(self, status: u16, body: Value) -> Self {
        push(&self.statuses, Ok(HttpResponse::json_body(status, &body)));
        self
    }

    pub fn on_download(self, status: u16, body: &[u8]) -> Self {
        push(&self.downloads, Ok(HttpResponse::from_bytes(status, body)));
        self
    }

    pub fn on_status_failure(self, message: &str) -> Self {
        self.on_status_error(TransportError::new(message))
    }

    pub fn on_status_error(self, error: TransportError) -> Self {
        push(&self.statuses, Err(error));
        self
    }

    /// Queue the same status body `times` times.
    pub fn on_status_repeated(self, times: usize, body: Value) -> Self {
        (0..times).fold(self, |api, _| api.on_status(200, body.clone()))
    }

    pub fn total_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
            + self.status_calls.load(Ordering::SeqCst)
            + self.download_calls.load(Ordering::SeqCst)
    }

    pub fn status_count(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    /// Options JSON of the most recent upload.
    pub fn last_options(&self) -> Value {
        let uploads = self.uploads.lock().unwrap();
        let request = uploads.last().expect("no upload recorded");
        serde_json::from_str(&request.options_json).unwrap()
    }
}

fn push(
    queue: &Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    item: Result<HttpResponse, TransportError>,
) {
    queue.lock().unwrap().push_back(item);
}

fn pop(
    queue: &Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    endpoint: &str,
) -> Result<HttpResponse, TransportError> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(TransportError::new(format!("no scripted {} response", endpoint))))
}

#[async_trait]
impl ConversionApi for ScriptedApi {
    async fn submit(&self, request: UploadRequest) -> Result<HttpResponse, TransportError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.uploads.lock().unwrap().push(request);
        pop(&self.submits, "submit")
    }

    async fn status(&self, _job_id: &str) -> Result<HttpResponse, TransportError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        pop(&self.statuses, "status")
    }

    async fn download(
        &self,
        job_id: &str,
        extension: &str,
    ) -> Result<HttpResponse, TransportError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        self.downloaded
            .lock()
            .unwrap()
            .push((job_id.to_string(), extension.to_string()));
        pop(&self.downloads, "download")
    }

    fn credential_hint(&self) -> Option<String> {
        Some("...cdef".to_string())
    }
}

/// Records every notification it receives.
#[derive(Default)]
pub struct RecordingProgress {
    pub steps: AtomicUsize,
    pub timings: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<(String, String)>>,
}

impl RecordingProgress {
    pub fn steps(&self) -> usize {
        self.steps.load(Ordering::SeqCst)
    }

    pub fn timings(&self) -> Vec<String> {
        self.timings.lock().unwrap().clone()
    }

    /// Recorded `(context, message)` pairs.
    pub fn errors(&self) -> Vec<(String, String)> {
        self.errors.lock().unwrap().clone()
    }
}

impl ProgressReporter for RecordingProgress {
    fn advance_step(&self) {
        self.steps.fetch_add(1, Ordering::SeqCst);
    }

    fn report_timing(&self, message: &str) {
        self.timings.lock().unwrap().push(message.to_string());
    }

    fn report_error(&self, error: &ConversionError, context: &str) {
        self.errors
            .lock()
            .unwrap()
            .push((context.to_string(), error.to_string()));
    }
}

/// Config with a fast polling schedule.
pub fn fast_config(max_polls: u32) -> Config {
    let mut config = Config::default();
    config.polling.interval_ms = 1;
    config.polling.backoff_after = 3;
    config.polling.backoff_multiplier = 2;
    config.polling.max_polls = max_polls;
    config
}

/// Minimal PNG header; enough for content sniffing.
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
];

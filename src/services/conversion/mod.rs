//! Conversion job service.
//!
//! Ties submission, status polling, retrieval, normalization and analysis
//! together behind [`ConversionClient`]. Normalized results and analyses are
//! cached per job id for the lifetime of the client; every error is passed to
//! the [`ProgressReporter`] before it propagates.

mod api;
mod download;
mod poller;
mod progress;
mod remote;
mod submit;

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub use api::{ConversionApi, UploadRequest};
pub use download::{
    extension_for, is_text_extension, supported_formats, Download, Payload, ResultRetriever,
};
pub use poller::{status_message, PollSchedule, StatusPoller};
pub use progress::{LogProgress, NoopProgress, ProgressReporter};
pub use remote::RemoteApi;
pub use submit::{extract_job_id, JobSubmitter, RequestSnapshot, SourceFile};

use crate::cache::WriteOnceCache;
use crate::config::Config;
use crate::error::Result;
use crate::models::{ContentAnalysis, Job, NormalizedResult, ProcessingOptions, StatusRecord};
use crate::ocr::{AnalysisOptions, ContentAnalyzer, ResponseNormalizer};

/// A finished conversion.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub job: Job,
    pub record: StatusRecord,
    pub result: Arc<NormalizedResult>,
}

/// Orchestrates the full job lifecycle against one conversion API.
pub struct ConversionClient {
    submitter: JobSubmitter,
    poller: StatusPoller,
    retriever: ResultRetriever,
    normalizer: ResponseNormalizer,
    analyzer: ContentAnalyzer,
    results: WriteOnceCache<NormalizedResult>,
    analyses: WriteOnceCache<ContentAnalysis>,
}

/// Cache key for an analysis; per-page breakdowns are cached separately.
fn analysis_key(job_id: &str, options: AnalysisOptions) -> String {
    if options.per_page {
        format!("{}#pages", job_id)
    } else {
        job_id.to_string()
    }
}

/// Pass an error to the reporter before returning it.
fn reported<T>(progress: &dyn ProgressReporter, context: &str, result: Result<T>) -> Result<T> {
    if let Err(ref e) = result {
        progress.report_error(e, context);
    }
    result
}

impl ConversionClient {
    pub fn new(api: Arc<dyn ConversionApi>, config: &Config) -> Self {
        Self {
            submitter: JobSubmitter::new(api.clone(), config),
            poller: StatusPoller::new(api.clone(), PollSchedule::from(&config.polling)),
            retriever: ResultRetriever::new(api),
            normalizer: ResponseNormalizer::new(),
            analyzer: ContentAnalyzer::new(),
            results: WriteOnceCache::new(),
            analyses: WriteOnceCache::new(),
        }
    }

    /// Build a client talking to the configured remote API.
    pub fn from_config(config: &Config) -> std::result::Result<Self, String> {
        let api = RemoteApi::from_config(&config.api)?;
        Ok(Self::new(Arc::new(api), config))
    }

    pub fn with_normalizer(mut self, normalizer: ResponseNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn submitter(&self) -> &JobSubmitter {
        &self.submitter
    }

    pub fn poller(&self) -> &StatusPoller {
        &self.poller
    }

    pub async fn submit(
        &self,
        file: &SourceFile,
        options: &ProcessingOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<Job> {
        let job = reported(progress, "submit", self.submitter.submit(file, options).await)?;
        progress.advance_step();
        Ok(job)
    }

    pub async fn submit_path(
        &self,
        path: &Path,
        options: &ProcessingOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<Job> {
        let job = reported(
            progress,
            "submit",
            self.submitter.submit_path(path, options).await,
        )?;
        progress.advance_step();
        Ok(job)
    }

    /// Poll a job to completion, recording its status transitions.
    pub async fn wait(
        &self,
        job: &mut Job,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<StatusRecord> {
        let record = reported(
            progress,
            "poll",
            self.poller.poll_job(job, progress, cancel).await,
        )?;
        progress.advance_step();
        Ok(record)
    }

    /// Submit a file, wait for completion and normalize the result.
    pub async fn convert(
        &self,
        file: &SourceFile,
        options: &ProcessingOptions,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<Conversion> {
        let mut job = self.submit(file, options, progress).await?;
        let record = self.wait(&mut job, progress, cancel).await?;
        let result = self.normalize_record(&job.id, &record, progress).await?;
        info!(job_id = %job.id, confidence = result.confidence, "Conversion finished");
        Ok(Conversion {
            job,
            record,
            result,
        })
    }

    /// Normalized result for an existing job, polling it if not cached.
    pub async fn result_for(
        &self,
        job_id: &str,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<Arc<NormalizedResult>> {
        if let Some(cached) = self.results.get(job_id) {
            return Ok(cached);
        }
        let record = reported(
            progress,
            "poll",
            self.poller.poll(job_id, progress, cancel).await,
        )?;
        progress.advance_step();
        self.normalize_record(job_id, &record, progress).await
    }

    /// Normalize a completed record and cache it.
    ///
    /// Document jobs carry no primary text in their status; the Markdown
    /// output is fetched to fill it.
    async fn normalize_record(
        &self,
        job_id: &str,
        record: &StatusRecord,
        progress: &dyn ProgressReporter,
    ) -> Result<Arc<NormalizedResult>> {
        if let Some(cached) = self.results.get(job_id) {
            return Ok(cached);
        }

        let mut raw = record.results.clone().unwrap_or_else(|| record.raw.clone());
        let has_text = raw
            .get("text")
            .and_then(Value::as_str)
            .is_some_and(|t| !t.is_empty());

        if !has_text {
            let download = reported(
                progress,
                "download",
                self.retriever.download(job_id, "mmd").await,
            )?;
            if let (Value::Object(map), Payload::Text(text)) = (&mut raw, download.payload) {
                map.insert("text".to_string(), Value::String(text));
            }
        }

        let result = self.normalizer.normalize(raw);
        for warning in &result.warnings {
            tracing::warn!(job_id, "{}", warning);
        }
        progress.advance_step();
        Ok(self.results.insert(job_id, result))
    }

    /// Download one output format of a completed job.
    pub async fn download(
        &self,
        job_id: &str,
        format: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<Download> {
        let download = reported(
            progress,
            "download",
            self.retriever.download(job_id, format).await,
        )?;
        progress.advance_step();
        Ok(download)
    }

    /// Fetch and analyze the lines data of a completed job.
    pub async fn analyze_job(
        &self,
        job_id: &str,
        options: AnalysisOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<Arc<ContentAnalysis>> {
        let key = analysis_key(job_id, options);
        if let Some(cached) = self.analyses.get(&key) {
            return Ok(cached);
        }
        let document = reported(
            progress,
            "lines",
            self.retriever.fetch_lines(job_id).await,
        )?;
        let analysis = reported(
            progress,
            "analyze",
            self.analyzer.analyze(&document, options),
        )?;
        progress.advance_step();
        Ok(self.analyses.insert(&key, analysis))
    }

    pub fn cached_result(&self, job_id: &str) -> Option<Arc<NormalizedResult>> {
        self.results.get(job_id)
    }

    /// Cached analysis for a job, preferring one with a per-page breakdown.
    pub fn cached_analysis(&self, job_id: &str) -> Option<Arc<ContentAnalysis>> {
        self.analyses
            .get(&analysis_key(job_id, AnalysisOptions { per_page: true }))
            .or_else(|| self.analyses.get(job_id))
    }
}

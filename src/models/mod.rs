//! Data models for conversion jobs, results and lines data.

mod analysis;
mod job;
mod lines;
mod options;
mod result;

pub use analysis::{
    ConfidenceBuckets, ContentAnalysis, ContentCounters, PageAnalysis, HIGH_CONFIDENCE,
    MEDIUM_CONFIDENCE,
};
pub use job::{Job, JobStatus, StatusRecord};
pub use lines::{Line, LinesDocument, Page, Region};
pub use options::{DataOptions, ProcessingOptions};
pub use result::NormalizedResult;

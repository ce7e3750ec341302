//! Service layer for ocrbridge business logic.
//!
//! This module contains domain logic separated from UI concerns.
//! Services report progress through a [`ProgressReporter`](conversion::ProgressReporter)
//! and can be driven by the CLI or embedded in other tools.

pub mod conversion;

pub use conversion::{
    Conversion, ConversionApi, ConversionClient, JobSubmitter, LogProgress, NoopProgress,
    ProgressReporter, RemoteApi, ResultRetriever, SourceFile, StatusPoller,
};

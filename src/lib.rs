//! ocrbridge - asynchronous client for remote OCR conversion jobs.
//!
//! Submits images and documents to a conversion service, polls the resulting
//! jobs to completion, retrieves outputs in several formats, normalizes the
//! loosely-typed responses and computes content statistics over the
//! line-level structural data.
//!
//! ```no_run
//! use ocrbridge::config::Config;
//! use ocrbridge::models::ProcessingOptions;
//! use ocrbridge::services::{ConversionClient, LogProgress, SourceFile};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load().await;
//! let client = ConversionClient::from_config(&config).map_err(anyhow::Error::msg)?;
//! let file = SourceFile::from_path("scan.pdf".as_ref()).await?;
//! let options = ProcessingOptions::default().with_format("docx");
//! let conversion = client
//!     .convert(&file, &options, &LogProgress, &CancellationToken::new())
//!     .await?;
//! println!("{}", conversion.result.text);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod http_client;
pub mod models;
pub mod ocr;
pub mod privacy;
pub mod services;
pub mod utils;

pub use error::{ClassifiedError, ConversionError, ErrorClassifier, ErrorKind};

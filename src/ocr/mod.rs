//! Result processing for converted documents.
//!
//! - `normalize`: raw service responses to [`NormalizedResult`](crate::models::NormalizedResult)
//! - `tables`: TSV to Markdown and table detection
//! - `delimiters`: math delimiter conversion and balance checks
//! - `analysis`: content statistics over lines data
//!
//! Nothing here performs I/O.

mod analysis;
mod delimiters;
mod normalize;
mod tables;

pub use analysis::{classify_line, summarize, AnalysisOptions, ContentAnalyzer};
pub use delimiters::{convert_delimiters, validate_delimiters, DelimiterStyle};
pub use normalize::{ResponseNormalizer, SecondaryFormats};
pub use tables::{detect_table, tsv_to_markdown};

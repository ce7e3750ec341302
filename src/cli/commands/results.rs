//! Output commands: download job outputs and normalize saved responses.

use std::path::{Path, PathBuf};

use console::style;
use ocrbridge::config::Config;
use ocrbridge::models::NormalizedResult;
use ocrbridge::ocr::{DelimiterStyle, ResponseNormalizer};
use ocrbridge::services::conversion::Download;
use ocrbridge::utils::format_size;

use super::client;
use crate::cli::icons::{arrow, success, warning};
use crate::cli::progress::SpinnerProgress;

/// Download one or more formats of a completed job.
pub async fn cmd_download(
    config: &Config,
    job_id: &str,
    formats: &[String],
    output_dir: &Path,
) -> anyhow::Result<()> {
    let client = client(config, None)?;
    tokio::fs::create_dir_all(output_dir).await?;

    let progress = SpinnerProgress::new(formats.len(), &format!("Downloading {}", job_id));
    let mut saved = Vec::with_capacity(formats.len());
    for format in formats {
        let download = client.download(job_id, format, &progress).await?;
        let path = write_download(output_dir, &download).await?;
        saved.push((path, download.payload.len()));
    }
    progress.finish(&format!(
        "Downloaded {} output{}",
        saved.len(),
        if saved.len() == 1 { "" } else { "s" }
    ));

    for (path, size) in saved {
        eprintln!(
            "  {} {} {}",
            arrow(),
            path.display(),
            style(format!("({})", format_size(size as u64))).dim()
        );
    }
    Ok(())
}

/// Normalize a response saved from the service.
pub async fn cmd_normalize(
    path: &Path,
    delimiters: Option<DelimiterStyle>,
    keep_raw: bool,
    json: bool,
) -> anyhow::Result<()> {
    let contents = tokio::fs::read_to_string(path).await?;
    let raw: serde_json::Value = serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("{} is not valid JSON: {}", path.display(), e))?;

    let mut normalizer = ResponseNormalizer::new();
    if let Some(style) = delimiters {
        normalizer = normalizer.with_delimiter_style(style);
    }
    let result = normalizer.normalize(raw);

    if json {
        let output = if keep_raw {
            serde_json::to_string_pretty(&result)?
        } else {
            serde_json::to_string_pretty(&result.without_raw())?
        };
        println!("{}", output);
    } else {
        print_result(&result);
    }
    Ok(())
}

/// Save a download under its natural file name.
pub(super) async fn write_download(dir: &Path, download: &Download) -> anyhow::Result<PathBuf> {
    let path = dir.join(download.file_name());
    tokio::fs::write(&path, download.payload.as_bytes()).await?;
    tracing::info!(
        job_id = %download.job_id,
        format = %download.format,
        path = %path.display(),
        "Saved output"
    );
    Ok(path)
}

fn print_result(result: &NormalizedResult) {
    println!("{}", result.text);
    println!();
    println!(
        "{} Confidence {:.1}%",
        success(),
        result.confidence * 100.0
    );

    let mut flags = Vec::new();
    if result.is_printed {
        flags.push("printed");
    }
    if result.is_handwritten {
        flags.push("handwritten");
    }
    if result.contains_table {
        flags.push("table");
    }
    if result.contains_chemistry {
        flags.push("chemistry");
    }
    if !flags.is_empty() {
        println!("  {} {}", arrow(), flags.join(", "));
    }
    if !result.table_markdown.is_empty() {
        println!("\n{}", result.table_markdown);
    }
    for message in &result.warnings {
        eprintln!("{} {}", warning(), message);
    }
}

//! Job lifecycle commands: submit, status, wait and convert.

use std::path::Path;

use console::style;
use ocrbridge::config::Config;
use ocrbridge::models::StatusRecord;
use ocrbridge::ocr::DelimiterStyle;
use ocrbridge::services::ProgressReporter;
use ocrbridge::utils::{format_elapsed, format_size};

use super::results::write_download;
use super::{client, ctrl_c_token, RequestArgs};
use crate::cli::icons::{arrow, success};
use crate::cli::progress::SpinnerProgress;

/// Upload a file and print the job id.
pub async fn cmd_submit(
    config: &Config,
    path: &Path,
    request: &RequestArgs,
    json: bool,
) -> anyhow::Result<()> {
    let client = client(config, None)?;
    let options = request.processing_options().await?;

    let progress = SpinnerProgress::new(1, &format!("Uploading {}", path.display()));
    let job = client.submit_path(path, &options, &progress).await?;
    progress.clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&job)?);
    } else {
        eprintln!("{} Submitted {}", success(), style(&job.file_name).cyan());
        println!("{}", job.id);
    }
    Ok(())
}

/// Query a job's status once.
pub async fn cmd_status(config: &Config, job_id: &str, json: bool) -> anyhow::Result<()> {
    let client = client(config, None)?;
    let record = client.poller().check(job_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record.raw)?);
    } else {
        print_record(job_id, &record);
    }
    Ok(())
}

/// Poll a job until it reaches a terminal state.
pub async fn cmd_wait(
    config: &Config,
    job_id: &str,
    max_polls: Option<u32>,
    json: bool,
) -> anyhow::Result<()> {
    let mut config = config.clone();
    if let Some(max) = max_polls {
        config.polling.max_polls = max;
    }
    let client = client(&config, None)?;
    let cancel = ctrl_c_token();

    let progress = SpinnerProgress::new(1, &format!("Waiting for job {}", job_id));
    let record = match client.poller().poll(job_id, &progress, &cancel).await {
        Ok(record) => record,
        Err(e) => {
            progress.report_error(&e, "poll");
            return Err(e.into());
        }
    };
    progress.finish(&format!(
        "Job {} completed in {}",
        job_id,
        format_elapsed(record.elapsed)
    ));

    if json {
        println!("{}", serde_json::to_string_pretty(&record.raw)?);
    }
    Ok(())
}

/// Submit, wait and print the normalized result; optionally save outputs.
pub async fn cmd_convert(
    config: &Config,
    path: &Path,
    request: &RequestArgs,
    output_dir: Option<&Path>,
    delimiters: Option<DelimiterStyle>,
    json: bool,
) -> anyhow::Result<()> {
    let client = client(config, delimiters)?;
    let options = request.processing_options().await?;
    let formats = &request.formats;
    let cancel = ctrl_c_token();

    let file = client.submitter().read_source(path).await?;
    let total_steps = 3 + output_dir.map_or(0, |_| formats.len());
    let progress = SpinnerProgress::new(
        total_steps,
        &format!("Uploading {} ({})", file.file_name, format_size(file.size())),
    );

    let conversion = client.convert(&file, &options, &progress, &cancel).await?;

    let mut saved = Vec::new();
    if let Some(dir) = output_dir {
        tokio::fs::create_dir_all(dir).await?;
        for format in formats {
            progress.report_timing(&format!("Downloading {}", format));
            let download = client
                .download(&conversion.job.id, format, &progress)
                .await?;
            saved.push(write_download(dir, &download).await?);
        }
    }

    progress.finish(&format!(
        "Converted {} in {}",
        file.file_name,
        format_elapsed(conversion.record.elapsed)
    ));
    for path in &saved {
        eprintln!("  {} {}", arrow(), path.display());
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&conversion.result.without_raw())?
        );
    } else {
        println!("{}", conversion.result.text);
    }
    Ok(())
}

fn print_record(job_id: &str, record: &StatusRecord) {
    println!("{} {}", style("Job").bold(), job_id);
    let state = match record.status.as_str() {
        "" => "unknown",
        state => state,
    };
    println!("  {:<10} {}", "Status:", state);
    if let Some(percent) = record.percent_done {
        println!("  {:<10} {:.0}%", "Progress:", percent);
    }
    if let (Some(done), Some(total)) = (record.pages_completed, record.total_pages) {
        println!("  {:<10} {}/{}", "Pages:", done, total);
    }
    if let Some(ref message) = record.error_message {
        println!("  {} {}", style("Error:").red(), message);
    }
}

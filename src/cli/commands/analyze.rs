//! Content analysis commands.

use std::path::Path;

use console::style;
use ocrbridge::config::Config;
use ocrbridge::models::{ContentAnalysis, ContentCounters};
use ocrbridge::ocr::{AnalysisOptions, ContentAnalyzer};

use super::client;
use crate::cli::progress::SpinnerProgress;

/// Fetch a job's lines data and analyze it.
pub async fn cmd_analyze_job(
    config: &Config,
    job_id: &str,
    per_page: bool,
    json: bool,
) -> anyhow::Result<()> {
    let client = client(config, None)?;
    let progress = SpinnerProgress::new(1, &format!("Fetching lines data for {}", job_id));
    let analysis = client
        .analyze_job(job_id, AnalysisOptions { per_page }, &progress)
        .await?;
    progress.clear();

    print_analysis(&analysis, json)
}

/// Analyze a lines.json file saved from the service.
pub async fn cmd_analyze_file(path: &Path, per_page: bool, json: bool) -> anyhow::Result<()> {
    let contents = tokio::fs::read_to_string(path).await?;
    let raw: serde_json::Value = serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("{} is not valid JSON: {}", path.display(), e))?;

    let analysis = ContentAnalyzer::new().analyze_value(&raw, AnalysisOptions { per_page })?;
    print_analysis(&analysis, json)
}

fn print_analysis(analysis: &ContentAnalysis, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(analysis)?);
        return Ok(());
    }

    println!("\n{}", style("Content Analysis").bold());
    println!("{}", "-".repeat(50));
    println!("{}", analysis.summary);
    println!();
    println!("  {:<20} {}", "Pages:", analysis.total_pages);
    print_counters(&analysis.counters, analysis.average_confidence);

    if let Some(ref pages) = analysis.pages {
        for page in pages {
            println!("\n{}", style(format!("Page {}", page.page_number)).cyan());
            print_counters(&page.counters, page.average_confidence);
        }
    }
    Ok(())
}

fn print_counters(counters: &ContentCounters, average_confidence: Option<f64>) {
    println!("  {:<20} {}", "Lines:", counters.total_lines);
    println!("  {:<20} {}", "Math:", counters.math_count);
    println!("  {:<20} {}", "Tables:", counters.table_count);
    println!("  {:<20} {}", "Diagrams:", counters.diagram_count);
    println!(
        "  {:<20} {} / {}",
        "Printed/handwritten:", counters.printed_lines, counters.handwritten_lines
    );
    println!("  {:<20} {}", "Characters:", counters.total_characters);

    match average_confidence {
        Some(avg) => {
            let buckets = &counters.confidence_buckets;
            println!("  {:<20} {:.1}%", "Avg confidence:", avg * 100.0);
            println!(
                "  {:<20} {} high, {} medium, {} low",
                "Confidence:", buckets.high, buckets.medium, buckets.low
            );
        }
        None => println!("  {:<20} {}", "Avg confidence:", style("n/a").dim()),
    }

    if !counters.type_counts.is_empty() {
        let types: Vec<String> = counters
            .type_counts
            .iter()
            .map(|(kind, count)| format!("{}={}", kind, count))
            .collect();
        println!("  {:<20} {}", "Types:", style(types.join(" ")).dim());
    }
}

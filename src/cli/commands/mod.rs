//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod analyze;
mod config_cmd;
mod jobs;
mod results;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use tokio_util::sync::CancellationToken;

use ocrbridge::config::Config;
use ocrbridge::models::ProcessingOptions;
use ocrbridge::ocr::{DelimiterStyle, ResponseNormalizer};
use ocrbridge::services::conversion::{extension_for, supported_formats};
use ocrbridge::services::ConversionClient;
use ocrbridge::ErrorClassifier;

use super::icons::{arrow, error};

#[derive(Parser)]
#[command(name = "ocrb")]
#[command(about = "Submit documents for remote OCR conversion and analyze the results")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (before full CLI parsing).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Output and processing flags shared by the submitting commands.
#[derive(clap::Args, Debug, Default)]
pub struct RequestArgs {
    /// Extra output format to request (repeatable), e.g. docx, md, html
    #[arg(short, long = "format")]
    formats: Vec<String>,

    /// Page ranges to convert, e.g. "1-3,7"
    #[arg(short, long)]
    pages: Option<String>,

    /// JSON file with processing options merged over the configured defaults
    #[arg(long)]
    options: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file and print the new job id
    Submit {
        file: PathBuf,
        #[command(flatten)]
        request: RequestArgs,
        /// Print the job as JSON
        #[arg(long)]
        json: bool,
    },

    /// Query the current status of a job once
    Status {
        job_id: String,
        #[arg(long)]
        json: bool,
    },

    /// Poll a job until it completes or fails
    Wait {
        job_id: String,
        /// Override the configured attempt ceiling
        #[arg(long)]
        max_polls: Option<u32>,
        #[arg(long)]
        json: bool,
    },

    /// Submit a file, wait for completion and print the normalized result
    Convert {
        file: PathBuf,
        #[command(flatten)]
        request: RequestArgs,
        /// Write the requested formats into this directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Rewrite math delimiters in text fields
        #[arg(long, value_enum)]
        delimiters: Option<DelimiterStyle>,
        #[arg(long)]
        json: bool,
    },

    /// Download outputs of a completed job
    Download {
        job_id: String,
        #[arg(required = true, help = formats_help())]
        formats: Vec<String>,
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Compute content statistics from a job's line data
    Analyze {
        /// Job id to fetch line data for
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        job_id: Option<String>,
        /// Analyze a local lines.json file instead
        #[arg(long)]
        file: Option<PathBuf>,
        /// Include a per-page breakdown
        #[arg(long)]
        per_page: bool,
        #[arg(long)]
        json: bool,
    },

    /// Normalize a saved service response without contacting the service
    Normalize {
        file: PathBuf,
        #[arg(long, value_enum)]
        delimiters: Option<DelimiterStyle>,
        /// Keep the original response in the JSON output
        #[arg(long)]
        raw: bool,
        #[arg(long)]
        json: bool,
    },

    /// Inspect the effective configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration with secrets redacted
    Show,
    /// Print the path of the loaded config file
    Path,
}

fn formats_help() -> String {
    format!(
        "Formats to fetch: {}",
        supported_formats().collect::<Vec<_>>().join(", ")
    )
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Config::load_from_path(path)
                .await
                .map_err(|e| anyhow::anyhow!(e))?
        }
        None => Config::load().await,
    };

    match cli.command {
        Commands::Submit {
            file,
            request,
            json,
        } => jobs::cmd_submit(&config, &file, &request, json).await,
        Commands::Status { job_id, json } => jobs::cmd_status(&config, &job_id, json).await,
        Commands::Wait {
            job_id,
            max_polls,
            json,
        } => jobs::cmd_wait(&config, &job_id, max_polls, json).await,
        Commands::Convert {
            file,
            request,
            output_dir,
            delimiters,
            json,
        } => {
            jobs::cmd_convert(
                &config,
                &file,
                &request,
                output_dir.as_deref(),
                delimiters,
                json,
            )
            .await
        }
        Commands::Download {
            job_id,
            formats,
            output_dir,
        } => results::cmd_download(&config, &job_id, &formats, &output_dir).await,
        Commands::Analyze {
            job_id,
            file,
            per_page,
            json,
        } => match file {
            Some(path) => analyze::cmd_analyze_file(&path, per_page, json).await,
            None => {
                let job_id = job_id.unwrap_or_default();
                analyze::cmd_analyze_job(&config, &job_id, per_page, json).await
            }
        },
        Commands::Normalize {
            file,
            delimiters,
            raw,
            json,
        } => results::cmd_normalize(&file, delimiters, raw, json).await,
        Commands::Config { command } => match command {
            ConfigCommands::Show => config_cmd::cmd_config_show(&config),
            ConfigCommands::Path => config_cmd::cmd_config_path(&config),
        },
    }
}

/// Print a failure with its classified explanation and next step.
pub fn print_error(err: &anyhow::Error) {
    let classified = ErrorClassifier::new().classify_error(&**err);
    eprintln!("{} {}", error(), style(&classified.user_message).bold());
    eprintln!("  {} {}", arrow(), classified.suggested_action);
    if is_verbose() {
        eprintln!("  {} {:#}", arrow(), err);
    }
}

/// Build a client for the configured service.
fn client(config: &Config, delimiters: Option<DelimiterStyle>) -> anyhow::Result<ConversionClient> {
    config.validate().map_err(|e| anyhow::anyhow!(e))?;
    let mut client = ConversionClient::from_config(config).map_err(|e| anyhow::anyhow!(e))?;
    if let Some(style) = delimiters {
        client = client.with_normalizer(ResponseNormalizer::new().with_delimiter_style(style));
    }
    Ok(client)
}

impl RequestArgs {
    /// Per-request options: an optional JSON file, then the flags.
    ///
    /// Format names are requested under their service extension.
    async fn processing_options(&self) -> anyhow::Result<ProcessingOptions> {
        let mut options = match self.options {
            Some(ref path) => read_options(path).await?,
            None => ProcessingOptions::default(),
        };
        for format in &self.formats {
            let extension = extension_for(format).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown output format '{}'. Supported formats: {}",
                    format,
                    supported_formats().collect::<Vec<_>>().join(", ")
                )
            })?;
            options = options.with_format(extension);
        }
        if let Some(ref pages) = self.pages {
            options = options.with_page_ranges(pages);
        }
        Ok(options)
    }
}

async fn read_options(path: &Path) -> anyhow::Result<ProcessingOptions> {
    let contents = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Invalid options file {}: {}", path.display(), e))
}

/// Token cancelled on Ctrl-C.
fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            child.cancel();
        }
    });
    token
}

//! ocrb - submit documents for remote OCR conversion and analyze the results.
//!
//! A command-line front end for the `ocrbridge` library: uploads images and
//! PDFs, waits for conversion jobs, downloads outputs and reports content
//! statistics.

mod cli;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "ocrbridge=info,ocrb=info"
    } else {
        "ocrbridge=warn,ocrb=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = cli::run().await {
        cli::print_error(&err);
        std::process::exit(1);
    }
}

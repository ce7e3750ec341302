//! Configuration inspection commands.

use console::style;
use ocrbridge::config::Config;

use crate::cli::icons::{arrow, success, warning};

/// Print the effective configuration with the app key redacted.
pub fn cmd_config_show(config: &Config) -> anyhow::Result<()> {
    let redacted = config.redacted();
    let json = serde_json::to_string_pretty(&redacted)?;
    println!("{}", json);

    let hash = config.hash();
    match config.source_path {
        Some(ref path) => eprintln!("  {} Source: {}", arrow(), path.display()),
        None => eprintln!("  {} Source: defaults and environment", arrow()),
    }
    eprintln!("  {} Hash: {}", arrow(), &hash[..16]);

    if let Err(e) = config.validate() {
        eprintln!("{} {}", warning(), e);
    }
    if config.api.credentials().is_none() {
        eprintln!(
            "{} No credentials configured (set {} and {})",
            warning(),
            style("OCRBRIDGE_APP_ID").cyan(),
            style("OCRBRIDGE_APP_KEY").cyan()
        );
    }
    Ok(())
}

/// Print the path of the loaded config file.
pub fn cmd_config_path(config: &Config) -> anyhow::Result<()> {
    match config.source_path {
        Some(ref path) => {
            eprintln!("{} Loaded from", success());
            println!("{}", path.display());
        }
        None => {
            eprintln!(
                "{} No config file found; using defaults and environment",
                warning()
            );
        }
    }
    Ok(())
}

//! Inspect the effective configuration

use clap::Subcommand;
use colored::Colorize;
use qabridge_common::config::default_search_paths;
use qabridge_common::QaBridgeConfig;

use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the merged configuration with the password masked
    Show,

    /// List config files in the order they are merged
    Paths,
}

pub fn execute(cmd: ConfigCommands, config: &QaBridgeConfig, format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Show => show(config, format),
        ConfigCommands::Paths => {
            paths(format);
            Ok(())
        }
    }
}

fn show(config: &QaBridgeConfig, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => output::print_json(&config.redacted()),
        OutputFormat::Table => print!("{}", config.to_redacted_toml()?),
    }
    Ok(())
}

fn paths(format: OutputFormat) {
    let paths = default_search_paths();
    match format {
        OutputFormat::Json => output::print_json(&paths),
        OutputFormat::Table => {
            for path in paths {
                let state = if path.exists() {
                    "found".green()
                } else {
                    "missing".dimmed()
                };
                println!("{} ({})", path.display(), state);
            }
        }
    }
}

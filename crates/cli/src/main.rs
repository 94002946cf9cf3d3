//! QaBridge CLI - Main Entry Point

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use qabridge_cli::commands::{check, config, report, title};
use qabridge_cli::output;
use qabridge_common::QaBridgeConfig;

/// QaBridge - browser UI check and ZenTao defect reporter
#[derive(Parser)]
#[command(name = "qabridge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file to use instead of ~/.qabridge.toml and ./qabridge.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// File bugs for failed or broken test results
    Report(report::ReportArgs),

    /// Run the homepage search check
    Check(check::CheckArgs),

    /// Print the bug title for a test case
    Title(title::TitleArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(config::ConfigCommands),

    /// Show version information
    Version,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<QaBridgeConfig> {
    match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            Ok(QaBridgeConfig::load_layered(&[path])?)
        }
        None => Ok(QaBridgeConfig::load_default()?),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            output::print_error(&format!("Configuration error: {}", e));
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Report(args) => report::execute(args, config, cli.format).await?,
        Commands::Check(args) => check::execute(args, config, cli.format).await?,
        Commands::Title(args) => title::execute(args, cli.format)?,
        Commands::Config(cmd) => config::execute(cmd, &config, cli.format)?,
        Commands::Version => {
            println!("QaBridge CLI v{}", qabridge_common::VERSION);
        }
    }

    Ok(())
}

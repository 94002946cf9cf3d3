//! File bugs for failed test results

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use qabridge_common::{QaBridgeConfig, TrackerConfig};
use qabridge_reporter::{BugReporter, RunReport, ZentaoSession};

use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct ReportArgs {
    /// Directory holding `*-result.json` artifacts (defaults to driver.results_dir)
    #[arg(long)]
    pub results: Option<PathBuf>,

    /// Check for duplicates and render tickets without submitting them
    #[arg(long)]
    pub dry_run: bool,

    /// Tracker base URL
    #[arg(long, env = "QABRIDGE_TRACKER_URL")]
    pub tracker_url: Option<String>,

    /// Tracker account
    #[arg(long, env = "QABRIDGE_TRACKER_ACCOUNT")]
    pub account: Option<String>,

    /// Tracker password
    #[arg(long, env = "QABRIDGE_TRACKER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Product bugs are filed under
    #[arg(long)]
    pub product_id: Option<u32>,

    /// Module bugs are filed under
    #[arg(long)]
    pub module_id: Option<u32>,
}

impl ReportArgs {
    /// Flags and environment take precedence over config files
    pub fn apply_overrides(&self, tracker: &mut TrackerConfig) {
        if let Some(url) = &self.tracker_url {
            tracker.tracker_url = url.clone();
        }
        if let Some(account) = &self.account {
            tracker.account = account.clone();
        }
        if let Some(password) = &self.password {
            tracker.password = password.clone();
        }
        if let Some(product_id) = self.product_id {
            tracker.product_id = product_id;
        }
        if let Some(module_id) = self.module_id {
            tracker.module_id = module_id;
        }
    }
}

pub async fn execute(
    args: ReportArgs,
    config: QaBridgeConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut tracker = config.tracker;
    args.apply_overrides(&mut tracker);

    if let Err(e) = tracker.validate() {
        output::print_error(&format!("Tracker configuration: {}", e));
        std::process::exit(1);
    }

    let results_dir = args.results.unwrap_or(config.driver.results_dir);
    let mut reporter =
        BugReporter::new(ZentaoSession::new(tracker.clone()), tracker).dry_run(args.dry_run);

    let report = match reporter.run(&results_dir).await {
        Ok(report) => report,
        Err(e) => {
            output::print_error(&format!("Reporting aborted: {}", e));
            std::process::exit(1);
        }
    };

    match format {
        OutputFormat::Json => output::print_json(&report),
        OutputFormat::Table => print_summary(&report, args.dry_run),
    }

    Ok(())
}

fn print_summary(report: &RunReport, dry_run: bool) {
    println!();
    println!("{}", "━".repeat(60).dimmed());
    println!("{}", " Defect Report".bold());
    println!("{}", "━".repeat(60).dimmed());
    println!();
    println!("{}  {}", "📂 Results:".bold(), report.results_dir.display());
    println!("   Files parsed: {}", report.files_parsed);
    if !report.malformed_files.is_empty() {
        output::print_warning(&format!(
            "{} result file(s) could not be parsed:",
            report.malformed_files.len()
        ));
        for path in &report.malformed_files {
            println!("     • {}", path.display().to_string().yellow());
        }
    }
    println!();

    if report.cases.is_empty() {
        output::print_success("No failed test cases found");
        return;
    }

    output::print_list(&report.cases, OutputFormat::Table);
    println!();

    println!("{}", "📋 Summary".bold());
    if dry_run {
        output::print_count("Would file:", report.submissions(), colored::Color::Cyan);
    } else {
        output::print_count("Created:", report.created(), colored::Color::Green);
        output::print_count("Unconfirmed:", report.unconfirmed(), colored::Color::Yellow);
        output::print_count("Failed:", report.failed(), colored::Color::Red);
    }
    output::print_count("Skipped:", report.skipped(), colored::Color::White);
    if report.query_failures() > 0 {
        output::print_warning(&format!(
            "Duplicate search failed for {} case(s); they were filed anyway",
            report.query_failures()
        ));
    }
    println!();
}

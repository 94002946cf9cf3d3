//! Run the homepage search check in a browser

use std::path::PathBuf;

use clap::Args;
use qabridge_common::{DriverConfig, QaBridgeConfig};
use qabridge_e2e::{SearchCase, SearchCheckRunner};

use crate::output::{self, OutputFormat};

/// Exit code when cases could not be run at all
const EXIT_SETUP: i32 = 2;

#[derive(Args)]
pub struct CheckArgs {
    /// Directory of YAML case files (defaults to the built-in cases)
    #[arg(long)]
    pub cases: Option<PathBuf>,

    /// Run only the named case
    #[arg(long)]
    pub name: Option<String>,

    /// Run only cases with this tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Run the browser headless (also via USING_HEADLESS=true)
    #[arg(long)]
    pub headless: bool,

    /// Where result artifacts are written
    #[arg(long)]
    pub results_dir: Option<PathBuf>,
}

impl CheckArgs {
    pub fn driver_config(&self, mut driver: DriverConfig) -> DriverConfig {
        driver.apply_env();
        if self.headless {
            driver.headless = true;
        }
        if let Some(dir) = &self.results_dir {
            driver.results_dir = dir.clone();
        }
        driver
    }
}

/// Apply name and tag filters, keeping file order
pub fn select_cases(cases: Vec<SearchCase>, name: Option<&str>, tag: Option<&str>) -> Vec<SearchCase> {
    cases
        .into_iter()
        .filter(|c| name.map_or(true, |n| c.name == n))
        .filter(|c| tag.map_or(true, |t| c.tags.iter().any(|ct| ct == t)))
        .collect()
}

pub async fn execute(
    args: CheckArgs,
    config: QaBridgeConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let all = match &args.cases {
        Some(dir) => match SearchCase::load_all(dir) {
            Ok(cases) => cases,
            Err(e) => {
                output::print_error(&format!("Cannot load cases from {}: {}", dir.display(), e));
                std::process::exit(EXIT_SETUP);
            }
        },
        None => SearchCase::builtin(),
    };

    let cases = select_cases(all, args.name.as_deref(), args.tag.as_deref());
    if cases.is_empty() {
        output::print_error("No cases match the given filters");
        std::process::exit(EXIT_SETUP);
    }

    let driver = args.driver_config(config.driver);
    let runner = match SearchCheckRunner::new(driver).await {
        Ok(runner) => runner,
        Err(e) => {
            output::print_error(&e.to_string());
            std::process::exit(EXIT_SETUP);
        }
    };

    let suite = match runner.run_cases(&cases).await {
        Ok(suite) => suite,
        Err(e) => {
            output::print_error(&e.to_string());
            std::process::exit(EXIT_SETUP);
        }
    };

    if let Err(e) = runner.write_results(&suite) {
        output::print_warning(&format!("Could not write check summary: {}", e));
    }

    match format {
        OutputFormat::Json => output::print_json(&suite),
        OutputFormat::Table => {
            output::print_list(&suite.results, OutputFormat::Table);
            if suite.failed == 0 {
                output::print_success(&format!("{} case(s) passed", suite.passed));
            } else {
                output::print_error(&format!(
                    "{} of {} case(s) failed",
                    suite.failed, suite.total
                ));
                output::print_info(&format!(
                    "Run `qabridge report --results {}` to file bugs",
                    runner.results_dir().display()
                ));
            }
        }
    }

    if suite.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

//! Show the bug title a failing case would be filed under

use clap::Args;
use qabridge_reporter::ticket_title;

use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct TitleArgs {
    /// Test case name
    pub case: String,
}

pub fn execute(args: TitleArgs, format: OutputFormat) -> anyhow::Result<()> {
    let title = ticket_title(&args.case);
    match format {
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "case": args.case,
            "title": title,
        })),
        OutputFormat::Table => println!("{}", title),
    }
    Ok(())
}

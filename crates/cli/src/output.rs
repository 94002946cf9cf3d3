//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use qabridge_e2e::CheckResult;
use qabridge_reporter::{CaseOutcome, CaseReport, DuplicateCheck, TicketOutcome};
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<Cell>;
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No items found.");
                return;
            }

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(T::headers());
            for item in items {
                table.add_row(item.row());
            }

            println!("{table}");
        }
        OutputFormat::Json => print_json(&items),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => print_error(&format!("Could not encode output: {}", e)),
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("✅ {}", message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("⚠️  {}", message);
}

/// Print info message
pub fn print_info(message: &str) {
    println!("ℹ️  {}", message);
}

/// Labelled count line, highlighted when non-zero
pub fn print_count(label: &str, count: usize, highlight: colored::Color) {
    let value = if count == 0 {
        count.to_string().normal()
    } else {
        count.to_string().color(highlight).bold()
    };
    println!("   {:<14} {}", label, value);
}

fn ticket_cell(outcome: &TicketOutcome) -> (String, Color) {
    match outcome {
        TicketOutcome::Created { url, .. } => (format!("created {}", url), Color::Green),
        TicketOutcome::Unconfirmed { url, .. } => (format!("unconfirmed {}", url), Color::Yellow),
        TicketOutcome::Failed { reason, .. } => (format!("failed: {}", reason), Color::Red),
        TicketOutcome::DryRun { .. } => ("dry run".to_string(), Color::Cyan),
    }
}

impl TableDisplay for CaseReport {
    fn headers() -> Vec<&'static str> {
        vec!["Case", "Failures", "Duplicate check", "Tickets"]
    }

    fn row(&self) -> Vec<Cell> {
        let (check, tickets) = match &self.outcome {
            CaseOutcome::Skipped { check } => (
                check,
                Cell::new("skipped (existing bug)").fg(Color::DarkGrey),
            ),
            CaseOutcome::Filed { check, tickets } => {
                let lines: Vec<(String, Color)> = tickets.iter().map(ticket_cell).collect();
                let color = lines
                    .iter()
                    .map(|(_, c)| *c)
                    .find(|c| *c != Color::Green)
                    .unwrap_or(Color::Green);
                let text = lines
                    .into_iter()
                    .map(|(line, _)| line)
                    .collect::<Vec<_>>()
                    .join("\n");
                (check, Cell::new(text).fg(color))
            }
        };

        let check = match check {
            DuplicateCheck::Cached => "cached".to_string(),
            DuplicateCheck::Found => "found".to_string(),
            DuplicateCheck::NotFound => "not found".to_string(),
            DuplicateCheck::QueryFailed(reason) => format!("query failed: {}", reason),
        };

        vec![
            Cell::new(&self.case_name),
            Cell::new(self.failures),
            Cell::new(check),
            tickets,
        ]
    }
}

impl TableDisplay for CheckResult {
    fn headers() -> Vec<&'static str> {
        vec!["Case", "Keyword", "Result", "Duration", "Title / Error"]
    }

    fn row(&self) -> Vec<Cell> {
        let (verdict, color) = if self.success {
            ("PASS", Color::Green)
        } else {
            ("FAIL", Color::Red)
        };
        let detail = if self.success {
            self.final_title.clone().unwrap_or_default()
        } else {
            self.error
                .as_deref()
                .and_then(|e| e.lines().next())
                .unwrap_or("unknown error")
                .to_string()
        };

        vec![
            Cell::new(&self.name),
            Cell::new(&self.keyword),
            Cell::new(verdict).fg(color),
            Cell::new(format!("{} ms", self.duration_ms)),
            Cell::new(detail),
        ]
    }
}

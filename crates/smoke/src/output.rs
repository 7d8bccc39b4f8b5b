//! Output formatting for the harness binary

use std::path::Path;

use clap::ValueEnum;
use tracing::error;

use crate::runner::{write_results, RunOutcome, RunReport};

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// One line per step
    #[default]
    Plain,
    /// The run report as JSON
    Json,
}

/// Print the summary of a finished run
pub fn print_report(report: &RunReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report).unwrap_or_default());
        }
        OutputFormat::Plain => {
            for step in &report.steps {
                let codes: Vec<String> = step
                    .calls
                    .iter()
                    .map(|c| match c.status {
                        Some(status) => format!("{} {} {}", c.method, c.endpoint, status),
                        None => format!("{} {} -", c.method, c.endpoint),
                    })
                    .collect();
                let marker = if step.success { "PASS" } else { "FAIL" };
                println!("{} {} ({} ms) {}", marker, step.name, step.duration_ms, codes.join(", "));
            }
            if let Some(qa) = &report.qa_report {
                println!(
                    "QA severity={} story_match_score={} coverage_score={}",
                    qa.severity, qa.story_match_score, qa.coverage_score
                );
            }
            if report.success() {
                print_success(&format!("{} suite passed", report.suite));
            }
        }
    }
}

/// Save and print a finished run, returning the process exit code.
///
/// A results file that cannot be written is logged; the exit code stays the run's own.
pub fn conclude(outcome: &RunOutcome, results: Option<&Path>, format: OutputFormat) -> i32 {
    if let Some(path) = results {
        if let Err(e) = write_results(&outcome.report, path) {
            error!("Failed to write results to {}: {}", path.display(), e);
        }
    }

    print_report(&outcome.report, format);
    if let Some(e) = &outcome.error {
        print_error(&e.to_string());
    }
    outcome.exit_code()
}

/// Print success message
pub fn print_success(message: &str) {
    println!("✅ {}", message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}

//! Shared helper functions for CLI commands.

use std::future::Future;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::export::{OutputManager, ResultFormat};
use crate::models::CaseSummary;

/// Where command results go besides the console.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputMode {
    /// Print only
    #[default]
    Console,
    /// Also save as JSON in the results directory
    Json,
    /// Also save as indented text in the results directory
    Text,
}

impl OutputMode {
    pub fn format(&self) -> Option<ResultFormat> {
        match self {
            OutputMode::Console => None,
            OutputMode::Json => Some(ResultFormat::Json),
            OutputMode::Text => Some(ResultFormat::Text),
        }
    }
}

/// Run `task` behind a spinner showing `message`.
pub async fn with_spinner<T, F>(message: impl Into<String>, task: F) -> anyhow::Result<T>
where
    F: Future<Output = T>,
{
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.into());
    pb.enable_steady_tick(std::time::Duration::from_millis(120));

    let result = task.await;
    pb.finish_and_clear();
    Ok(result)
}

/// Save `data` under `name` when the output mode asks for a file.
pub async fn save_output<T: Serialize>(
    output: &OutputManager,
    mode: OutputMode,
    data: &T,
    name: &str,
) -> anyhow::Result<()> {
    if let Some(format) = mode.format() {
        let path = output.save_result(data, name, format).await?;
        println!(
            "{} Results saved to: {}",
            style("✓").green(),
            path.display()
        );
    }
    Ok(())
}

/// Print a case summary as two banner sections.
pub fn print_case_summary(summary: &CaseSummary) {
    let heavy = "=".repeat(60);
    let light = "-".repeat(60);

    println!();
    println!("{}", heavy);
    println!("{}", style("CASE INFORMATION").bold());
    println!("{}", heavy);
    for (key, value) in &summary.case_details {
        println!("{}: {}", key, value);
    }

    println!();
    println!("{}", light);
    println!("{}", style("LISTING STATUS").bold());
    println!("{}", light);

    let status = &summary.listing_status;
    let message = if status.is_listed {
        style(status.status_message.as_str()).green().bold()
    } else {
        style(status.status_message.as_str()).dim()
    };
    println!("Status: {}", message);
    if let Some(ref serial) = status.serial_number {
        println!("Serial Number: {}", serial);
    }
    if let Some(ref court) = status.court_name {
        println!("Court Name: {}", court);
    }
    if let Some(ref date) = status.hearing_date {
        println!("Hearing Date: {}", date);
    }
    println!("{}", heavy);
    println!();
}

/// Print a list of options, numbered.
pub fn print_options(title: &str, options: &[String]) {
    println!("{} ({})", style(title).cyan().bold(), options.len());
    if options.is_empty() {
        println!("  {}", style("none").dim());
    }
    for (idx, option) in options.iter().enumerate() {
        println!("  {:>3}. {}", idx + 1, option);
    }
}

/// Human-readable byte count.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

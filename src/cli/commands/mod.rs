//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod case;
mod causelist;
mod results;
mod serve;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use super::helpers::OutputMode;
use crate::config::load_settings;
use crate::models::{BatchRequest, CauseListRequest};

#[derive(Parser)]
#[command(name = "ecourts")]
#[command(about = "Case status and cause-list acquisition for the eCourts portal")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also save results as a file in the results directory
    #[arg(short, long, global = true, value_enum, default_value = "console")]
    output: OutputMode,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Look up one case by CNR or by type, number and year
    Search {
        /// Case Number Reference
        #[arg(long, conflicts_with_all = ["case_type", "case_number", "year"])]
        cnr: Option<String>,
        /// Case type as listed on the portal (e.g. CS)
        #[arg(long, requires_all = ["case_number", "year"])]
        case_type: Option<String>,
        /// Case number
        #[arg(long, requires = "case_type")]
        case_number: Option<String>,
        /// Registration year
        #[arg(long, requires = "case_type")]
        year: Option<String>,
    },

    /// Check listing status for every case in a JSON file
    Check {
        /// JSON array of queries, e.g. [{"search_type": "cnr", "cnr": "..."}]
        #[arg(short, long)]
        file: PathBuf,
        /// Also export found cases as CSV
        #[arg(long)]
        csv: bool,
    },

    /// Cause-list availability for today or tomorrow
    Listing {
        /// Today's cause lists (default)
        #[arg(long, conflicts_with = "tomorrow")]
        today: bool,
        /// Tomorrow's cause lists
        #[arg(long)]
        tomorrow: bool,
    },

    /// List the options of the next location selector
    Options {
        #[arg(long)]
        state: Option<String>,
        #[arg(long, requires = "state")]
        district: Option<String>,
        #[arg(long, requires = "district")]
        complex: Option<String>,
    },

    /// Fetch the current cause-list captcha
    Captcha {
        /// Write the decoded image here instead of printing the data URL
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Download one court's cause list
    Download {
        #[arg(long)]
        state: String,
        #[arg(long)]
        district: String,
        #[arg(long)]
        complex: String,
        #[arg(long)]
        court: String,
        /// Date in DD-MM-YYYY format
        #[arg(long)]
        date: String,
        /// Solved captcha text
        #[arg(long)]
        captcha: String,
    },

    /// Download the cause lists of every court in a complex
    DownloadAll {
        #[arg(long)]
        state: String,
        #[arg(long)]
        district: String,
        #[arg(long)]
        complex: String,
        /// Date in DD-MM-YYYY format
        #[arg(long)]
        date: String,
        /// Solved captcha text
        #[arg(long)]
        captcha: String,
    },

    /// List downloaded cause lists and saved results
    History,

    /// Remove downloads and results older than the retention period
    Cleanup {
        /// Days to keep (defaults to the configured retention)
        #[arg(long)]
        days: Option<u64>,
    },

    /// Start the REST server
    Serve {
        /// Address to bind: "port", "host" or "host:port"
        #[arg(long, default_value = "127.0.0.1:5000")]
        bind: String,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (settings, _config) = load_settings(cli.config.as_deref()).await;
    settings
        .ensure_directories()
        .context("Could not create data directories")?;
    let output = cli.output;

    match cli.command {
        Commands::Search {
            cnr,
            case_type,
            case_number,
            year,
        } => {
            let query = case::query_from_args(cnr, case_type, case_number, year)?;
            case::cmd_search(&settings, &query, output).await
        }
        Commands::Check { file, csv } => case::cmd_check(&settings, &file, csv, output).await,
        Commands::Listing { tomorrow, .. } => {
            case::cmd_listing(&settings, tomorrow, output).await
        }
        Commands::Options {
            state,
            district,
            complex,
        } => {
            causelist::cmd_options(
                &settings,
                state.as_deref(),
                district.as_deref(),
                complex.as_deref(),
            )
            .await
        }
        Commands::Captcha { save } => causelist::cmd_captcha(&settings, save.as_deref()).await,
        Commands::Download {
            state,
            district,
            complex,
            court,
            date,
            captcha,
        } => {
            let request = CauseListRequest {
                state,
                district,
                complex_name: complex,
                court_name: court,
                date,
                captcha,
            };
            causelist::cmd_download(&settings, &request).await
        }
        Commands::DownloadAll {
            state,
            district,
            complex,
            date,
            captcha,
        } => {
            let request = BatchRequest {
                state,
                district,
                complex_name: complex,
                date,
                captcha,
            };
            causelist::cmd_download_all(&settings, &request, output).await
        }
        Commands::History => results::cmd_history(&settings).await,
        Commands::Cleanup { days } => {
            results::cmd_cleanup(&settings, days.unwrap_or(settings.retention_days)).await
        }
        Commands::Serve { bind } => serve::cmd_serve(&settings, &bind).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_download_all() {
        let cli = Cli::try_parse_from([
            "ecourts",
            "--output",
            "json",
            "download-all",
            "--state",
            "Delhi",
            "--district",
            "New Delhi",
            "--complex",
            "Patiala House",
            "--date",
            "19-10-2026",
            "--captcha",
            "x7k2",
        ])
        .unwrap();

        assert_eq!(cli.output, OutputMode::Json);
        assert!(matches!(cli.command, Commands::DownloadAll { ref complex, .. } if complex == "Patiala House"));
    }

    #[test]
    fn test_cli_rejects_cnr_with_details() {
        let result = Cli::try_parse_from([
            "ecourts",
            "search",
            "--cnr",
            "DLND010012342023",
            "--case-type",
            "CS",
            "--case-number",
            "1",
            "--year",
            "2020",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_listing_flags_conflict() {
        assert!(Cli::try_parse_from(["ecourts", "listing", "--today", "--tomorrow"]).is_err());
        assert!(Cli::try_parse_from(["ecourts", "listing"]).is_ok());
    }
}

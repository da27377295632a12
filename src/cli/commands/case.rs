//! Case search, multi-case check and listing commands.

use std::path::Path;

use anyhow::Context;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use super::super::helpers::{print_case_summary, save_output, with_spinner, OutputMode};
use crate::config::Settings;
use crate::export::OutputManager;
use crate::models::{CaseQuery, ListingState};
use crate::portal::Portal;
use crate::services::{CaseService, CheckEntry, CheckEvent, ListingDay, ListingService};

/// Build a query from the search flags.
pub fn query_from_args(
    cnr: Option<String>,
    case_type: Option<String>,
    case_number: Option<String>,
    year: Option<String>,
) -> anyhow::Result<CaseQuery> {
    let query = match (cnr, case_type) {
        (Some(cnr), _) => CaseQuery::cnr(cnr),
        (None, Some(case_type)) => CaseQuery::details(
            case_type,
            case_number.unwrap_or_default(),
            year.unwrap_or_default(),
        ),
        (None, None) => anyhow::bail!("Provide --cnr, or --case-type with --case-number and --year"),
    };
    query.validate()?;
    Ok(query)
}

/// Search one case and print its listing status.
pub async fn cmd_search(
    settings: &Settings,
    query: &CaseQuery,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let service = CaseService::new(Portal::from_settings(settings)?);

    println!("{} Searching for case: {}", style("→").cyan(), query);
    let found = with_spinner("Querying case status...", service.search(query))
        .await?
        .with_context(|| format!("Search for {} failed", query))?;

    match found {
        Some(summary) => {
            print_case_summary(&summary);
            let output = OutputManager::new(&settings.results_dir);
            save_output(&output, mode, &summary, &query.file_stem()).await
        }
        None => {
            println!("{} No case found for {}", style("!").yellow(), query);
            Ok(())
        }
    }
}

/// Check every query in `file` and print the listing overview.
pub async fn cmd_check(
    settings: &Settings,
    file: &Path,
    csv: bool,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let contents = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let queries: Vec<CaseQuery> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse queries from {}", file.display()))?;
    if queries.is_empty() {
        println!("{} No cases in {}", style("!").yellow(), file.display());
        return Ok(());
    }

    let service = CaseService::new(Portal::from_settings(settings)?);

    let pb = ProgressBar::new(queries.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let (tx, mut rx) = mpsc::channel(64);
    let progress = pb.clone();
    let listener = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                CheckEvent::Started { query, .. } => progress.set_message(query),
                CheckEvent::Found { .. } | CheckEvent::NotFound { .. } => progress.inc(1),
                CheckEvent::Failed { error, .. } => {
                    progress.println(format!("  {} {}", style("✗").red(), error));
                    progress.inc(1);
                }
            }
        }
    });

    let report = service.check_many(&queries, Some(tx)).await;
    let _ = listener.await;
    pb.finish_and_clear();

    println!("{}", style("CASE LISTING REPORT").bold());
    println!("  {:<22} {:>5}", "Cases checked:", report.total_cases_checked);
    println!(
        "  {:<22} {:>5}",
        "Listed today:",
        style(report.cases_listed_today).green()
    );
    println!(
        "  {:<22} {:>5}",
        "Listed tomorrow:",
        style(report.cases_listed_tomorrow).cyan()
    );
    println!("  {:<22} {:>5}", "Not listed:", report.cases_not_listed);
    println!("  {:<22} {:>5}", "Errors:", style(report.errors).red());

    for entry in &report.cases {
        if let CheckEntry::Found(summary) = entry {
            let status = &summary.listing_status;
            if status.status != ListingState::NotListed {
                let cnr = summary
                    .case_details
                    .get("CNR Number")
                    .map(String::as_str)
                    .unwrap_or("case");
                println!(
                    "  {} {}: {}",
                    style("•").green(),
                    cnr,
                    status.status_message
                );
            }
        }
    }

    let output = OutputManager::new(&settings.results_dir);
    if mode != OutputMode::Console {
        let path = output.save_case_report(&report, "case_report").await?;
        println!(
            "{} Report saved to: {}",
            style("✓").green(),
            path.display()
        );
    }
    if csv {
        let found: Vec<_> = report
            .cases
            .iter()
            .filter_map(CheckEntry::summary)
            .cloned()
            .collect();
        if let Some(path) = output.export_csv(&found, "cases_export").await? {
            println!(
                "{} Results exported to: {}",
                style("✓").green(),
                path.display()
            );
        }
    }
    Ok(())
}

/// Which states have cause lists for today or tomorrow.
pub async fn cmd_listing(settings: &Settings, tomorrow: bool, mode: OutputMode) -> anyhow::Result<()> {
    let day = if tomorrow {
        ListingDay::Tomorrow
    } else {
        ListingDay::Today
    };
    let service = ListingService::new(Portal::from_settings(settings)?);

    println!(
        "{} Fetching {}'s cause list information...",
        style("→").cyan(),
        day.as_str()
    );
    let info = with_spinner("Loading states...", service.listing(day))
        .await?
        .context("Could not load cause-list states")?;

    println!(
        "{} Cause lists for {}: {} states available",
        style("✓").green(),
        info.target_date,
        info.total_states
    );
    println!("  Timestamp: {}", info.timestamp);

    let name = match day {
        ListingDay::Today => format!("cause_list_{}", info.target_date),
        ListingDay::Tomorrow => format!("cause_list_tomorrow_{}", info.target_date),
    };
    let output = OutputManager::new(&settings.results_dir);
    save_output(&output, mode, &info, &name).await
}

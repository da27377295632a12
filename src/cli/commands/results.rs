//! Download history and retention commands.

use console::style;

use super::super::helpers::format_bytes;
use crate::config::Settings;
use crate::export::OutputManager;
use crate::storage::{DocumentStore, StoredFile};

/// List stored cause lists and saved results, newest first.
pub async fn cmd_history(settings: &Settings) -> anyhow::Result<()> {
    let downloads = DocumentStore::new(&settings.downloads_dir).history().await?;
    let results = OutputManager::new(&settings.results_dir)
        .list_outputs()
        .await?;

    print_files("DOWNLOADS", &downloads);
    println!();
    print_files("RESULTS", &results);
    Ok(())
}

fn print_files(title: &str, files: &[StoredFile]) {
    println!("{} ({})", style(title).cyan().bold(), files.len());
    if files.is_empty() {
        println!("  {}", style("none").dim());
    }
    for file in files {
        println!(
            "  {:<60} {:>10}  {}",
            file.filename,
            format_bytes(file.size_bytes),
            style(&file.modified).dim()
        );
    }
}

/// Remove downloads and results older than `days`.
pub async fn cmd_cleanup(settings: &Settings, days: u64) -> anyhow::Result<()> {
    let downloads = DocumentStore::new(&settings.downloads_dir)
        .cleanup_older_than(days)
        .await?;
    let results = OutputManager::new(&settings.results_dir)
        .cleanup_older_than(days)
        .await?;

    println!(
        "{} Removed {} downloads ({}) and {} results ({}) older than {} days",
        style("✓").green(),
        downloads.files_removed,
        format_bytes(downloads.space_freed_bytes),
        results.files_removed,
        format_bytes(results.space_freed_bytes),
        days
    );
    Ok(())
}

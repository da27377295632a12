//! Location options, captcha and cause-list download commands.

use std::path::Path;

use anyhow::Context;
use base64::Engine;
use console::style;

use super::super::helpers::{format_bytes, print_options, save_output, with_spinner, OutputMode};
use crate::config::Settings;
use crate::export::OutputManager;
use crate::models::{BatchRequest, CauseListRequest, DownloadOutcome, LocationPath};
use crate::portal::Portal;

/// Print the options of the next selector level.
pub async fn cmd_options(
    settings: &Settings,
    state: Option<&str>,
    district: Option<&str>,
    complex: Option<&str>,
) -> anyhow::Result<()> {
    let path = LocationPath::from_optional(state, district, complex, None)?;
    let level = path
        .next_level()
        .context("A court is the last selector level")?;
    let portal = Portal::from_settings(settings)?;

    let options = with_spinner(
        format!("Loading {} options...", level),
        portal.resolve_options(&path),
    )
    .await??;

    print_options(&format!("{} options", level), &options);
    Ok(())
}

/// Fetch the captcha; print it as a data URL or save the decoded image.
pub async fn cmd_captcha(settings: &Settings, save: Option<&Path>) -> anyhow::Result<()> {
    let portal = Portal::from_settings(settings)?;
    let data_url = with_spinner("Fetching captcha...", portal.captcha()).await??;

    let Some(path) = save else {
        println!("{}", data_url);
        return Ok(());
    };

    let encoded = data_url
        .split_once(";base64,")
        .map(|(_, data)| data)
        .context("Captcha is not a base64 data URL")?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .context("Captcha image is not valid base64")?;
    tokio::fs::write(path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "{} Captcha saved to: {}",
        style("✓").green(),
        path.display()
    );
    Ok(())
}

/// Download one court's cause list.
pub async fn cmd_download(settings: &Settings, request: &CauseListRequest) -> anyhow::Result<()> {
    request.validate()?;
    let portal = Portal::from_settings(settings)?;

    println!(
        "{} Downloading cause list for {} on {}",
        style("→").cyan(),
        request.court_name,
        request.date
    );
    let stored = with_spinner("Submitting cause-list form...", portal.retrieve(request))
        .await?
        .map_err(|failure| {
            anyhow::anyhow!(
                "Download failed at {}: {}",
                failure.stage,
                failure.error
            )
        })?;

    println!(
        "{} Downloaded: {} ({})",
        style("✓").green(),
        stored.path.display(),
        format_bytes(stored.size_bytes)
    );
    Ok(())
}

/// Download every court of a complex and summarise the batch.
pub async fn cmd_download_all(
    settings: &Settings,
    request: &BatchRequest,
    mode: OutputMode,
) -> anyhow::Result<()> {
    request.validate()?;
    let portal = Portal::from_settings(settings)?;

    println!(
        "{} Downloading cause list for {}, {}, {}",
        style("→").cyan(),
        request.complex_name,
        request.district,
        request.state
    );
    println!("  Date: {}", request.date);

    let report = with_spinner("Retrieving courts...", portal.retrieve_batch(request)).await?;
    if let Some(ref error) = report.error {
        anyhow::bail!("Batch download failed: {}", error);
    }

    for outcome in &report.outcomes {
        match outcome {
            DownloadOutcome::Success {
                court, size_bytes, ..
            } => println!(
                "  {} {} ({})",
                style("✓").green(),
                court,
                format_bytes(*size_bytes)
            ),
            DownloadOutcome::Failed { court, reason } => {
                println!("  {} {}: {}", style("✗").red(), court, reason)
            }
        }
    }

    println!(
        "{} Downloaded: {} PDFs",
        style("✓").green(),
        report.successful
    );
    println!("{} Failed: {} PDFs", style("!").yellow(), report.failed);
    if let Some(ref archive) = report.archive {
        println!(
            "{} Archive created: {}",
            style("✓").green(),
            archive.display()
        );
    }

    let output = OutputManager::new(&settings.results_dir);
    let name = format!(
        "download_results_{}_{}_{}",
        request.state,
        request.district,
        request.date.replace('-', "_")
    );
    save_output(&output, mode, &report, &name).await?;
    if mode != OutputMode::Console {
        output
            .save_download_report(&report, &format!("{}_report", name))
            .await?;
    }
    Ok(())
}

//! Result files: JSON, indented text and CSV exports in the results directory.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{BatchReport, CaseSummary, DownloadOutcome};
use crate::services::CaseReport;
use crate::storage::{self, CleanupReport, StoredFile};

const RESULT_EXTENSIONS: &[&str] = &["json", "txt", "csv"];

/// File format for a saved result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultFormat {
    #[default]
    Json,
    Text,
}

impl ResultFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ResultFormat::Json => "json",
            ResultFormat::Text => "txt",
        }
    }
}

/// A failed court as listed in a download report.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadError {
    pub court: String,
    pub reason: String,
}

/// Download report as written to disk.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadReportFile {
    pub generated_at: String,
    pub total_downloads: usize,
    pub successful: usize,
    pub failed: usize,
    pub success_rate: String,
    pub files: Vec<PathBuf>,
    pub errors: Vec<DownloadError>,
    pub archive: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&BatchReport> for DownloadReportFile {
    fn from(report: &BatchReport) -> Self {
        let errors = report
            .outcomes
            .iter()
            .filter_map(|o| match o {
                DownloadOutcome::Failed { court, reason } => Some(DownloadError {
                    court: court.clone(),
                    reason: reason.clone(),
                }),
                DownloadOutcome::Success { .. } => None,
            })
            .collect();

        Self {
            generated_at: Local::now().to_rfc3339(),
            total_downloads: report.total,
            successful: report.successful,
            failed: report.failed,
            success_rate: report.success_rate(),
            files: report.files(),
            errors,
            archive: report.archive.clone(),
            error: report.error.clone(),
        }
    }
}

/// Writes results into one directory.
#[derive(Debug, Clone)]
pub struct OutputManager {
    dir: PathBuf,
}

impl OutputManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save `data` as `{name}.json` or `{name}.txt`.
    pub async fn save_result<T: Serialize>(
        &self,
        data: &T,
        name: &str,
        format: ResultFormat,
    ) -> Result<PathBuf> {
        let value = serde_json::to_value(data)?;
        let body = match format {
            ResultFormat::Json => serde_json::to_string_pretty(&value)?,
            ResultFormat::Text => render_text(&value),
        };
        self.write(name, format.extension(), body).await
    }

    /// Save a multi-case report as JSON plus a `_text` rendering.
    pub async fn save_case_report(&self, report: &CaseReport, name: &str) -> Result<PathBuf> {
        let path = self.save_result(report, name, ResultFormat::Json).await?;
        self.save_result(report, &format!("{}_text", name), ResultFormat::Text)
            .await?;
        Ok(path)
    }

    /// Save a batch download report as JSON plus a `_text` rendering.
    pub async fn save_download_report(&self, report: &BatchReport, name: &str) -> Result<PathBuf> {
        let file = DownloadReportFile::from(report);
        let path = self.save_result(&file, name, ResultFormat::Json).await?;
        self.save_result(&file, &format!("{}_text", name), ResultFormat::Text)
            .await?;
        Ok(path)
    }

    /// One CSV row per case over the union of detail and status keys.
    ///
    /// Returns `None` when there is nothing to export.
    pub async fn export_csv(&self, cases: &[CaseSummary], name: &str) -> Result<Option<PathBuf>> {
        if cases.is_empty() {
            warn!("No cases to export");
            return Ok(None);
        }

        let rows = cases.iter().map(csv_row).collect::<Result<Vec<_>>>()?;
        let headers: BTreeSet<&String> = rows.iter().flat_map(|r| r.keys()).collect();

        let mut output = String::new();
        let header_line: Vec<String> = headers.iter().map(|h| escape_csv(h)).collect();
        let _ = writeln!(output, "{}", header_line.join(","));
        for row in &rows {
            let line: Vec<String> = headers
                .iter()
                .map(|h| row.get(*h).map(|v| escape_csv(v)).unwrap_or_default())
                .collect();
            let _ = writeln!(output, "{}", line.join(","));
        }

        self.write(name, "csv", output).await.map(Some)
    }

    /// Result files, newest first.
    pub async fn list_outputs(&self) -> Result<Vec<StoredFile>> {
        let files = storage::newest_first(self.results().await?);
        debug!("Found {} result files", files.len());
        Ok(files)
    }

    /// Remove result files last modified more than `days` ago.
    pub async fn cleanup_older_than(&self, days: u64) -> Result<CleanupReport> {
        storage::remove_older_than(self.results().await?, storage::retention_cutoff(days)).await
    }

    async fn results(&self) -> Result<Vec<(PathBuf, std::fs::Metadata)>> {
        storage::list_files(&self.dir, RESULT_EXTENSIONS).await
    }

    async fn write(&self, name: &str, extension: &str, body: String) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!(
            "{}.{}",
            storage::sanitize_filename(name),
            extension
        ));
        tokio::fs::write(&path, body).await?;
        info!("Saved result: {}", path.display());
        Ok(path)
    }
}

/// Flatten a summary into column -> cell.
fn csv_row(case: &CaseSummary) -> Result<std::collections::BTreeMap<String, String>> {
    let mut row = case.case_details.clone();
    if let Value::Object(status) = serde_json::to_value(&case.listing_status)? {
        for (key, value) in status {
            row.insert(key, scalar(&value));
        }
    }
    Ok(row)
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Indented `key: value` rendering; list items become `- item`.
fn render_text(value: &Value) -> String {
    let mut lines = Vec::new();
    render_into(value, 0, &mut lines);
    lines.join("\n")
}

fn render_into(value: &Value, indent: usize, lines: &mut Vec<String>) {
    let prefix = "  ".repeat(indent);
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                match value {
                    Value::Object(_) => {
                        lines.push(format!("{}{}:", prefix, key));
                        render_into(value, indent + 1, lines);
                    }
                    Value::Array(items) => {
                        lines.push(format!("{}{}:", prefix, key));
                        for item in items {
                            if item.is_object() {
                                render_into(item, indent + 1, lines);
                            } else {
                                lines.push(format!("{}  - {}", prefix, scalar(item)));
                            }
                        }
                    }
                    other => lines.push(format!("{}{}: {}", prefix, key, scalar(other))),
                }
            }
        }
        other => lines.push(format!("{}{}", prefix, scalar(other))),
    }
}

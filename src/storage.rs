//! Cause-list documents on disk: naming, archives, history and retention.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{PortalError, Result};
use crate::models::CauseListRequest;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Replace characters that cannot appear in a file name with `-`.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        "document".to_string()
    } else {
        sanitized
    }
}

/// A document written to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredDocument {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// One stored file as listed by [`DocumentStore::history`].
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub filename: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    /// RFC 3339 local time.
    pub modified: String,
}

/// Outcome of a retention sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanupReport {
    pub files_removed: usize,
    pub space_freed_bytes: u64,
    pub space_freed_mb: f64,
}

impl CleanupReport {
    fn record(&mut self, size: u64) {
        self.files_removed += 1;
        self.space_freed_bytes += size;
        self.space_freed_mb =
            (self.space_freed_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0;
    }
}

/// Downloads directory holding cause-list PDFs and their archives.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `{state}_{district}_{court}_{date}.pdf`, sanitized.
    pub fn file_name_for(request: &CauseListRequest) -> String {
        sanitize_filename(&format!(
            "{}_{}_{}_{}.pdf",
            request.state.trim(),
            request.district.trim(),
            request.court_name.trim(),
            request.date.trim()
        ))
    }

    /// `cause_list_{state}_{district}_{date with underscores}`.
    pub fn archive_name_for(state: &str, district: &str, date: &str) -> String {
        format!(
            "cause_list_{}_{}_{}",
            state.trim(),
            district.trim(),
            date.trim().replace('-', "_")
        )
    }

    /// Write a retrieved document.
    pub async fn save(&self, request: &CauseListRequest, bytes: &[u8]) -> Result<StoredDocument> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(Self::file_name_for(request));
        tokio::fs::write(&path, bytes).await?;

        info!("Saved cause list: {}", path.display());
        Ok(StoredDocument {
            path,
            size_bytes: bytes.len() as u64,
        })
    }

    /// Bundle existing files into `{name}.zip` in the store directory.
    ///
    /// Missing files are skipped.
    pub async fn create_archive(&self, files: Vec<PathBuf>, name: &str) -> Result<PathBuf> {
        let archive_path = self
            .dir
            .join(format!("{}.zip", sanitize_filename(name)));
        let target = archive_path.clone();

        tokio::task::spawn_blocking(move || write_archive(&target, &files))
            .await
            .map_err(|e| PortalError::Io(std::io::Error::other(e)))??;

        info!("Created ZIP archive: {}", archive_path.display());
        Ok(archive_path)
    }

    /// Stored PDFs, newest first.
    pub async fn history(&self) -> Result<Vec<StoredFile>> {
        let files = newest_first(self.pdfs().await?);
        debug!("Found {} downloaded files", files.len());
        Ok(files)
    }

    /// Remove stored PDFs last modified more than `days` ago.
    pub async fn cleanup_older_than(&self, days: u64) -> Result<CleanupReport> {
        remove_older_than(self.pdfs().await?, retention_cutoff(days)).await
    }

    /// Path of a stored file by bare name; `None` for anything outside the store.
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let candidate = Path::new(filename);
        let bare = candidate.file_name()?;
        if bare != candidate.as_os_str() || filename.starts_with('.') {
            return None;
        }
        let path = self.dir.join(bare);
        path.is_file().then_some(path)
    }

    async fn pdfs(&self) -> Result<Vec<(PathBuf, std::fs::Metadata)>> {
        list_files(&self.dir, &["pdf"]).await
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn write_archive(archive_path: &Path, files: &[PathBuf]) -> Result<()> {
    if let Some(parent) = archive_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut zip = ZipWriter::new(BufWriter::new(File::create(archive_path)?));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        if !path.is_file() {
            warn!("Skipping missing file for archive: {}", path.display());
            continue;
        }
        let name = file_name(path);
        zip.start_file(name.as_str(), options)?;
        let mut reader = BufReader::new(File::open(path)?);
        std::io::copy(&mut reader, &mut zip)?;
        debug!("Added to archive: {}", name);
    }

    zip.finish()?;
    Ok(())
}

/// Regular files in `dir` with one of `extensions`. A missing directory is empty.
pub(crate) async fn list_files(
    dir: &Path,
    extensions: &[&str],
) -> Result<Vec<(PathBuf, std::fs::Metadata)>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)));
        if !matches {
            continue;
        }
        let meta = entry.metadata().await?;
        if meta.is_file() {
            files.push((path, meta));
        }
    }
    Ok(files)
}

/// Describe listed files, most recently modified first.
pub(crate) fn newest_first(files: Vec<(PathBuf, std::fs::Metadata)>) -> Vec<StoredFile> {
    let mut described: Vec<(SystemTime, StoredFile)> = files
        .into_iter()
        .map(|(path, meta)| {
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            (
                modified,
                StoredFile {
                    filename: file_name(&path),
                    path,
                    size_bytes: meta.len(),
                    modified: DateTime::<Local>::from(modified).to_rfc3339(),
                },
            )
        })
        .collect();

    described.sort_by(|a, b| b.0.cmp(&a.0));
    described.into_iter().map(|(_, f)| f).collect()
}

/// Point in time `days` ago; the epoch when that is out of range.
pub(crate) fn retention_cutoff(days: u64) -> SystemTime {
    days.checked_mul(SECS_PER_DAY)
        .and_then(|secs| SystemTime::now().checked_sub(Duration::from_secs(secs)))
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Delete every listed file modified before `cutoff`.
pub(crate) async fn remove_older_than(
    files: Vec<(PathBuf, std::fs::Metadata)>,
    cutoff: SystemTime,
) -> Result<CleanupReport> {
    let mut report = CleanupReport::default();
    for (path, meta) in files {
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        if modified < cutoff {
            tokio::fs::remove_file(&path).await?;
            report.record(meta.len());
            info!("Removed old file: {}", path.display());
        }
    }
    Ok(report)
}

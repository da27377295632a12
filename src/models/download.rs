//! Cause-list retrieval requests, outcomes and batch reports.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::case::parse_portal_date;
use super::location::LocationPath;
use crate::error::{PortalError, Result};

/// One court's cause list for one date.
///
/// Absent fields deserialize as blank so [`validate`](Self::validate) can
/// report them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CauseListRequest {
    pub state: String,
    pub district: String,
    #[serde(alias = "complex")]
    pub complex_name: String,
    #[serde(alias = "court")]
    pub court_name: String,
    /// `DD-MM-YYYY`.
    pub date: String,
    pub captcha: String,
}

impl CauseListRequest {
    /// Check every field is present and the date is in portal format.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            &self.state,
            &self.district,
            &self.complex_name,
            &self.court_name,
            &self.date,
            &self.captcha,
        ];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(PortalError::InvalidRequest(
                "Missing required fields".to_string(),
            ));
        }
        validate_date(&self.date)
    }

    /// The full location path this request selects.
    pub fn path(&self) -> Result<LocationPath> {
        LocationPath::from_optional(
            Some(&self.state),
            Some(&self.district),
            Some(&self.complex_name),
            Some(&self.court_name),
        )
    }
}

/// Every court of one complex for one date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchRequest {
    pub state: String,
    pub district: String,
    #[serde(alias = "complex")]
    pub complex_name: String,
    pub date: String,
    pub captcha: String,
}

impl BatchRequest {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            &self.state,
            &self.district,
            &self.complex_name,
            &self.date,
            &self.captcha,
        ];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(PortalError::InvalidRequest(
                "Missing required fields".to_string(),
            ));
        }
        validate_date(&self.date)
    }

    /// Path down to the complex; its options are the courts.
    pub fn complex_path(&self) -> Result<LocationPath> {
        LocationPath::from_optional(
            Some(&self.state),
            Some(&self.district),
            Some(&self.complex_name),
            None,
        )
    }

    /// Single-court request for one court of this complex.
    pub fn for_court(&self, court: &str) -> CauseListRequest {
        CauseListRequest {
            state: self.state.clone(),
            district: self.district.clone(),
            complex_name: self.complex_name.clone(),
            court_name: court.to_string(),
            date: self.date.clone(),
            captcha: self.captcha.clone(),
        }
    }
}

fn validate_date(date: &str) -> Result<()> {
    parse_portal_date(date).map(|_| ()).ok_or_else(|| {
        PortalError::InvalidRequest(format!("Date '{}' is not in DD-MM-YYYY format", date))
    })
}

/// Result of retrieving one court's cause list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadOutcome {
    Success {
        court: String,
        path: PathBuf,
        size_bytes: u64,
    },
    Failed {
        court: String,
        reason: String,
    },
}

impl DownloadOutcome {
    pub fn court(&self) -> &str {
        match self {
            DownloadOutcome::Success { court, .. } | DownloadOutcome::Failed { court, .. } => {
                court
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success { .. })
    }

    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            DownloadOutcome::Success { path, .. } => Some(path),
            DownloadOutcome::Failed { .. } => None,
        }
    }
}

/// Aggregate of a batch retrieval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub outcomes: Vec<DownloadOutcome>,
    pub archive: Option<PathBuf>,
    /// Set when the batch could not start (e.g. no courts found).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchReport {
    /// A batch that never reached per-court work.
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Default::default()
        }
    }

    /// Build the report from outcomes in attempt order.
    pub fn from_outcomes(outcomes: Vec<DownloadOutcome>) -> Self {
        let successful = outcomes.iter().filter(|o| o.is_success()).count();
        Self {
            total: outcomes.len(),
            successful,
            failed: outcomes.len() - successful,
            outcomes,
            archive: None,
            error: None,
        }
    }

    /// Paths of every successfully stored document.
    pub fn files(&self) -> Vec<PathBuf> {
        self.outcomes
            .iter()
            .filter_map(|o| o.path().cloned())
            .collect()
    }

    /// Success percentage with one decimal, e.g. `"80.0%"`.
    pub fn success_rate(&self) -> String {
        let total = self.total.max(1) as f64;
        format!("{:.1}%", self.successful as f64 / total * 100.0)
    }
}

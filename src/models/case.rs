//! Case records, listing status and case search queries.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{PortalError, Result};

/// Date format the portal uses for hearing and cause-list dates.
pub const PORTAL_DATE_FORMAT: &str = "%d-%m-%Y";

/// Parse a `DD-MM-YYYY` portal date.
pub fn parse_portal_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), PORTAL_DATE_FORMAT).ok()
}

/// Format a date the way the portal expects it.
pub fn format_portal_date(date: NaiveDate) -> String {
    date.format(PORTAL_DATE_FORMAT).to_string()
}

/// Case details scraped from one search result.
///
/// `fields` holds whatever key/value pairs the portal renders; the schema is
/// the site's, not ours. The remaining fields are derived during extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    #[serde(rename = "case_info", default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub listed_today: bool,
    #[serde(default)]
    pub listed_tomorrow: bool,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub court_name: Option<String>,
    /// Hearing date as `DD-MM-YYYY`, only set when it parsed.
    #[serde(default)]
    pub hearing_date: Option<String>,
}

impl CaseRecord {
    /// True when the search ran but the page carried no case at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
            && self.hearing_date.is_none()
            && self.serial_number.is_none()
            && self.court_name.is_none()
    }

    /// Listing status relative to `today`.
    pub fn listing_status(&self, today: NaiveDate) -> ListingStatus {
        ListingStatus::derive(self.hearing_date.as_deref(), today)
            .with_details(self.serial_number.clone(), self.court_name.clone())
    }
}

/// Whether a case appears in the next two days' cause lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingState {
    Today,
    Tomorrow,
    NotListed,
}

impl ListingState {
    /// Compare a hearing date against the current date.
    pub fn from_dates(hearing: Option<NaiveDate>, today: NaiveDate) -> Self {
        match hearing {
            Some(date) if date == today => ListingState::Today,
            Some(date) if today.succ_opt() == Some(date) => ListingState::Tomorrow,
            _ => ListingState::NotListed,
        }
    }

    pub fn days_until(&self) -> Option<i64> {
        match self {
            ListingState::Today => Some(0),
            ListingState::Tomorrow => Some(1),
            ListingState::NotListed => None,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ListingState::Today => "Case is listed TODAY",
            ListingState::Tomorrow => "Case is listed TOMORROW",
            ListingState::NotListed => "Case not listed today or tomorrow",
        }
    }
}

/// Listing status derived from a case record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingStatus {
    pub status: ListingState,
    pub is_listed: bool,
    /// ISO date of the listing, when listed.
    pub listed_date: Option<String>,
    pub days_until_listing: Option<i64>,
    pub status_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hearing_date: Option<String>,
}

impl ListingStatus {
    /// Derive status from a raw hearing date string.
    ///
    /// An absent or unparseable date is "not listed"; the portal omits the
    /// hearing block for unlisted cases.
    pub fn derive(hearing_date: Option<&str>, today: NaiveDate) -> Self {
        let parsed = hearing_date.and_then(parse_portal_date);
        let status = ListingState::from_dates(parsed, today);
        let listed_date = match status {
            ListingState::NotListed => None,
            _ => parsed.map(|d| d.format("%Y-%m-%d").to_string()),
        };

        Self {
            status,
            is_listed: status != ListingState::NotListed,
            listed_date,
            days_until_listing: status.days_until(),
            status_message: status.message().to_string(),
            serial_number: None,
            court_name: None,
            hearing_date: parsed.map(format_portal_date),
        }
    }

    fn with_details(mut self, serial_number: Option<String>, court_name: Option<String>) -> Self {
        self.serial_number = serial_number;
        self.court_name = court_name;
        self
    }
}

/// A case search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "search_type", rename_all = "snake_case")]
pub enum CaseQuery {
    /// Search by Case Number Reference.
    Cnr { cnr: String },
    /// Search by case type, number and registration year.
    Details {
        case_type: String,
        case_number: String,
        year: String,
    },
}

impl CaseQuery {
    pub fn cnr(cnr: impl Into<String>) -> Self {
        CaseQuery::Cnr { cnr: cnr.into() }
    }

    pub fn details(
        case_type: impl Into<String>,
        case_number: impl Into<String>,
        year: impl Into<String>,
    ) -> Self {
        CaseQuery::Details {
            case_type: case_type.into(),
            case_number: case_number.into(),
            year: year.into(),
        }
    }

    /// Reject queries with blank fields before a session is spent on them.
    pub fn validate(&self) -> Result<()> {
        let blank = |s: &str| s.trim().is_empty();
        match self {
            CaseQuery::Cnr { cnr } if blank(cnr) => {
                Err(PortalError::InvalidRequest("CNR not provided".to_string()))
            }
            CaseQuery::Details {
                case_type,
                case_number,
                year,
            } if blank(case_type) || blank(case_number) || blank(year) => Err(
                PortalError::InvalidRequest("Missing case details".to_string()),
            ),
            _ => Ok(()),
        }
    }

    pub fn search_type(&self) -> &'static str {
        match self {
            CaseQuery::Cnr { .. } => "cnr",
            CaseQuery::Details { .. } => "details",
        }
    }

    /// Base name for result files derived from this query.
    pub fn file_stem(&self) -> String {
        match self {
            CaseQuery::Cnr { cnr } => format!("case_{}", cnr.trim()),
            CaseQuery::Details {
                case_type,
                case_number,
                year,
            } => format!(
                "case_{}_{}_{}",
                case_type.trim(),
                case_number.trim(),
                year.trim()
            ),
        }
    }
}

impl std::fmt::Display for CaseQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaseQuery::Cnr { cnr } => write!(f, "CNR {}", cnr),
            CaseQuery::Details {
                case_type,
                case_number,
                year,
            } => write!(f, "{} {}/{}", case_type, case_number, year),
        }
    }
}

/// Caller-facing summary of one search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseSummary {
    pub case_details: BTreeMap<String, String>,
    pub listing_status: ListingStatus,
    pub search_timestamp: String,
    pub search_type: String,
}

impl CaseSummary {
    /// Summarise a record found by `query`, relative to `today`.
    pub fn new(record: &CaseRecord, query: &CaseQuery, today: NaiveDate) -> Self {
        Self {
            case_details: record.fields.clone(),
            listing_status: record.listing_status(today),
            search_timestamp: Local::now().to_rfc3339(),
            search_type: query.search_type().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_listed_today() {
        let status = ListingStatus::derive(Some("19-10-2026"), day(2026, 10, 19));
        assert_eq!(status.status, ListingState::Today);
        assert_eq!(status.days_until_listing, Some(0));
        assert_eq!(status.listed_date.as_deref(), Some("2026-10-19"));
        assert!(status.is_listed);
    }

    #[test]
    fn test_listed_tomorrow_across_month_boundary() {
        let status = ListingStatus::derive(Some("01-11-2026"), day(2026, 10, 31));
        assert_eq!(status.status, ListingState::Tomorrow);
        assert_eq!(status.days_until_listing, Some(1));
        assert!(status.status_message.contains("TOMORROW"));
    }

    #[test]
    fn test_unparseable_date_is_not_listed() {
        let status = ListingStatus::derive(Some("2026-10-19"), day(2026, 10, 19));
        assert_eq!(status.status, ListingState::NotListed);
        assert_eq!(status.days_until_listing, None);
        assert_eq!(status.hearing_date, None);
        assert!(!status.is_listed);
    }

    #[test]
    fn test_past_and_far_dates_are_not_listed() {
        let today = day(2026, 10, 19);
        for date in ["18-10-2026", "21-10-2026"] {
            let status = ListingStatus::derive(Some(date), today);
            assert_eq!(status.status, ListingState::NotListed);
            assert_eq!(status.hearing_date.as_deref(), Some(date));
        }
    }

    #[test]
    fn test_query_validation() {
        assert!(CaseQuery::cnr("  ").validate().is_err());
        assert!(CaseQuery::details("Civil", "", "2023").validate().is_err());
        assert!(CaseQuery::details("Civil", "12", "2023").validate().is_ok());
    }

    #[test]
    fn test_query_deserializes_with_search_type() {
        let q: CaseQuery =
            serde_json::from_str(r#"{"search_type":"cnr","cnr":"ABCD0123456789012345"}"#).unwrap();
        assert_eq!(q, CaseQuery::cnr("ABCD0123456789012345"));
        assert_eq!(q.file_stem(), "case_ABCD0123456789012345");
    }

    #[test]
    fn test_empty_record() {
        let mut record = CaseRecord::default();
        assert!(record.is_empty());
        record.court_name = Some("Court 4".to_string());
        assert!(!record.is_empty());
    }

    #[test]
    fn test_listing_state_serializes_uppercase() {
        let json = serde_json::to_string(&ListingState::NotListed).unwrap();
        assert_eq!(json, "\"NOT_LISTED\"");
    }
}

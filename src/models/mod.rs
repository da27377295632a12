//! Data models for portal automation.

mod case;
mod download;
mod location;

pub use case::{
    format_portal_date, parse_portal_date, CaseQuery, CaseRecord, CaseSummary, ListingState,
    ListingStatus, PORTAL_DATE_FORMAT,
};
pub use download::{BatchReport, BatchRequest, CauseListRequest, DownloadOutcome};
pub use location::{LocationPath, SelectorLevel};

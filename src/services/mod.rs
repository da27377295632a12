//! Service layer for case lookups and listing checks.
//!
//! Services wrap the [`Portal`](crate::portal::Portal) facade with the
//! caller-facing shapes the CLI and the web server share.

pub mod case;
pub mod listing;

pub use case::{CaseReport, CaseService, CheckEntry, CheckEvent, CASE_NOT_FOUND};
pub use listing::{CauseListInfo, ListingDay, ListingService};

//! Case lookup service.
//!
//! Turns raw case records into caller-facing summaries and checks many
//! cases in one pass. Separated from UI concerns - emits events for progress
//! tracking.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{CaseQuery, CaseSummary, ListingState};
use crate::portal::Portal;

/// Message recorded for a query whose search ran but matched no case.
pub const CASE_NOT_FOUND: &str = "Case not found";

/// Events emitted while checking several cases.
#[derive(Debug, Clone)]
pub enum CheckEvent {
    /// A search is about to run
    Started {
        index: usize,
        total: usize,
        query: String,
    },
    /// The case was found
    Found { index: usize, status: ListingState },
    /// The search ran but matched nothing
    NotFound { index: usize },
    /// The search could not be run
    Failed { index: usize, error: String },
}

/// One entry of a multi-case report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckEntry {
    Found(CaseSummary),
    Failed {
        error: String,
        search_params: CaseQuery,
    },
}

impl CheckEntry {
    pub fn summary(&self) -> Option<&CaseSummary> {
        match self {
            CheckEntry::Found(summary) => Some(summary),
            CheckEntry::Failed { .. } => None,
        }
    }
}

/// Listing overview for a batch of cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseReport {
    pub total_cases_checked: usize,
    pub cases_listed_today: usize,
    pub cases_listed_tomorrow: usize,
    pub cases_not_listed: usize,
    pub errors: usize,
    pub cases: Vec<CheckEntry>,
    pub generated_at: String,
}

impl CaseReport {
    pub fn from_entries(cases: Vec<CheckEntry>) -> Self {
        let count = |state: ListingState| {
            cases
                .iter()
                .filter_map(CheckEntry::summary)
                .filter(|s| s.listing_status.status == state)
                .count()
        };

        Self {
            total_cases_checked: cases.len(),
            cases_listed_today: count(ListingState::Today),
            cases_listed_tomorrow: count(ListingState::Tomorrow),
            cases_not_listed: count(ListingState::NotListed),
            errors: cases.iter().filter(|c| c.summary().is_none()).count(),
            generated_at: Local::now().to_rfc3339(),
            cases,
        }
    }
}

/// Case searches with listing status.
#[derive(Clone)]
pub struct CaseService {
    portal: Portal,
}

impl CaseService {
    pub fn new(portal: Portal) -> Self {
        Self { portal }
    }

    /// Search one case. `Ok(None)` means the portal reported no such case.
    pub async fn search(&self, query: &CaseQuery) -> Result<Option<CaseSummary>> {
        self.search_at(query, Local::now().date_naive()).await
    }

    pub async fn search_at(
        &self,
        query: &CaseQuery,
        today: NaiveDate,
    ) -> Result<Option<CaseSummary>> {
        let record = self.portal.search_at(query, today).await?;
        if record.is_empty() {
            return Ok(None);
        }
        Ok(Some(CaseSummary::new(&record, query, today)))
    }

    /// Check each query in turn. Failures are recorded, never fatal.
    pub async fn check_many(
        &self,
        queries: &[CaseQuery],
        event_tx: Option<mpsc::Sender<CheckEvent>>,
    ) -> CaseReport {
        self.check_many_at(queries, Local::now().date_naive(), event_tx)
            .await
    }

    pub async fn check_many_at(
        &self,
        queries: &[CaseQuery],
        today: NaiveDate,
        event_tx: Option<mpsc::Sender<CheckEvent>>,
    ) -> CaseReport {
        let total = queries.len();
        let mut entries = Vec::with_capacity(total);

        for (index, query) in queries.iter().enumerate() {
            info!("Checking case {}/{}: {}", index + 1, total, query);
            emit(
                &event_tx,
                CheckEvent::Started {
                    index,
                    total,
                    query: query.to_string(),
                },
            )
            .await;

            let (entry, event) = match self.search_at(query, today).await {
                Ok(Some(summary)) => {
                    let status = summary.listing_status.status;
                    (CheckEntry::Found(summary), CheckEvent::Found { index, status })
                }
                Ok(None) => (
                    CheckEntry::Failed {
                        error: CASE_NOT_FOUND.to_string(),
                        search_params: query.clone(),
                    },
                    CheckEvent::NotFound { index },
                ),
                Err(e) => {
                    warn!("Case check failed for {}: {}", query, e);
                    (
                        CheckEntry::Failed {
                            error: format!("Failed to retrieve case information: {}", e),
                            search_params: query.clone(),
                        },
                        CheckEvent::Failed {
                            index,
                            error: e.to_string(),
                        },
                    )
                }
            };

            emit(&event_tx, event).await;
            entries.push(entry);
        }

        CaseReport::from_entries(entries)
    }
}

async fn emit(tx: &Option<mpsc::Sender<CheckEvent>>, event: CheckEvent) {
    if let Some(tx) = tx {
        let _ = tx.send(event).await;
    }
}

//! Cause lists for every court of one complex.

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use super::navigator::SelectorNavigator;
use super::retrieval::{CauseListRetriever, RetrievalFailure, RetrievalState};
use crate::config::PortalSettings;
use crate::fetch::DocumentFetcher;
use crate::models::{BatchReport, BatchRequest, CauseListRequest, DownloadOutcome};
use crate::session::SessionFactory;
use crate::storage::{DocumentStore, StoredDocument};

/// Reason reported when the complex has no courts to attempt.
pub const NO_COURTS_FOUND: &str = "no courts found";

/// Enumerates the courts of a complex and retrieves each independently.
///
/// One court failing never stops the others. Each court gets its own
/// session; with `concurrency > 1` up to that many run at once, but the
/// report always lists courts in the portal's order.
pub struct BatchOrchestrator<'a> {
    sessions: &'a dyn SessionFactory,
    fetcher: &'a dyn DocumentFetcher,
    store: &'a DocumentStore,
    portal: &'a PortalSettings,
    concurrency: usize,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(
        sessions: &'a dyn SessionFactory,
        fetcher: &'a dyn DocumentFetcher,
        store: &'a DocumentStore,
        portal: &'a PortalSettings,
    ) -> Self {
        Self {
            sessions,
            fetcher,
            store,
            portal,
            concurrency: 1,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn run(&self, request: &BatchRequest) -> BatchReport {
        let courts = self.enumerate_courts(request).await;
        if courts.is_empty() {
            warn!(
                "No courts found for {} / {} / {}",
                request.state, request.district, request.complex_name
            );
            return BatchReport::aborted(NO_COURTS_FOUND);
        }

        let total = courts.len();
        info!("Retrieving cause lists for {} courts", total);

        let outcomes: Vec<DownloadOutcome> = stream::iter(courts.into_iter().enumerate())
            .map(|(idx, court)| async move {
                info!("Downloading {}/{}: {}", idx + 1, total, court);
                self.retrieve_court(request.for_court(&court)).await
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut report = BatchReport::from_outcomes(outcomes);
        info!(
            "Download complete: {} successful, {} failed",
            report.successful, report.failed
        );

        if report.successful > 0 {
            let name =
                DocumentStore::archive_name_for(&request.state, &request.district, &request.date);
            match self.store.create_archive(report.files(), &name).await {
                Ok(path) => report.archive = Some(path),
                Err(e) => warn!("Could not create archive {}: {}", name, e),
            }
        }

        report
    }

    /// Court labels of the complex; any failure counts as none.
    async fn enumerate_courts(&self, request: &BatchRequest) -> Vec<String> {
        let path = match request.complex_path() {
            Ok(path) => path,
            Err(e) => {
                warn!("Invalid batch location: {}", e);
                return Vec::new();
            }
        };

        let mut session = match self.sessions.open().await {
            Ok(session) => session,
            Err(e) => {
                warn!("Court enumeration failed: {}", e);
                return Vec::new();
            }
        };
        let result = SelectorNavigator::new(self.portal)
            .resolve(session.as_mut(), &path)
            .await;
        session.close().await;

        result.unwrap_or_else(|e| {
            warn!("Court enumeration failed: {}", e);
            Vec::new()
        })
    }

    async fn retrieve_court(&self, request: CauseListRequest) -> DownloadOutcome {
        let court = request.court_name.clone();
        match self.retrieve_and_store(&request).await {
            Ok(stored) => DownloadOutcome::Success {
                court,
                path: stored.path,
                size_bytes: stored.size_bytes,
            },
            Err(failure) => {
                warn!(
                    "Court {} failed at {}: {}",
                    court, failure.stage, failure.error
                );
                DownloadOutcome::Failed {
                    court,
                    reason: failure.reason(),
                }
            }
        }
    }

    async fn retrieve_and_store(
        &self,
        request: &CauseListRequest,
    ) -> Result<StoredDocument, RetrievalFailure> {
        retrieve_and_store(
            self.sessions,
            self.fetcher,
            self.store,
            self.portal,
            request,
        )
        .await
    }
}

/// One court in its own session; the file is written only after download.
pub(crate) async fn retrieve_and_store(
    sessions: &dyn SessionFactory,
    fetcher: &dyn DocumentFetcher,
    store: &DocumentStore,
    portal: &PortalSettings,
    request: &CauseListRequest,
) -> Result<StoredDocument, RetrievalFailure> {
    let mut session = sessions
        .open()
        .await
        .map_err(|e| RetrievalFailure::new(RetrievalState::Start, e))?;
    let result = CauseListRetriever::new(portal, fetcher)
        .retrieve(session.as_mut(), request)
        .await;
    session.close().await;

    let document = result?;
    store
        .save(request, &document.bytes)
        .await
        .map_err(|e| RetrievalFailure::new(RetrievalState::Downloaded, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::testing::{FakePortal, SAMPLE_CAPTCHA};
    use tempfile::tempdir;

    fn request(complex: &str) -> BatchRequest {
        BatchRequest {
            state: "Delhi".into(),
            district: "New Delhi".into(),
            complex_name: complex.into(),
            date: "19-10-2026".into(),
            captcha: SAMPLE_CAPTCHA.into(),
        }
    }

    #[tokio::test]
    async fn test_one_failing_court_does_not_stop_batch() {
        let portal = FakePortal::sample().without_document("Court 3");
        let settings = PortalSettings::default();
        let dir = tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        let report = BatchOrchestrator::new(&portal, &portal, &store, &settings)
            .run(&request("Patiala House"))
            .await;

        assert_eq!((report.total, report.successful, report.failed), (5, 4, 1));
        assert_eq!(
            report.outcomes[2],
            DownloadOutcome::Failed {
                court: "Court 3".into(),
                reason: "document not found".into(),
            }
        );
        // Courts after the failure were still attempted, in order.
        assert_eq!(
            portal.submissions(),
            vec!["Court 1", "Court 2", "Court 3", "Court 4", "Court 5"]
        );
        let archive = report.archive.unwrap();
        assert!(archive.ends_with("cause_list_Delhi_New Delhi_19_10_2026.zip"));
        // One enumeration session plus one per court, all closed.
        assert_eq!(portal.opens(), 6);
        assert_eq!(portal.closes(), 6);
    }

    #[tokio::test]
    async fn test_empty_complex_aborts_batch() {
        let portal = FakePortal::sample();
        let settings = PortalSettings::default();
        let dir = tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        let report = BatchOrchestrator::new(&portal, &portal, &store, &settings)
            .run(&request("Empty Complex"))
            .await;

        assert_eq!(report.error.as_deref(), Some(NO_COURTS_FOUND));
        assert_eq!(report.total, 0);
        assert!(portal.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_enumeration_failure_aborts_batch() {
        let portal = FakePortal::sample();
        let settings = PortalSettings::default();
        let dir = tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        let report = BatchOrchestrator::new(&portal, &portal, &store, &settings)
            .run(&request("Saket"))
            .await;

        assert_eq!(report.error.as_deref(), Some(NO_COURTS_FOUND));
        assert_eq!(portal.opens(), 1);
        assert_eq!(portal.closes(), 1);
    }

    #[tokio::test]
    async fn test_all_failures_writes_no_archive() {
        let portal = FakePortal::sample();
        let settings = PortalSettings::default();
        let dir = tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        let mut req = request("Patiala House");
        req.captcha = "wrong".into();

        let report = BatchOrchestrator::new(&portal, &portal, &store, &settings)
            .run(&req)
            .await;

        assert_eq!(report.failed, 5);
        assert!(report.archive.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_parallel_batch_keeps_court_order() {
        let portal = FakePortal::sample().failing_fetch("Court_1");
        let settings = PortalSettings::default();
        let dir = tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        let report = BatchOrchestrator::new(&portal, &portal, &store, &settings)
            .with_concurrency(3)
            .run(&request("Patiala House"))
            .await;

        let courts: Vec<&str> = report.outcomes.iter().map(|o| o.court()).collect();
        assert_eq!(courts, vec!["Court 1", "Court 2", "Court 3", "Court 4", "Court 5"]);
        assert!(!report.outcomes[0].is_success());
        assert_eq!(report.successful, 4);
    }
}

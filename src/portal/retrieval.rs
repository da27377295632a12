//! Cause-list retrieval for one court.
//!
//! Retrieval walks a fixed sequence of states. Each transition is one
//! interaction with the remote form; a failure is reported together with the
//! last state reached so callers can tell a bad selector from a bad captcha.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::extract::locate_document;
use super::navigator::SelectorNavigator;
use crate::config::PortalSettings;
use crate::error::PortalError;
use crate::fetch::DocumentFetcher;
use crate::models::{CauseListRequest, LocationPath};
use crate::session::{PortalSession, SettlePurpose};

/// Progress of a single retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetrievalState {
    Start,
    SelectorsResolved,
    DateEntered,
    CaptchaEntered,
    Submitted,
    DocumentLocated,
    Downloaded,
}

impl RetrievalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalState::Start => "START",
            RetrievalState::SelectorsResolved => "SELECTORS_RESOLVED",
            RetrievalState::DateEntered => "DATE_ENTERED",
            RetrievalState::CaptchaEntered => "CAPTCHA_ENTERED",
            RetrievalState::Submitted => "SUBMITTED",
            RetrievalState::DocumentLocated => "DOCUMENT_LOCATED",
            RetrievalState::Downloaded => "DOWNLOADED",
        }
    }
}

impl std::fmt::Display for RetrievalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A retrieval that stopped before `DOWNLOADED`.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RetrievalFailure {
    /// Last state reached before the failing transition.
    pub stage: RetrievalState,
    #[source]
    pub error: PortalError,
}

impl RetrievalFailure {
    pub fn new(stage: RetrievalState, error: PortalError) -> Self {
        Self { stage, error }
    }

    /// Reason string recorded in batch outcomes.
    pub fn reason(&self) -> String {
        self.error.to_string()
    }
}

/// Bytes of a retrieved cause list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedDocument {
    pub url: String,
    pub bytes: Vec<u8>,
}

/// State plus whatever the state has produced so far.
enum Step {
    Start(LocationPath),
    SelectorsResolved,
    DateEntered,
    CaptchaEntered,
    Submitted,
    DocumentLocated(String),
    Downloaded(RetrievedDocument),
}

impl Step {
    fn state(&self) -> RetrievalState {
        match self {
            Step::Start(_) => RetrievalState::Start,
            Step::SelectorsResolved => RetrievalState::SelectorsResolved,
            Step::DateEntered => RetrievalState::DateEntered,
            Step::CaptchaEntered => RetrievalState::CaptchaEntered,
            Step::Submitted => RetrievalState::Submitted,
            Step::DocumentLocated(_) => RetrievalState::DocumentLocated,
            Step::Downloaded(_) => RetrievalState::Downloaded,
        }
    }
}

/// Drives the cause-list form for one (location, date, captcha) request.
pub struct CauseListRetriever<'a> {
    portal: &'a PortalSettings,
    fetcher: &'a dyn DocumentFetcher,
}

impl<'a> CauseListRetriever<'a> {
    pub fn new(portal: &'a PortalSettings, fetcher: &'a dyn DocumentFetcher) -> Self {
        Self { portal, fetcher }
    }

    /// Run the request to `DOWNLOADED`. Nothing is written to disk here.
    pub async fn retrieve(
        &self,
        session: &mut dyn PortalSession,
        request: &CauseListRequest,
    ) -> Result<RetrievedDocument, RetrievalFailure> {
        let path = request
            .validate()
            .and_then(|_| request.path())
            .map_err(|e| RetrievalFailure::new(RetrievalState::Start, e))?;

        info!(
            "Retrieving cause list for {} on {}",
            request.court_name, request.date
        );

        let mut step = Step::Start(path);
        loop {
            let stage = step.state();
            step = match step {
                Step::Downloaded(document) => {
                    info!(
                        "Downloaded cause list for {} on {} ({} bytes)",
                        request.court_name,
                        request.date,
                        document.bytes.len()
                    );
                    return Ok(document);
                }
                current => match self.advance(session, request, current).await {
                    Ok(next) => next,
                    Err(error) => {
                        warn!(
                            "Retrieval for {} failed after {}: {}",
                            request.court_name, stage, error
                        );
                        return Err(RetrievalFailure::new(stage, error));
                    }
                },
            };
            debug!("{} -> {}", stage, step.state());
        }
    }

    async fn advance(
        &self,
        session: &mut dyn PortalSession,
        request: &CauseListRequest,
        step: Step,
    ) -> Result<Step, PortalError> {
        let form = &self.portal.form;
        match step {
            Step::Start(path) => {
                let navigator = SelectorNavigator::new(self.portal);
                navigator.open_form(session).await?;
                navigator.select_path(session, &path).await?;
                Ok(Step::SelectorsResolved)
            }
            Step::SelectorsResolved => {
                session.fill(&form.date, request.date.trim()).await?;
                Ok(Step::DateEntered)
            }
            Step::DateEntered => {
                session.fill(&form.captcha, request.captcha.trim()).await?;
                Ok(Step::CaptchaEntered)
            }
            Step::CaptchaEntered => {
                session.click(&form.submit).await?;
                session.settle(SettlePurpose::AfterSubmit).await;
                Ok(Step::Submitted)
            }
            Step::Submitted => {
                let html = session.content().await?;
                let page_url = session.current_url().await?;
                // Wrong captcha and "no sitting" both render without a
                // document; the portal gives nothing to tell them apart.
                let url = locate_document(&html, page_url.as_deref())
                    .ok_or(PortalError::DocumentNotFound)?;
                debug!("Located document at {}", url);
                Ok(Step::DocumentLocated(url))
            }
            Step::DocumentLocated(url) => {
                let bytes = self.fetcher.fetch(&url).await?;
                Ok(Step::Downloaded(RetrievedDocument { url, bytes }))
            }
            Step::Downloaded(document) => Ok(Step::Downloaded(document)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::testing::{FakePortal, SAMPLE_CAPTCHA};

    fn request(court: &str) -> CauseListRequest {
        CauseListRequest {
            state: "Delhi".into(),
            district: "New Delhi".into(),
            complex_name: "Patiala House".into(),
            court_name: court.into(),
            date: "19-10-2026".into(),
            captcha: SAMPLE_CAPTCHA.into(),
        }
    }

    #[tokio::test]
    async fn test_retrieves_document() {
        let portal = FakePortal::sample();
        let settings = PortalSettings::default();
        let mut session = portal.session();

        let doc = CauseListRetriever::new(&settings, &portal)
            .retrieve(&mut session, &request("Court 2"))
            .await
            .unwrap();

        assert_eq!(
            doc.url,
            "https://services.ecourts.gov.in/cause_lists/Court_2_19-10-2026.pdf"
        );
        assert!(doc.bytes.starts_with(b"%PDF"));
        assert_eq!(portal.submissions(), vec!["Court 2"]);
        assert_eq!(
            session.settles().last(),
            Some(&SettlePurpose::AfterSubmit)
        );
    }

    #[tokio::test]
    async fn test_wrong_captcha_is_document_not_found() {
        let portal = FakePortal::sample();
        let settings = PortalSettings::default();
        let mut req = request("Court 1");
        req.captcha = "wrong".into();

        let failure = CauseListRetriever::new(&settings, &portal)
            .retrieve(&mut portal.session(), &req)
            .await
            .unwrap_err();

        assert_eq!(failure.stage, RetrievalState::Submitted);
        assert!(matches!(failure.error, PortalError::DocumentNotFound));
        assert_eq!(failure.reason(), "document not found");
        assert!(portal.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_court_fails_at_start() {
        let portal = FakePortal::sample();
        let settings = PortalSettings::default();

        let failure = CauseListRetriever::new(&settings, &portal)
            .retrieve(&mut portal.session(), &request("Court 9"))
            .await
            .unwrap_err();

        assert_eq!(failure.stage, RetrievalState::Start);
        assert!(matches!(failure.error, PortalError::OptionNotFound { .. }));
        assert!(portal.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_after_location() {
        let portal = FakePortal::sample().failing_fetch("Court_4");
        let settings = PortalSettings::default();

        let failure = CauseListRetriever::new(&settings, &portal)
            .retrieve(&mut portal.session(), &request("Court 4"))
            .await
            .unwrap_err();

        assert_eq!(failure.stage, RetrievalState::DocumentLocated);
        assert_eq!(failure.error.kind(), "fetch");
    }

    #[tokio::test]
    async fn test_form_timeout_is_surfaced() {
        let portal = FakePortal::sample().unreachable("#court_name_code");
        let settings = PortalSettings::default();

        let failure = CauseListRetriever::new(&settings, &portal)
            .retrieve(&mut portal.session(), &request("Court 1"))
            .await
            .unwrap_err();

        assert_eq!(failure.stage, RetrievalState::Start);
        assert!(matches!(failure.error, PortalError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_invalid_request_never_touches_portal() {
        let portal = FakePortal::sample();
        let settings = PortalSettings::default();
        let mut req = request("Court 1");
        req.date = "19/10/2026".into();

        let mut session = portal.session();
        let failure = CauseListRetriever::new(&settings, &portal)
            .retrieve(&mut session, &req)
            .await
            .unwrap_err();

        assert!(matches!(failure.error, PortalError::InvalidRequest(_)));
        assert!(session.settles().is_empty());
    }
}

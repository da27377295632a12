//! Portal automation: selector navigation, case search, cause-list retrieval.
//!
//! [`Portal`] is the entry point. Every operation opens its own session from
//! the configured [`SessionFactory`] and closes it before returning, whether
//! the operation succeeded or not. No session outlives a call.

mod batch;
mod captcha;
mod extract;
mod navigator;
mod retrieval;
mod search;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{BatchOrchestrator, NO_COURTS_FOUND};
pub use captcha::CaptchaReader;
pub use extract::{extract_case_record, locate_document};
pub use navigator::SelectorNavigator;
pub use retrieval::{CauseListRetriever, RetrievalFailure, RetrievalState, RetrievedDocument};
pub use search::CaseSearcher;

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::debug;

use crate::config::{PortalSettings, Settings};
use crate::error::Result;
use crate::fetch::{DocumentFetcher, HttpDocumentFetcher};
use crate::models::{BatchReport, BatchRequest, CaseQuery, CaseRecord, CauseListRequest, LocationPath};
use crate::session::{BrowserSessionFactory, PortalSession, SessionFactory};
use crate::storage::{DocumentStore, StoredDocument};

/// Scoped access to the remote portal.
#[derive(Clone)]
pub struct Portal {
    sessions: Arc<dyn SessionFactory>,
    fetcher: Arc<dyn DocumentFetcher>,
    store: DocumentStore,
    settings: PortalSettings,
    batch_concurrency: usize,
}

impl Portal {
    pub fn new(
        sessions: Arc<dyn SessionFactory>,
        fetcher: Arc<dyn DocumentFetcher>,
        store: DocumentStore,
        settings: PortalSettings,
    ) -> Self {
        Self {
            sessions,
            fetcher,
            store,
            settings,
            batch_concurrency: 1,
        }
    }

    /// Browser sessions and an HTTP fetcher configured from `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let fetcher =
            HttpDocumentFetcher::new(&settings.browser.user_agent, settings.request_timeout())?;
        Ok(Self::new(
            Arc::new(BrowserSessionFactory::new(settings.browser.clone())),
            Arc::new(fetcher),
            DocumentStore::new(&settings.downloads_dir),
            settings.portal.clone(),
        )
        .with_batch_concurrency(settings.batch_concurrency))
    }

    pub fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_concurrency = concurrency.max(1);
        self
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    async fn open(&self) -> Result<Box<dyn PortalSession>> {
        debug!("Opening portal session");
        self.sessions.open().await
    }

    /// Options at the level after the last chosen one in `path`.
    pub async fn resolve_options(&self, path: &LocationPath) -> Result<Vec<String>> {
        let mut session = self.open().await?;
        let result = SelectorNavigator::new(&self.settings)
            .resolve(session.as_mut(), path)
            .await;
        session.close().await;
        result
    }

    /// Search relative to the local current date.
    pub async fn search(&self, query: &CaseQuery) -> Result<CaseRecord> {
        self.search_at(query, Local::now().date_naive()).await
    }

    pub async fn search_at(&self, query: &CaseQuery, today: NaiveDate) -> Result<CaseRecord> {
        query.validate()?;
        let mut session = self.open().await?;
        let result = CaseSearcher::new(&self.settings)
            .search(session.as_mut(), query, today)
            .await;
        session.close().await;
        result
    }

    /// Retrieve one court's cause list and write it to the store.
    pub async fn retrieve(
        &self,
        request: &CauseListRequest,
    ) -> std::result::Result<StoredDocument, RetrievalFailure> {
        batch::retrieve_and_store(
            self.sessions.as_ref(),
            self.fetcher.as_ref(),
            &self.store,
            &self.settings,
            request,
        )
        .await
    }

    /// Retrieve every court of a complex.
    pub async fn retrieve_batch(&self, request: &BatchRequest) -> BatchReport {
        BatchOrchestrator::new(
            self.sessions.as_ref(),
            self.fetcher.as_ref(),
            &self.store,
            &self.settings,
        )
        .with_concurrency(self.batch_concurrency)
        .run(request)
        .await
    }

    /// Current captcha as a `data:` URL.
    pub async fn captcha(&self) -> Result<String> {
        let mut session = self.open().await?;
        let result = CaptchaReader::new(&self.settings, self.fetcher.as_ref())
            .read(session.as_mut())
            .await;
        session.close().await;
        result
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use testing::FakePortal;

    /// A portal over the scripted fake, storing into `dir`.
    pub fn portal(fake: &FakePortal, dir: &std::path::Path) -> Portal {
        Portal::new(
            Arc::new(fake.clone()),
            Arc::new(fake.clone()),
            DocumentStore::new(dir),
            PortalSettings::default(),
        )
    }
}

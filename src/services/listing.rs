//! Cause-list availability and location lookups.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PortalError, Result};
use crate::models::{format_portal_date, LocationPath};
use crate::portal::Portal;

/// Which day's cause list a listing query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingDay {
    Today,
    Tomorrow,
}

impl ListingDay {
    pub fn target_date(&self, today: NaiveDate) -> NaiveDate {
        match self {
            ListingDay::Today => today,
            ListingDay::Tomorrow => today.succ_opt().unwrap_or(today),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingDay::Today => "today",
            ListingDay::Tomorrow => "tomorrow",
        }
    }
}

/// What can be requested for one day's cause lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CauseListInfo {
    pub day: ListingDay,
    /// `DD-MM-YYYY`, ready for the cause-list form.
    pub target_date: String,
    pub states: Vec<String>,
    pub total_states: usize,
    pub timestamp: String,
}

/// Listing queries and selector lookups.
#[derive(Clone)]
pub struct ListingService {
    portal: Portal,
}

impl ListingService {
    pub fn new(portal: Portal) -> Self {
        Self { portal }
    }

    pub async fn listing(&self, day: ListingDay) -> Result<CauseListInfo> {
        self.listing_at(day, Local::now().date_naive()).await
    }

    pub async fn listing_at(&self, day: ListingDay, today: NaiveDate) -> Result<CauseListInfo> {
        let states = self.states().await?;
        let target = day.target_date(today);
        info!(
            "Cause lists for {} ({}): {} states",
            day.as_str(),
            target,
            states.len()
        );

        Ok(CauseListInfo {
            day,
            target_date: format_portal_date(target),
            total_states: states.len(),
            states,
            timestamp: Local::now().to_rfc3339(),
        })
    }

    pub async fn states(&self) -> Result<Vec<String>> {
        self.portal.resolve_options(&LocationPath::new()).await
    }

    pub async fn districts(&self, state: &str) -> Result<Vec<String>> {
        let path = LocationPath::new().push(state)?;
        self.lookup(&path).await
    }

    pub async fn complexes(&self, state: &str, district: &str) -> Result<Vec<String>> {
        let path = LocationPath::new().push(state)?.push(district)?;
        self.lookup(&path).await
    }

    pub async fn courts(&self, state: &str, district: &str, complex: &str) -> Result<Vec<String>> {
        let path = LocationPath::new()
            .push(state)?
            .push(district)?
            .push(complex)?;
        self.lookup(&path).await
    }

    /// Options below `path`; an unknown location has none.
    async fn lookup(&self, path: &LocationPath) -> Result<Vec<String>> {
        match self.portal.resolve_options(path).await {
            Err(PortalError::OptionNotFound { level, label }) => {
                warn!("No {} named '{}', returning no options", level, label);
                Ok(Vec::new())
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::fixtures;
    use crate::portal::testing::FakePortal;

    fn service(fake: &FakePortal, dir: &std::path::Path) -> ListingService {
        ListingService::new(fixtures::portal(fake, dir))
    }

    #[tokio::test]
    async fn test_today_and_tomorrow_target_different_dates() {
        let fake = FakePortal::sample();
        let dir = tempfile::tempdir().unwrap();
        let service = service(&fake, dir.path());
        let today = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();

        let now = service.listing_at(ListingDay::Today, today).await.unwrap();
        let next = service
            .listing_at(ListingDay::Tomorrow, today)
            .await
            .unwrap();

        assert_eq!(now.target_date, "31-12-2026");
        assert_eq!(next.target_date, "01-01-2027");
        assert_eq!(now.states, vec!["Delhi", "Maharashtra", "Sikkim"]);
        assert_eq!(next.total_states, 3);
    }

    #[tokio::test]
    async fn test_lookups_walk_the_hierarchy() {
        let fake = FakePortal::sample();
        let dir = tempfile::tempdir().unwrap();
        let service = service(&fake, dir.path());

        assert_eq!(service.districts("Delhi").await.unwrap(), vec!["New Delhi"]);
        assert!(service.districts("Sikkim").await.unwrap().is_empty());
        let courts = service
            .courts("Delhi", "New Delhi", "Patiala House")
            .await
            .unwrap();
        assert_eq!(courts.len(), 5);
        assert_eq!(fake.closes(), 3);
    }

    #[tokio::test]
    async fn test_unknown_location_has_no_options() {
        let fake = FakePortal::sample();
        let dir = tempfile::tempdir().unwrap();
        let service = service(&fake, dir.path());

        assert!(service.complexes("Delhi", "Gotham").await.unwrap().is_empty());
        assert!(service
            .complexes("Atlantis", "Nowhere")
            .await
            .unwrap()
            .is_empty());
        assert!(service.districts("Atlantis").await.unwrap().is_empty());
        assert_eq!(fake.opens(), fake.closes());
    }

    #[tokio::test]
    async fn test_unknown_location_still_fails_in_portal() {
        let fake = FakePortal::sample();
        let dir = tempfile::tempdir().unwrap();
        let path = LocationPath::new().push("Atlantis").unwrap();

        let err = fixtures::portal(&fake, dir.path())
            .resolve_options(&path)
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::OptionNotFound { .. }));
    }

    #[test]
    fn test_listing_day_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ListingDay::Tomorrow).unwrap(),
            "\"tomorrow\""
        );
    }
}

//! Cascading location selectors: state → district → court complex → court.

use tracing::{debug, info};

use crate::config::PortalSettings;
use crate::error::{PortalError, Result};
use crate::models::{LocationPath, SelectorLevel};
use crate::session::{PortalSession, SettlePurpose};

/// Drives the four dependent selectors of the cause-list form.
///
/// Every call starts from a freshly loaded form: the portal repopulates
/// child selectors whenever a parent changes, so nothing read in an earlier
/// call is trusted.
#[derive(Debug, Clone, Copy)]
pub struct SelectorNavigator<'a> {
    portal: &'a PortalSettings,
}

impl<'a> SelectorNavigator<'a> {
    pub fn new(portal: &'a PortalSettings) -> Self {
        Self { portal }
    }

    /// Options at the level after the last chosen one in `path`.
    ///
    /// An empty path yields the states.
    pub async fn resolve(
        &self,
        session: &mut dyn PortalSession,
        path: &LocationPath,
    ) -> Result<Vec<String>> {
        let next = path.next_level().ok_or_else(|| {
            PortalError::InvalidRequest("location path already names a court".to_string())
        })?;

        self.open_form(session).await?;
        self.select_path(session, path).await?;
        let options = self.read_options(session, next).await?;

        info!("Fetched {} {} options", options.len(), next);
        Ok(options)
    }

    /// Load the cause-list page and wait for every selector control.
    pub async fn open_form(&self, session: &mut dyn PortalSession) -> Result<()> {
        session.navigate(&self.portal.cause_list_url).await?;
        for level in SelectorLevel::ALL {
            session
                .wait_for(&format!("#{}", self.portal.form.selector(level)))
                .await?;
        }
        Ok(())
    }

    /// Select each chosen level in order, settling after each.
    pub async fn select_path(
        &self,
        session: &mut dyn PortalSession,
        path: &LocationPath,
    ) -> Result<()> {
        for (level, label) in path.chosen() {
            self.select(session, level, label).await?;
            session.settle(SettlePurpose::AfterSelect).await;
        }
        Ok(())
    }

    /// Choose `label` at `level` by exact visible text.
    pub async fn select(
        &self,
        session: &mut dyn PortalSession,
        level: SelectorLevel,
        label: &str,
    ) -> Result<()> {
        let control = self.portal.form.selector(level);
        debug!("Selecting {} '{}' in #{}", level, label, control);

        if session.select_by_text(control, label).await? {
            Ok(())
        } else {
            Err(PortalError::option_not_found(level.as_str(), label))
        }
    }

    /// Current labels of `level`, without the placeholder or blanks.
    pub async fn read_options(
        &self,
        session: &mut dyn PortalSession,
        level: SelectorLevel,
    ) -> Result<Vec<String>> {
        session.settle(SettlePurpose::BeforeOptionsRead).await;
        let labels = session.options(self.portal.form.selector(level)).await?;

        let placeholder = self.portal.form.placeholder.as_str();
        Ok(labels
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty() && l != placeholder)
            .collect())
    }
}

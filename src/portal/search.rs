//! Case-status search by CNR or by case type, number and year.

use chrono::NaiveDate;
use tracing::{debug, info};

use super::extract::extract_case_record;
use crate::config::PortalSettings;
use crate::error::{PortalError, Result};
use crate::models::{CaseQuery, CaseRecord};
use crate::session::{PortalSession, SettlePurpose};

/// Fills and submits the case-status form, then extracts the result.
#[derive(Debug, Clone, Copy)]
pub struct CaseSearcher<'a> {
    portal: &'a PortalSettings,
}

impl<'a> CaseSearcher<'a> {
    pub fn new(portal: &'a PortalSettings) -> Self {
        Self { portal }
    }

    /// Search and extract. An empty record means the search ran and found
    /// nothing; any failure to run it is a [`PortalError::Search`].
    pub async fn search(
        &self,
        session: &mut dyn PortalSession,
        query: &CaseQuery,
        today: NaiveDate,
    ) -> Result<CaseRecord> {
        query.validate()?;

        let html = self
            .submit(session, query)
            .await
            .map_err(|e| PortalError::search(query.to_string(), e))?;

        let record = extract_case_record(&html, today);
        if record.is_empty() {
            info!("No case found for {}", query);
        } else {
            info!("Case search completed for {}", query);
        }
        Ok(record)
    }

    async fn submit(&self, session: &mut dyn PortalSession, query: &CaseQuery) -> Result<String> {
        let form = &self.portal.form;
        session.navigate(&self.portal.case_status_url).await?;

        match query {
            CaseQuery::Cnr { cnr } => {
                session.wait_for(&format!("#{}", form.cnr)).await?;
                session.fill(&form.cnr, cnr.trim()).await?;
            }
            CaseQuery::Details {
                case_type,
                case_number,
                year,
            } => {
                session.wait_for(&format!("#{}", form.case_type)).await?;
                let case_type = case_type.trim();
                if !session.select_by_text(&form.case_type, case_type).await? {
                    return Err(PortalError::option_not_found("case type", case_type));
                }
                session.settle(SettlePurpose::AfterSelect).await;
                session.fill(&form.case_number, case_number.trim()).await?;
                session.fill(&form.case_year, year.trim()).await?;
            }
        }

        debug!("Submitting case search for {}", query);
        session.click(&form.submit).await?;
        session.settle(SettlePurpose::AfterSubmit).await;
        session.content().await
    }
}

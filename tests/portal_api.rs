//! End-to-end checks through the public library API with a scripted session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use ecourts::config::PortalSettings;
use ecourts::export::{OutputManager, ResultFormat};
use ecourts::fetch::DocumentFetcher;
use ecourts::models::{BatchRequest, CaseQuery, CaseSummary, ListingState};
use ecourts::services::CaseService;
use ecourts::session::{PortalSession, SessionFactory, SettlePurpose};
use ecourts::storage::DocumentStore;
use ecourts::{Portal, PortalError, Result};

const CASE_PAGE: &str = r#"
<table class="case_info">
  <tr><td>CNR Number</td><td>MHPU010004562024</td></tr>
  <tr><td>Petitioner</td><td>श्री गणेश ट्रेडर्स</td></tr>
</table>
<div class="hearing_info">
  <span class="hearing_date">20-10-2026</span>
  <span class="serial_number">4</span>
</div>"#;

/// A one-complex portal: Maharashtra / Pune / Shivajinagar with two courts.
#[derive(Default)]
struct ScriptedSession {
    selected: HashMap<String, String>,
    inputs: HashMap<String, String>,
    page: String,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl PortalSession for ScriptedSession {
    async fn navigate(&mut self, _url: &str) -> Result<()> {
        self.page.clear();
        Ok(())
    }

    async fn wait_for(&mut self, _selector: &str) -> Result<()> {
        Ok(())
    }

    async fn options(&mut self, control_id: &str) -> Result<Vec<String>> {
        let labels: &[&str] = match control_id {
            "state_code" => &["Maharashtra"],
            "district_code" => &["Pune"],
            "court_complex_code" => &["Shivajinagar"],
            "court_name_code" => &["Court A", "Court B"],
            _ => &[],
        };
        let mut options = vec!["---Select---".to_string()];
        options.extend(labels.iter().map(|s| s.to_string()));
        Ok(options)
    }

    async fn select_by_text(&mut self, control_id: &str, label: &str) -> Result<bool> {
        let found = self.options(control_id).await?.iter().any(|o| o == label);
        if found {
            self.selected.insert(control_id.to_string(), label.to_string());
        }
        Ok(found)
    }

    async fn fill(&mut self, input_id: &str, value: &str) -> Result<()> {
        self.inputs.insert(input_id.to_string(), value.to_string());
        Ok(())
    }

    async fn click(&mut self, _element_id: &str) -> Result<()> {
        self.page = if self.inputs.contains_key("cnr_number") {
            CASE_PAGE.to_string()
        } else if self.selected.get("court_name_code").map(String::as_str) == Some("Court B") {
            "<div class=\"alert\">No cause list</div>".to_string()
        } else {
            "<iframe src=\"/docs/cause_list.pdf\"></iframe>".to_string()
        };
        Ok(())
    }

    async fn content(&mut self) -> Result<String> {
        Ok(self.page.clone())
    }

    async fn current_url(&mut self) -> Result<Option<String>> {
        Ok(Some("https://portal.test/ecourtindia_v6/".to_string()))
    }

    async fn attribute(&mut self, _element_id: &str, _name: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn settle(&mut self, _purpose: SettlePurpose) {}

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct ScriptedPortal {
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl SessionFactory for ScriptedPortal {
    async fn open(&self) -> Result<Box<dyn PortalSession>> {
        Ok(Box::new(ScriptedSession {
            closes: self.closes.clone(),
            ..Default::default()
        }))
    }
}

#[async_trait]
impl DocumentFetcher for ScriptedPortal {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if url == "https://portal.test/docs/cause_list.pdf" {
            Ok(b"%PDF-1.7 cause list".to_vec())
        } else {
            Err(PortalError::Fetch {
                url: url.to_string(),
                reason: "unexpected url".to_string(),
            })
        }
    }
}

fn portal(scripted: Arc<ScriptedPortal>, dir: &std::path::Path) -> Portal {
    Portal::new(
        scripted.clone(),
        scripted,
        DocumentStore::new(dir),
        PortalSettings::default(),
    )
}

#[tokio::test]
async fn test_batch_download_through_public_api() {
    let scripted = Arc::new(ScriptedPortal::default());
    let dir = tempfile::tempdir().unwrap();
    let portal = portal(scripted.clone(), dir.path());

    let report = portal
        .retrieve_batch(&BatchRequest {
            state: "Maharashtra".into(),
            district: "Pune".into(),
            complex_name: "Shivajinagar".into(),
            date: "19-10-2026".into(),
            captcha: "abcd".into(),
        })
        .await;

    assert_eq!((report.total, report.successful, report.failed), (2, 1, 1));
    assert!(dir
        .path()
        .join("Maharashtra_Pune_Court A_19-10-2026.pdf")
        .is_file());
    let archive = report.archive.expect("archive for successful batch");
    assert!(archive.is_file());
    // Enumeration plus one session per court.
    assert_eq!(scripted.closes.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_case_summary_saved_with_non_ascii() {
    let scripted = Arc::new(ScriptedPortal::default());
    let dir = tempfile::tempdir().unwrap();
    let service = CaseService::new(portal(scripted, &dir.path().join("downloads")));
    let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

    let summary = service
        .search_at(&CaseQuery::cnr("MHPU010004562024"), today)
        .await
        .unwrap()
        .expect("case found");
    assert_eq!(summary.listing_status.status, ListingState::Tomorrow);
    assert_eq!(summary.listing_status.days_until_listing, Some(1));

    let output = OutputManager::new(dir.path().join("results"));
    let path = output
        .save_result(&summary, "case_MHPU010004562024", ResultFormat::Json)
        .await
        .unwrap();

    let body = std::fs::read_to_string(path).unwrap();
    assert!(body.contains("श्री गणेश ट्रेडर्स"));
    let back: CaseSummary = serde_json::from_str(&body).unwrap();
    assert_eq!(back, summary);
}

//! Scripted in-memory portal for exercising the form state machines.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::{FormIds, PortalSettings};
use crate::error::{PortalError, Result};
use crate::fetch::DocumentFetcher;
use crate::session::{PortalSession, SessionFactory, SettlePurpose};

type Courts = Vec<String>;
type Complexes = BTreeMap<String, Courts>;
type Districts = BTreeMap<String, Complexes>;

struct Inner {
    portal: PortalSettings,
    tree: BTreeMap<String, Districts>,
    case_types: Vec<String>,
    cases: HashMap<String, String>,
    captcha: String,
    captcha_src: String,
    missing_documents: HashSet<String>,
    failing_fetches: Vec<String>,
    unreachable: HashSet<String>,
    fail_open: bool,
    opens: usize,
    closes: usize,
    submissions: Vec<String>,
    fetched: Vec<String>,
}

/// Shared fake backing any number of sessions, and the document fetcher.
#[derive(Clone)]
pub struct FakePortal {
    inner: Arc<Mutex<Inner>>,
}

pub const SAMPLE_CAPTCHA: &str = "x7k2";

impl FakePortal {
    /// Delhi/New Delhi/Patiala House with five courts, plus smaller branches.
    pub fn sample() -> Self {
        let courts = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let mut tree = BTreeMap::new();
        tree.insert(
            "Delhi".to_string(),
            BTreeMap::from([(
                "New Delhi".to_string(),
                BTreeMap::from([
                    (
                        "Patiala House".to_string(),
                        courts(&["Court 1", "Court 2", "Court 3", "Court 4", "Court 5"]),
                    ),
                    ("Empty Complex".to_string(), Vec::new()),
                ]),
            )]),
        );
        tree.insert(
            "Maharashtra".to_string(),
            BTreeMap::from([(
                "Pune".to_string(),
                BTreeMap::from([(
                    "Shivajinagar".to_string(),
                    courts(&["Civil Judge Senior Division"]),
                )]),
            )]),
        );
        tree.insert("Sikkim".to_string(), BTreeMap::new());

        Self {
            inner: Arc::new(Mutex::new(Inner {
                portal: PortalSettings::default(),
                tree,
                case_types: courts(&["CS", "CR", "MACT"]),
                cases: HashMap::new(),
                captcha: SAMPLE_CAPTCHA.to_string(),
                captcha_src: "data:image/png;base64,iVBORw0KGgo=".to_string(),
                missing_documents: HashSet::new(),
                failing_fetches: Vec::new(),
                unreachable: HashSet::new(),
                fail_open: false,
                opens: 0,
                closes: 0,
                submissions: Vec::new(),
                fetched: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Result markup returned for a CNR, or for `"{type}/{number}/{year}"`.
    pub fn with_case(self, key: &str, html: &str) -> Self {
        self.lock().cases.insert(key.to_string(), html.to_string());
        self
    }

    /// Submitting this court renders no document reference.
    pub fn without_document(self, court: &str) -> Self {
        self.lock().missing_documents.insert(court.to_string());
        self
    }

    /// Fetches of URLs containing `pattern` fail.
    pub fn failing_fetch(self, pattern: &str) -> Self {
        self.lock().failing_fetches.push(pattern.to_string());
        self
    }

    /// Waits for this CSS selector never succeed.
    pub fn unreachable(self, selector: &str) -> Self {
        self.lock().unreachable.insert(selector.to_string());
        self
    }

    /// Opening a session fails.
    pub fn failing_open(self) -> Self {
        self.lock().fail_open = true;
        self
    }

    pub fn with_captcha_src(self, src: &str) -> Self {
        self.lock().captcha_src = src.to_string();
        self
    }

    /// A session that bypasses open accounting.
    pub fn session(&self) -> FakeSession {
        FakeSession {
            inner: self.inner.clone(),
            page: FakePage::Blank,
            url: None,
            selected: HashMap::new(),
            inputs: HashMap::new(),
            settles: Vec::new(),
            closed: false,
        }
    }

    pub fn opens(&self) -> usize {
        self.lock().opens
    }

    pub fn closes(&self) -> usize {
        self.lock().closes
    }

    /// Courts submitted on the cause-list form, in order.
    pub fn submissions(&self) -> Vec<String> {
        self.lock().submissions.clone()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.lock().fetched.clone()
    }
}

#[async_trait]
impl SessionFactory for FakePortal {
    async fn open(&self) -> Result<Box<dyn PortalSession>> {
        {
            let mut inner = self.lock();
            if inner.fail_open {
                return Err(PortalError::session("browser unavailable"));
            }
            inner.opens += 1;
        }
        Ok(Box::new(self.session()))
    }
}

#[async_trait]
impl DocumentFetcher for FakePortal {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let mut inner = self.lock();
        inner.fetched.push(url.to_string());
        if inner.failing_fetches.iter().any(|p| url.contains(p.as_str())) {
            return Err(PortalError::Fetch {
                url: url.to_string(),
                reason: "HTTP 500 Internal Server Error".to_string(),
            });
        }
        Ok(format!("%PDF-1.4 {}", url).into_bytes())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FakePage {
    Blank,
    CauseList,
    CaseStatus,
    Result(String),
}

pub struct FakeSession {
    inner: Arc<Mutex<Inner>>,
    page: FakePage,
    url: Option<String>,
    selected: HashMap<String, String>,
    inputs: HashMap<String, String>,
    settles: Vec<SettlePurpose>,
    closed: bool,
}

impl FakeSession {
    pub fn settles(&self) -> Vec<SettlePurpose> {
        self.settles.clone()
    }

    fn form(&self) -> FormIds {
        self.inner.lock().unwrap().portal.form.clone()
    }

    fn elements(&self) -> Vec<String> {
        let f = self.form();
        match self.page {
            FakePage::CauseList => vec![
                f.state,
                f.district,
                f.complex,
                f.court,
                f.date,
                f.captcha,
                f.captcha_image,
                f.submit,
            ],
            FakePage::CaseStatus => vec![f.cnr, f.case_type, f.case_number, f.case_year, f.submit],
            _ => Vec::new(),
        }
    }

    fn has(&self, id: &str) -> bool {
        self.elements().iter().any(|e| e == id)
    }

    fn location_controls(&self) -> [String; 4] {
        let f = self.form();
        [f.state, f.district, f.complex, f.court]
    }

    fn selection(&self, id: &str) -> Option<&str> {
        self.selected.get(id).map(String::as_str)
    }
}

#[async_trait]
impl PortalSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let portal = self.inner.lock().unwrap().portal.clone();
        self.page = if url == portal.cause_list_url {
            FakePage::CauseList
        } else if url == portal.case_status_url {
            FakePage::CaseStatus
        } else {
            return Err(PortalError::session(format!("unreachable: {}", url)));
        };
        self.url = Some(url.to_string());
        self.selected.clear();
        self.inputs.clear();
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str) -> Result<()> {
        let unreachable = self.inner.lock().unwrap().unreachable.contains(selector);
        let id = selector.trim_start_matches('#');
        if unreachable || !self.has(id) {
            return Err(PortalError::timeout(selector, 10));
        }
        Ok(())
    }

    async fn options(&mut self, control_id: &str) -> Result<Vec<String>> {
        if !self.has(control_id) {
            return Err(PortalError::ElementNotFound(control_id.to_string()));
        }
        let form = self.form();
        let [state, district, complex, court] = self.location_controls();
        let inner = self.inner.lock().unwrap();

        let mut labels = vec![form.placeholder.clone()];
        let chosen = |id: &str| self.selected.get(id).cloned();
        let found: Vec<String> = if control_id == form.case_type {
            inner.case_types.clone()
        } else if control_id == state {
            inner.tree.keys().cloned().collect()
        } else if control_id == district {
            chosen(&state)
                .and_then(|s| inner.tree.get(&s))
                .map(|d| d.keys().cloned().collect())
                .unwrap_or_default()
        } else if control_id == complex {
            chosen(&state)
                .zip(chosen(&district))
                .and_then(|(s, d)| inner.tree.get(&s)?.get(&d).cloned())
                .map(|c| c.keys().cloned().collect())
                .unwrap_or_default()
        } else if control_id == court {
            match (chosen(&state), chosen(&district), chosen(&complex)) {
                (Some(s), Some(d), Some(c)) => inner
                    .tree
                    .get(&s)
                    .and_then(|x| x.get(&d))
                    .and_then(|x| x.get(&c))
                    .cloned()
                    .unwrap_or_default(),
                _ => Vec::new(),
            }
        } else {
            return Err(PortalError::ElementNotFound(control_id.to_string()));
        };

        labels.extend(found);
        Ok(labels)
    }

    async fn select_by_text(&mut self, control_id: &str, label: &str) -> Result<bool> {
        let options = self.options(control_id).await?;
        if !options.iter().any(|o| o == label) {
            return Ok(false);
        }
        self.selected
            .insert(control_id.to_string(), label.to_string());

        // Changing a parent repopulates every child.
        let controls = self.location_controls();
        if let Some(pos) = controls.iter().position(|c| c == control_id) {
            for child in &controls[pos + 1..] {
                self.selected.remove(child);
            }
        }
        Ok(true)
    }

    async fn fill(&mut self, input_id: &str, value: &str) -> Result<()> {
        if !self.has(input_id) {
            return Err(PortalError::ElementNotFound(input_id.to_string()));
        }
        self.inputs.insert(input_id.to_string(), value.to_string());
        Ok(())
    }

    async fn click(&mut self, element_id: &str) -> Result<()> {
        let form = self.form();
        if element_id != form.submit || !self.has(element_id) {
            return Err(PortalError::ElementNotFound(element_id.to_string()));
        }

        let html = match self.page {
            FakePage::CauseList => {
                let court = self.selection(&form.court).unwrap_or_default().to_string();
                let date = self.inputs.get(&form.date).cloned().unwrap_or_default();
                let captcha = self.inputs.get(&form.captcha).cloned().unwrap_or_default();

                let mut inner = self.inner.lock().unwrap();
                inner.submissions.push(court.clone());
                if captcha != inner.captcha {
                    r#"<div class="alert">Invalid Captcha</div>"#.to_string()
                } else if court.is_empty() || inner.missing_documents.contains(&court) {
                    r#"<div class="alert">Cause list not available</div>"#.to_string()
                } else {
                    format!(
                        r#"<div id="cause_list"><iframe src="/cause_lists/{}_{}.pdf"></iframe></div>"#,
                        court.replace(' ', "_"),
                        date
                    )
                }
            }
            FakePage::CaseStatus => {
                let key = match self.inputs.get(&form.cnr).filter(|c| !c.is_empty()) {
                    Some(cnr) => cnr.clone(),
                    None => format!(
                        "{}/{}/{}",
                        self.selection(&form.case_type).unwrap_or_default(),
                        self.inputs.get(&form.case_number).cloned().unwrap_or_default(),
                        self.inputs.get(&form.case_year).cloned().unwrap_or_default()
                    ),
                };
                self.inner
                    .lock()
                    .unwrap()
                    .cases
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| r#"<div class="alert">Record not found</div>"#.to_string())
            }
            _ => return Err(PortalError::ElementNotFound(element_id.to_string())),
        };

        self.page = FakePage::Result(html);
        Ok(())
    }

    async fn content(&mut self) -> Result<String> {
        Ok(match &self.page {
            FakePage::Result(html) => format!("<html><body>{}</body></html>", html),
            FakePage::Blank => String::new(),
            _ => "<html><body><form></form></body></html>".to_string(),
        })
    }

    async fn current_url(&mut self) -> Result<Option<String>> {
        Ok(self.url.clone())
    }

    async fn attribute(&mut self, element_id: &str, name: &str) -> Result<Option<String>> {
        if !self.has(element_id) {
            return Err(PortalError::ElementNotFound(element_id.to_string()));
        }
        let inner = self.inner.lock().unwrap();
        if element_id == inner.portal.form.captcha_image && name == "src" {
            return Ok(Some(inner.captcha_src.clone()));
        }
        Ok(None)
    }

    async fn settle(&mut self, purpose: SettlePurpose) {
        self.settles.push(purpose);
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.inner.lock().unwrap().closes += 1;
        }
    }
}

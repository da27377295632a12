//! Configuration management using the prefer crate.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::SelectorLevel;
use crate::session::BrowserEngineConfig;

/// Default cause-list form page.
pub const DEFAULT_CAUSE_LIST_URL: &str =
    "https://services.ecourts.gov.in/ecourtindia_v6/?p=cause_list/";

/// Default case-status form page.
pub const DEFAULT_CASE_STATUS_URL: &str =
    "https://services.ecourts.gov.in/ecourtindia_v6/?p=case_status";

/// Label of the "nothing chosen" entry in every selector.
pub const DEFAULT_PLACEHOLDER: &str = "---Select---";

/// Default retention for stored documents and results.
pub const DEFAULT_RETENTION_DAYS: u64 = 30;

const DOWNLOADS_SUBDIR: &str = "downloads";
const RESULTS_SUBDIR: &str = "results";

/// DOM ids of the portal's form controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormIds {
    pub state: String,
    pub district: String,
    pub complex: String,
    pub court: String,
    pub date: String,
    pub captcha: String,
    pub captcha_image: String,
    pub submit: String,
    pub cnr: String,
    pub case_type: String,
    pub case_number: String,
    pub case_year: String,
    /// Visible label of the unselected option.
    pub placeholder: String,
}

impl Default for FormIds {
    fn default() -> Self {
        Self {
            state: "state_code".to_string(),
            district: "district_code".to_string(),
            complex: "court_complex_code".to_string(),
            court: "court_name_code".to_string(),
            date: "cause_list_date".to_string(),
            captcha: "captcha_code".to_string(),
            captcha_image: "captcha_image".to_string(),
            submit: "submit_btn".to_string(),
            cnr: "cnr_number".to_string(),
            case_type: "case_type".to_string(),
            case_number: "case_number".to_string(),
            case_year: "case_year".to_string(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl FormIds {
    /// Control id of a location selector.
    pub fn selector(&self, level: SelectorLevel) -> &str {
        match level {
            SelectorLevel::State => &self.state,
            SelectorLevel::District => &self.district,
            SelectorLevel::Complex => &self.complex,
            SelectorLevel::Court => &self.court,
        }
    }
}

/// Where the portal lives and what its forms look like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalSettings {
    pub cause_list_url: String,
    pub case_status_url: String,
    pub form: FormIds,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            cause_list_url: DEFAULT_CAUSE_LIST_URL.to_string(),
            case_status_url: DEFAULT_CASE_STATUS_URL.to_string(),
            form: FormIds::default(),
        }
    }
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Directory for retrieved cause-list documents.
    pub downloads_dir: PathBuf,
    /// Directory for exported results.
    pub results_dir: PathBuf,
    /// Portal URLs and form vocabulary.
    pub portal: PortalSettings,
    /// Browser engine options (identity, timeouts, settle delays).
    pub browser: BrowserEngineConfig,
    /// Document fetch timeout in seconds.
    pub request_timeout: u64,
    /// Courts retrieved in parallel during a batch (1 = sequential).
    pub batch_concurrency: usize,
    /// Age after which cleanup removes stored files.
    pub retention_days: u64,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back gracefully: local data dir -> current dir
        let data_dir = dirs::data_local_dir()
            .map(|d| d.join("ecourts"))
            .unwrap_or_else(|| PathBuf::from("."));

        Self::with_data_dir(data_dir)
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            downloads_dir: data_dir.join(DOWNLOADS_SUBDIR),
            results_dir: data_dir.join(RESULTS_SUBDIR),
            data_dir,
            portal: PortalSettings::default(),
            browser: BrowserEngineConfig::default(),
            request_timeout: 30,
            batch_concurrency: 1,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Ensure all directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for (label, dir) in [
            ("downloads", &self.downloads_dir),
            ("results", &self.results_dir),
        ] {
            fs::create_dir_all(dir).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create {} directory '{}': {}",
                        label,
                        dir.display(),
                        e
                    ),
                )
            })?;
        }
        Ok(())
    }

    /// Apply environment overrides. `lookup` is usually `std::env::var`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get("ECOURTS_DOWNLOADS_DIR") {
            tracing::debug!("Using ECOURTS_DOWNLOADS_DIR from environment: {}", dir);
            self.downloads_dir = PathBuf::from(shellexpand::tilde(&dir).as_ref());
        }
        if let Some(dir) = get("ECOURTS_RESULTS_DIR") {
            tracing::debug!("Using ECOURTS_RESULTS_DIR from environment: {}", dir);
            self.results_dir = PathBuf::from(shellexpand::tilde(&dir).as_ref());
        }
        if let Some(url) = get("ECOURTS_REMOTE_BROWSER") {
            tracing::debug!("Using ECOURTS_REMOTE_BROWSER from environment: {}", url);
            self.browser.remote_url = Some(url);
        }
    }
}

/// Form vocabulary overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct FormConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captcha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captcha_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cnr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl FormConfig {
    pub fn is_default(&self) -> bool {
        serde_json::to_value(self)
            .map(|v| v.as_object().is_some_and(|o| o.is_empty()))
            .unwrap_or(true)
    }

    fn apply(&self, form: &mut FormIds) {
        let pairs = [
            (&self.state, &mut form.state),
            (&self.district, &mut form.district),
            (&self.complex, &mut form.complex),
            (&self.court, &mut form.court),
            (&self.date, &mut form.date),
            (&self.captcha, &mut form.captcha),
            (&self.captcha_image, &mut form.captcha_image),
            (&self.submit, &mut form.submit),
            (&self.cnr, &mut form.cnr),
            (&self.case_type, &mut form.case_type),
            (&self.case_number, &mut form.case_number),
            (&self.case_year, &mut form.case_year),
            (&self.placeholder, &mut form.placeholder),
        ];
        for (value, target) in pairs {
            if let Some(value) = value {
                *target = value.clone();
            }
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Downloads directory (defaults to `{data_dir}/downloads`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads_dir: Option<String>,
    /// Results directory (defaults to `{data_dir}/results`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause_list_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_status_url: Option<String>,
    /// User agent string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Document fetch timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Bound on page loads and element waits, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_after_select_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_before_options_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_after_submit_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_concurrency: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_days: Option<u64>,
    /// Run the browser headless (default true).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headless: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stealth: Option<bool>,
    /// Proxy server URL for the browser.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    /// Remote Chrome DevTools URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_browser: Option<String>,
    /// Additional Chrome arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[prefer(default)]
    pub chrome_args: Vec<String>,
    /// Form control ids.
    #[serde(default, skip_serializing_if = "FormConfig::is_default")]
    #[prefer(default)]
    pub form: FormConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers ecourts config files in standard locations.
    pub async fn load() -> Self {
        // Use prefer for file discovery, then parse with serde
        match prefer::load("ecourts").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await.unwrap_or_else(|e| {
                    tracing::warn!("{}", e);
                    Self::default()
                }),
                None => Self::default(),
            },
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    /// `base_dir` is used to resolve relative paths (typically config file dir or CWD).
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
            settings.downloads_dir = settings.data_dir.join(DOWNLOADS_SUBDIR);
            settings.results_dir = settings.data_dir.join(RESULTS_SUBDIR);
        }
        if let Some(ref dir) = self.downloads_dir {
            settings.downloads_dir = self.resolve_path(dir, base_dir);
        }
        if let Some(ref dir) = self.results_dir {
            settings.results_dir = self.resolve_path(dir, base_dir);
        }
        if let Some(ref url) = self.cause_list_url {
            settings.portal.cause_list_url = url.clone();
        }
        if let Some(ref url) = self.case_status_url {
            settings.portal.case_status_url = url.clone();
        }
        self.form.apply(&mut settings.portal.form);

        if let Some(ref user_agent) = self.user_agent {
            settings.browser.user_agent = user_agent.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(secs) = self.ready_timeout_secs {
            settings.browser.ready_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = self.settle_after_select_ms {
            settings.browser.settle.after_select = Duration::from_millis(ms);
        }
        if let Some(ms) = self.settle_before_options_ms {
            settings.browser.settle.before_options_read = Duration::from_millis(ms);
        }
        if let Some(ms) = self.settle_after_submit_ms {
            settings.browser.settle.after_submit = Duration::from_millis(ms);
        }
        if let Some(n) = self.batch_concurrency {
            settings.batch_concurrency = n.max(1) as usize;
        }
        if let Some(days) = self.retention_days {
            settings.retention_days = days;
        }
        if let Some(headless) = self.headless {
            settings.browser.headless = headless;
        }
        if let Some(stealth) = self.stealth {
            settings.browser.stealth = stealth;
        }
        if let Some(ref proxy) = self.proxy {
            settings.browser.proxy = Some(proxy.clone());
        }
        if let Some(ref remote) = self.remote_browser {
            settings.browser.remote_url = Some(remote.clone());
        }
        if !self.chrome_args.is_empty() {
            settings.browser.chrome_args = self.chrome_args.clone();
        }
    }
}

/// Load settings from an explicit config path, or by discovery.
/// Returns (Settings, Config) tuple.
pub async fn load_settings(config_path: Option<&Path>) -> (Settings, Config) {
    let config = match config_path {
        // Priority 1: Explicit --config flag
        Some(path) => Config::load_from_path(path).await.unwrap_or_else(|e| {
            tracing::warn!("{}; using defaults", e);
            Config::default()
        }),
        // Priority 2: Auto-discover via prefer
        None => Config::load().await,
    };

    let mut settings = Settings::default();
    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    config.apply_to_settings(&mut settings, &base_dir);

    // Environment takes highest precedence
    settings.apply_env(|key| std::env::var(key).ok());

    (settings, config)
}

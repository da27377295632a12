//! Chrome DevTools session handle for the portal.
//!
//! Uses chromiumoxide (CDP) to drive one tab per session. Form interaction is
//! done with small scripts evaluated in the page so that selection fires the
//! same `change` events the portal's own handlers listen for.

#[cfg(feature = "browser")]
use std::path::PathBuf;
#[cfg(feature = "browser")]
use std::time::{Duration, Instant};

use async_trait::async_trait;
#[cfg(feature = "browser")]
use serde::de::DeserializeOwned;
#[cfg(feature = "browser")]
use tokio::task::JoinHandle;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;

use super::{BrowserEngineConfig, PortalSession, SessionFactory};
#[cfg(feature = "browser")]
use super::SettlePurpose;
use crate::error::{PortalError, Result};

/// Automation-detection countermeasures injected after each page load.
#[cfg(feature = "browser")]
const STEALTH_SCRIPTS: &[&str] = &[
    // Remove webdriver property
    r#"
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined,
        configurable: true
    });
    "#,
    // Fix chrome object
    r#"
    window.chrome = window.chrome || {
        runtime: {},
        loadTimes: function() {},
        csi: function() {},
        app: {}
    };
    "#,
    // Fix languages
    r#"
    Object.defineProperty(navigator, 'languages', {
        get: () => ['en-IN', 'en-US', 'en'],
        configurable: true
    });
    "#,
];

/// JavaScript to wait for page ready state.
#[cfg(feature = "browser")]
const WAIT_FOR_READY_SCRIPT: &str = r#"
    new Promise((resolve) => {
        if (document.readyState === 'complete' || document.readyState === 'interactive') {
            resolve(document.readyState);
        } else {
            document.addEventListener('DOMContentLoaded', () => resolve(document.readyState));
        }
    })
"#;

/// Interval between presence checks in `wait_for`.
#[cfg(feature = "browser")]
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Common Chrome executable paths to check.
#[cfg(feature = "browser")]
const CHROME_PATHS: &[&str] = &[
    // Linux
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    // macOS
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    // Common install locations
    "/opt/google/chrome/google-chrome",
];

/// Quote a value as a JavaScript string literal.
#[cfg(feature = "browser")]
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Find a Chrome executable on this machine.
#[cfg(feature = "browser")]
fn find_chrome() -> Result<PathBuf> {
    for path in CHROME_PATHS {
        let p = std::path::Path::new(path);
        if p.exists() {
            info!("Found Chrome at: {}", path);
            return Ok(p.to_path_buf());
        }
    }

    for name in [
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ] {
        if let Ok(path) = which::which(name) {
            info!("Found Chrome in PATH: {}", path.display());
            return Ok(path);
        }
    }

    Err(PortalError::session(
        "Chrome/Chromium not found. Install it or set remote_browser to a DevTools URL",
    ))
}

/// Drive the browser's CDP event loop until it ends.
#[cfg(feature = "browser")]
fn spawn_handler(mut handler: chromiumoxide::Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    })
}

/// Whether closing a session should also shut the browser down.
#[cfg(feature = "browser")]
fn owns_browser(config: &BrowserEngineConfig) -> bool {
    config.remote_url.is_none()
}

/// One browser tab bound to the portal.
#[cfg(feature = "browser")]
pub struct BrowserSession {
    config: BrowserEngineConfig,
    browser: Option<Browser>,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
    /// False when attached to a remote browser that other sessions share.
    launched: bool,
}

#[cfg(feature = "browser")]
impl BrowserSession {
    /// Start a browser (or attach to a remote one) and open a blank tab.
    pub async fn open(config: &BrowserEngineConfig) -> Result<Self> {
        let (browser, handler) = match config.remote_url {
            Some(ref url) => Self::connect_remote(url, config).await?,
            None => Self::launch(config).await?,
        };

        let mut session = Self {
            config: config.clone(),
            browser: Some(browser),
            page: None,
            handler: Some(handler),
            launched: owns_browser(config),
        };

        let page = match session.new_page().await {
            Ok(page) => page,
            Err(e) => {
                session.close().await;
                return Err(e);
            }
        };
        session.page = Some(page);
        Ok(session)
    }

    async fn launch(config: &BrowserEngineConfig) -> Result<(Browser, JoinHandle<()>)> {
        info!("Launching browser (headless={})", config.headless);

        let chrome_path = find_chrome()?;
        let mut builder = BrowserConfig::builder().chrome_executable(chrome_path);

        // Set headless mode (with_head means NOT headless)
        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={}", config.user_agent))
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--disable-gpu");

        for arg in &config.chrome_args {
            builder = builder.arg(arg);
        }

        let browser_config = builder
            .build()
            .map_err(|e| PortalError::session(format!("Failed to build browser config: {}", e)))?;

        let (browser, handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| PortalError::session(format!("Failed to launch browser: {}", e)))?;

        Ok((browser, spawn_handler(handler)))
    }

    async fn connect_remote(
        url: &str,
        config: &BrowserEngineConfig,
    ) -> Result<(Browser, JoinHandle<()>)> {
        info!("Connecting to remote browser at {}", url);

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .timeout(config.ready_timeout)
            .send()
            .await
            .map_err(|e| PortalError::session(format!("Failed to reach remote browser: {}", e)))?
            .json()
            .await
            .map_err(|e| {
                PortalError::session(format!("Failed to parse browser version info: {}", e))
            })?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PortalError::session("No webSocketDebuggerUrl in response"))?;

        debug!("Connecting to WebSocket: {}", ws_url);

        let handler_config = chromiumoxide::handler::HandlerConfig {
            request_timeout: config.ready_timeout,
            ..Default::default()
        };

        let (browser, handler) = Browser::connect_with_config(ws_url, handler_config)
            .await
            .map_err(|e| PortalError::session(format!("Failed to connect to remote browser: {}", e)))?;

        Ok((browser, spawn_handler(handler)))
    }

    async fn new_page(&self) -> Result<Page> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| PortalError::session("browser already closed"))?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| PortalError::session(format!("Failed to open tab: {}", e)))?;

        page.execute(SetUserAgentOverrideParams::new(self.config.user_agent.clone()))
            .await
            .map_err(|e| PortalError::session(format!("Failed to set user agent: {}", e)))?;

        Ok(page)
    }

    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| PortalError::session("session already closed"))
    }

    fn timeout_secs(&self) -> u64 {
        self.config.ready_timeout.as_secs()
    }

    /// Evaluate a script and decode its result, bounded by the ready timeout.
    async fn eval<T: DeserializeOwned>(&self, what: &str, script: String) -> Result<T> {
        let page = self.page()?;
        let result = tokio::time::timeout(self.config.ready_timeout, page.evaluate(script))
            .await
            .map_err(|_| PortalError::timeout(what, self.timeout_secs()))?
            .map_err(|e| PortalError::session(format!("Script failed for {}: {}", what, e)))?;

        result
            .into_value::<T>()
            .map_err(|e| PortalError::session(format!("Unexpected result for {}: {}", what, e)))
    }

    /// Apply stealth evasion scripts to the current page.
    async fn apply_stealth(&self) {
        let Ok(page) = self.page() else {
            return;
        };
        debug!("Applying stealth scripts");
        for script in STEALTH_SCRIPTS {
            if let Err(e) = page.evaluate(script.to_string()).await {
                debug!("Stealth script injection skipped: {}", e);
            }
        }
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl PortalSession for BrowserSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);
        let page = self.page()?;
        let nav_params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|e| PortalError::InvalidRequest(format!("Invalid URL {}: {}", url, e)))?;

        tokio::time::timeout(self.config.ready_timeout, page.execute(nav_params))
            .await
            .map_err(|_| PortalError::timeout(format!("navigation to {}", url), self.timeout_secs()))?
            .map_err(|e| PortalError::session(format!("Navigation failed for {}: {}", url, e)))?;

        let state: String = self
            .eval("document ready state", WAIT_FOR_READY_SCRIPT.to_string())
            .await?;
        debug!("Page ready state: {}", state);

        if self.config.stealth {
            self.apply_stealth().await;
        }
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str) -> Result<()> {
        debug!("Waiting for selector: {}", selector);
        let page = self.page()?;
        let deadline = Instant::now() + self.config.ready_timeout;

        loop {
            if page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(PortalError::timeout(selector, self.timeout_secs()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn options(&mut self, control_id: &str) -> Result<Vec<String>> {
        let script = format!(
            r#"(() => {{
                const el = document.getElementById({id});
                if (!el || !el.options) return null;
                return Array.from(el.options).map(o => (o.text || '').trim());
            }})()"#,
            id = js_string(control_id)
        );
        let labels: Option<Vec<String>> = self
            .eval(&format!("options of #{}", control_id), script)
            .await?;
        labels.ok_or_else(|| PortalError::ElementNotFound(control_id.to_string()))
    }

    async fn select_by_text(&mut self, control_id: &str, label: &str) -> Result<bool> {
        let script = format!(
            r#"(() => {{
                const el = document.getElementById({id});
                if (!el || !el.options) return null;
                const wanted = {label};
                const opt = Array.from(el.options).find(o => (o.text || '').trim() === wanted);
                if (!opt) return false;
                el.value = opt.value;
                opt.selected = true;
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            id = js_string(control_id),
            label = js_string(label)
        );
        let selected: Option<bool> = self
            .eval(&format!("selection in #{}", control_id), script)
            .await?;
        let selected =
            selected.ok_or_else(|| PortalError::ElementNotFound(control_id.to_string()))?;
        debug!("Selected '{}' in #{}: {}", label, control_id, selected);
        Ok(selected)
    }

    async fn fill(&mut self, input_id: &str, value: &str) -> Result<()> {
        let script = format!(
            r#"(() => {{
                const el = document.getElementById({id});
                if (!el) return false;
                el.focus();
                el.value = {value};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            id = js_string(input_id),
            value = js_string(value)
        );
        let found: bool = self.eval(&format!("input #{}", input_id), script).await?;
        if found {
            Ok(())
        } else {
            Err(PortalError::ElementNotFound(input_id.to_string()))
        }
    }

    async fn click(&mut self, element_id: &str) -> Result<()> {
        let script = format!(
            r#"(() => {{
                const el = document.getElementById({id});
                if (!el) return false;
                el.click();
                return true;
            }})()"#,
            id = js_string(element_id)
        );
        let found: bool = self.eval(&format!("click on #{}", element_id), script).await?;
        if found {
            Ok(())
        } else {
            Err(PortalError::ElementNotFound(element_id.to_string()))
        }
    }

    async fn content(&mut self) -> Result<String> {
        let page = self.page()?;
        tokio::time::timeout(self.config.ready_timeout, page.content())
            .await
            .map_err(|_| PortalError::timeout("page content", self.timeout_secs()))?
            .map_err(|e| PortalError::session(format!("Failed to read page content: {}", e)))
    }

    async fn current_url(&mut self) -> Result<Option<String>> {
        let page = self.page()?;
        page.url()
            .await
            .map_err(|e| PortalError::session(format!("Failed to read page URL: {}", e)))
    }

    async fn attribute(&mut self, element_id: &str, name: &str) -> Result<Option<String>> {
        let script = format!(
            r#"(() => {{
                const el = document.getElementById({id});
                if (!el) return {{ found: false, value: null }};
                return {{ found: true, value: el.getAttribute({name}) }};
            }})()"#,
            id = js_string(element_id),
            name = js_string(name)
        );
        let result: serde_json::Value = self
            .eval(&format!("attribute {} of #{}", name, element_id), script)
            .await?;

        if !result.get("found").and_then(|v| v.as_bool()).unwrap_or(false) {
            return Err(PortalError::ElementNotFound(element_id.to_string()));
        }
        Ok(result
            .get("value")
            .and_then(|v| v.as_str())
            .map(str::to_string))
    }

    async fn settle(&mut self, purpose: SettlePurpose) {
        let delay = self.config.settle.duration(purpose);
        debug!("Settling {:?} for {:?}", purpose, delay);
        tokio::time::sleep(delay).await;
    }

    async fn close(&mut self) {
        if let Some(page) = self.page.take() {
            let _ = page.close().await;
        }
        if let Some(mut browser) = self.browser.take() {
            if self.launched {
                if let Err(e) = browser.close().await {
                    warn!("Browser did not close cleanly: {}", e);
                }
                let _ = browser.wait().await;
                info!("Browser session closed");
            } else {
                // Remote browser stays up for the next session
                drop(browser);
                info!("Detached from remote browser");
            }
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}

#[cfg(feature = "browser")]
impl Drop for BrowserSession {
    fn drop(&mut self) {
        // Cancelled before close(): dropping the browser kills the child
        // process; the event loop has to be stopped by hand.
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}

/// Opens a new browser session per call.
#[derive(Debug, Clone)]
pub struct BrowserSessionFactory {
    config: BrowserEngineConfig,
}

impl BrowserSessionFactory {
    pub fn new(config: BrowserEngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BrowserEngineConfig {
        &self.config
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl SessionFactory for BrowserSessionFactory {
    async fn open(&self) -> Result<Box<dyn PortalSession>> {
        let session = BrowserSession::open(&self.config).await?;
        Ok(Box::new(session))
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
#[async_trait]
impl SessionFactory for BrowserSessionFactory {
    async fn open(&self) -> Result<Box<dyn PortalSession>> {
        Err(PortalError::session(
            "Browser support not compiled. Rebuild with: cargo build --features browser",
        ))
    }
}

#[cfg(all(test, feature = "browser"))]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_escapes_quotes() {
        assert_eq!(js_string("it's \"x\""), r#""it's \"x\"""#);
    }

    #[test]
    fn test_find_chrome_returns_existing_binary_or_session_error() {
        match find_chrome() {
            Ok(path) => assert!(path.exists()),
            Err(e) => assert!(matches!(e, PortalError::Session(_))),
        }
    }

    #[test]
    fn test_remote_browser_is_not_owned() {
        let local = BrowserEngineConfig::default();
        let remote = BrowserEngineConfig {
            remote_url: Some("ws://127.0.0.1:9222".into()),
            ..BrowserEngineConfig::default()
        };

        assert!(owns_browser(&local));
        assert!(!owns_browser(&remote));
    }

    #[test]
    fn test_js_string_keeps_unicode() {
        assert_eq!(js_string("दिल्ली"), "\"दिल्ली\"");
    }
}

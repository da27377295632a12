//! Browser engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::SettleTimings;

/// Realistic desktop client identity presented to the portal.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// How remote browser sessions are launched and paced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserEngineConfig {
    /// Run in headless mode (default: true).
    /// Set to false to watch the form being filled.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Apply automation-detection countermeasures after each page load.
    #[serde(default = "default_true")]
    pub stealth: bool,

    /// Proxy server URL (e.g., "socks5://127.0.0.1:1080").
    #[serde(default)]
    pub proxy: Option<String>,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to existing browser instead of launching one.
    #[serde(default)]
    pub remote_url: Option<String>,

    /// User agent override for every page.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Bound on navigation and element waits.
    #[serde(default = "default_ready_timeout")]
    pub ready_timeout: Duration,

    /// Fixed pauses for asynchronous form updates.
    #[serde(default)]
    pub settle: SettleTimings,
}

fn default_headless() -> bool {
    true
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_ready_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Default for BrowserEngineConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            stealth: true,
            proxy: None,
            chrome_args: Vec::new(),
            remote_url: None,
            user_agent: default_user_agent(),
            ready_timeout: default_ready_timeout(),
            settle: SettleTimings::default(),
        }
    }
}

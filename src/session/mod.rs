//! Remote session handles.
//!
//! A [`PortalSession`] owns one live page of the portal, the equivalent of
//! one browser tab. Everything the automation layer does to the remote form
//! goes through this trait, so the navigation state machines can be driven
//! by a real browser or by a scripted fake.
//!
//! Sessions are exclusive and short-lived: each operation opens one through
//! a [`SessionFactory`], uses it start to finish and closes it.

mod browser;
mod config;

#[cfg(feature = "browser")]
pub use browser::BrowserSession;
pub use browser::BrowserSessionFactory;
pub use config::{BrowserEngineConfig, DEFAULT_USER_AGENT};

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Why a session is pausing for the remote page to catch up.
///
/// The portal repopulates dependent controls asynchronously with no
/// completion event, so these are the only synchronisation points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlePurpose {
    /// After choosing an option in a parent selector.
    AfterSelect,
    /// Before reading the option list of the last control.
    BeforeOptionsRead,
    /// After submitting a form, before reading results.
    AfterSubmit,
}

/// Durations backing each [`SettlePurpose`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleTimings {
    pub after_select: Duration,
    pub before_options_read: Duration,
    pub after_submit: Duration,
}

impl Default for SettleTimings {
    fn default() -> Self {
        Self {
            after_select: Duration::from_secs(1),
            before_options_read: Duration::from_secs(2),
            after_submit: Duration::from_secs(3),
        }
    }
}

impl SettleTimings {
    pub fn duration(&self, purpose: SettlePurpose) -> Duration {
        match purpose {
            SettlePurpose::AfterSelect => self.after_select,
            SettlePurpose::BeforeOptionsRead => self.before_options_read,
            SettlePurpose::AfterSubmit => self.after_submit,
        }
    }

    /// All-zero timings.
    pub fn immediate() -> Self {
        Self {
            after_select: Duration::ZERO,
            before_options_read: Duration::ZERO,
            after_submit: Duration::ZERO,
        }
    }
}

/// One live view of a remote page.
///
/// Element arguments are DOM ids unless stated otherwise. Implementations
/// bound every wait by their configured readiness timeout and report expiry
/// as [`PortalError::Timeout`](crate::error::PortalError::Timeout).
#[async_trait]
pub trait PortalSession: Send {
    /// Load `url` and block until the document is ready.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Wait until an element matching the CSS selector is present.
    async fn wait_for(&mut self, selector: &str) -> Result<()>;

    /// Visible labels of a `<select>` control, in page order.
    async fn options(&mut self, control_id: &str) -> Result<Vec<String>>;

    /// Choose the option whose trimmed visible text equals `label` exactly.
    ///
    /// Returns `false` when no option matches; the caller decides how to
    /// report that.
    async fn select_by_text(&mut self, control_id: &str, label: &str) -> Result<bool>;

    /// Replace the value of a text input.
    async fn fill(&mut self, input_id: &str, value: &str) -> Result<()>;

    async fn click(&mut self, element_id: &str) -> Result<()>;

    /// Current serialized markup of the page.
    async fn content(&mut self) -> Result<String>;

    async fn current_url(&mut self) -> Result<Option<String>>;

    /// Attribute of an element, `None` if the attribute is absent.
    async fn attribute(&mut self, element_id: &str, name: &str) -> Result<Option<String>>;

    /// Pause for the remote page to apply an asynchronous update.
    async fn settle(&mut self, purpose: SettlePurpose);

    /// Release the remote session. Safe to call more than once.
    async fn close(&mut self);
}

/// Opens fresh, exclusive sessions.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PortalSession>>;
}

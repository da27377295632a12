//! Captcha image acquisition. Solving is left to the caller.

use base64::Engine;
use tracing::debug;
use url::Url;

use crate::config::PortalSettings;
use crate::error::{PortalError, Result};
use crate::fetch::DocumentFetcher;
use crate::session::PortalSession;

/// Reads the cause-list captcha as a `data:` URL.
pub struct CaptchaReader<'a> {
    portal: &'a PortalSettings,
    fetcher: &'a dyn DocumentFetcher,
}

impl<'a> CaptchaReader<'a> {
    pub fn new(portal: &'a PortalSettings, fetcher: &'a dyn DocumentFetcher) -> Self {
        Self { portal, fetcher }
    }

    pub async fn read(&self, session: &mut dyn PortalSession) -> Result<String> {
        let image_id = &self.portal.form.captcha_image;
        session.navigate(&self.portal.cause_list_url).await?;
        session.wait_for(&format!("#{}", image_id)).await?;

        let src = session
            .attribute(image_id, "src")
            .await?
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| PortalError::ElementNotFound(format!("{} src", image_id)))?;

        if src.starts_with("data:") {
            return Ok(src);
        }

        let url = match session.current_url().await? {
            Some(page) => Url::parse(&page)
                .and_then(|base| base.join(&src))
                .map(|u| u.to_string())
                .unwrap_or(src),
            None => src,
        };
        debug!("Fetching captcha image from {}", url);

        let bytes = self.fetcher.fetch(&url).await?;
        Ok(format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        ))
    }
}

//! REST surface over the portal.
//!
//! Exposes location lookups, captcha acquisition, case search, listing
//! checks, cause-list downloads and the stored files. Every request that
//! touches the portal opens and closes its own session.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;

use crate::config::Settings;
use crate::export::OutputManager;
use crate::portal::Portal;
use crate::services::{CaseService, ListingService};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub portal: Portal,
    pub cases: CaseService,
    pub listings: ListingService,
    pub output: OutputManager,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let portal = Portal::from_settings(settings)?;
        Ok(Self::from_parts(
            portal,
            OutputManager::new(&settings.results_dir),
        ))
    }

    pub fn from_parts(portal: Portal, output: OutputManager) -> Self {
        Self {
            cases: CaseService::new(portal.clone()),
            listings: ListingService::new(portal.clone()),
            portal,
            output,
        }
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let addr: SocketAddr = bind.parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

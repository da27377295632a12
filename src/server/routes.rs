//! Router configuration for the web server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        // Location selectors and captcha
        .route("/api/selectors", post(handlers::selectors))
        .route("/api/districts/:state", get(handlers::districts))
        .route(
            "/api/courts/:state/:district/:complex",
            get(handlers::courts),
        )
        .route("/api/captcha", post(handlers::captcha))
        // Case search and listing
        .route("/api/search/cnr", post(handlers::search_cnr))
        .route("/api/search/details", post(handlers::search_details))
        .route("/api/listing/today", get(handlers::listing_today))
        .route("/api/listing/tomorrow", get(handlers::listing_tomorrow))
        // Cause-list downloads
        .route("/api/download/pdf", post(handlers::download_pdf))
        .route("/api/download/causelist", post(handlers::download_causelist))
        // Results and stored files
        .route("/api/results/history", get(handlers::history))
        .route("/api/results/export", post(handlers::export))
        .route("/api/file/:filename", get(handlers::file))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

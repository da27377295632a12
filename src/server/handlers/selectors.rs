//! Location selector and captcha endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use super::response::{success, ApiResult};
use crate::models::LocationPath;
use crate::server::AppState;

/// Partial location; the next unset level is what gets listed.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SelectorParams {
    pub state: Option<String>,
    pub district: Option<String>,
    #[serde(alias = "complex_name")]
    pub complex: Option<String>,
}

/// Health check.
pub async fn health() -> ApiResult {
    Ok(success(json!({
        "status": "healthy",
        "timestamp": Local::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

/// Options of the level after the given partial path.
pub async fn selectors(
    State(state): State<AppState>,
    body: Result<Json<SelectorParams>, JsonRejection>,
) -> ApiResult {
    let Json(params) = body?;
    let path = LocationPath::from_optional(
        params.state.as_deref(),
        params.district.as_deref(),
        params.complex.as_deref(),
        None,
    )?;
    let level = path.next_level().map(|l| l.as_str());
    let options = state.portal.resolve_options(&path).await?;

    Ok(success(json!({ "level": level, "options": options })))
}

pub async fn districts(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult {
    let districts = state.listings.districts(&name).await?;
    Ok(success(json!({ "districts": districts })))
}

pub async fn courts(
    State(state): State<AppState>,
    Path((name, district, complex)): Path<(String, String, String)>,
) -> ApiResult {
    let courts = state.listings.courts(&name, &district, &complex).await?;
    Ok(success(json!({ "courts": courts })))
}

/// Captcha image as a `data:` URL for the caller to solve.
pub async fn captcha(State(state): State<AppState>) -> ApiResult {
    let captcha = state.portal.captcha().await?;
    Ok(success(json!({ "captcha": captcha })))
}

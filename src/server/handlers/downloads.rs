//! Cause-list download endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::json;

use super::response::{success, ApiResult};
use crate::models::{BatchRequest, CauseListRequest};
use crate::server::AppState;

/// One court's cause list.
pub async fn download_pdf(
    State(state): State<AppState>,
    body: Result<Json<CauseListRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = body?;
    request.validate()?;

    let stored = state.portal.retrieve(&request).await?;
    Ok(success(json!({
        "filepath": stored.path,
        "filename": stored.path.file_name().map(|n| n.to_string_lossy()),
        "size_bytes": stored.size_bytes,
    })))
}

/// Every court of a complex; per-court failures are in the report.
pub async fn download_causelist(
    State(state): State<AppState>,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = body?;
    request.validate()?;

    let report = state.portal.retrieve_batch(&request).await;
    Ok(success(json!({ "data": report })))
}

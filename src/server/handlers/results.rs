//! Download history, result export and file serving.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::{json, Value};

use super::response::{success, ApiError, ApiResult};
use crate::export::ResultFormat;
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExportParams {
    pub results: Vec<Value>,
    /// `json` (default) or `text`.
    pub format: Option<String>,
}

pub async fn history(State(state): State<AppState>) -> ApiResult {
    let files = state.portal.store().history().await?;
    Ok(success(json!({ "files": files })))
}

/// Write posted results to the results directory.
pub async fn export(
    State(state): State<AppState>,
    body: Result<Json<ExportParams>, JsonRejection>,
) -> ApiResult {
    let Json(params) = body?;
    let format = match params.format.as_deref() {
        None | Some("json") => ResultFormat::Json,
        Some("text") | Some("txt") => ResultFormat::Text,
        Some(other) => {
            return Err(ApiError::new(
                axum::http::StatusCode::BAD_REQUEST,
                format!("Unknown export format: {}", other),
            ))
        }
    };

    let name = format!("export_{}", Local::now().format("%Y%m%d_%H%M%S"));
    let path = state
        .output
        .save_result(&json!({ "results": params.results }), &name, format)
        .await?;
    Ok(success(json!({ "filepath": path })))
}

/// A stored document as an attachment.
pub async fn file(State(state): State<AppState>, Path(filename): Path<String>) -> ApiResult {
    let path = state
        .portal
        .store()
        .resolve(&filename)
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    let content = tokio::fs::read(&path).await.map_err(ApiError::internal)?;
    let mime = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .to_string();
    let disposition = format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(&filename)
    );

    Ok((
        [
            (header::CONTENT_TYPE, mime),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    )
        .into_response())
}

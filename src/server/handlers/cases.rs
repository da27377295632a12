//! Case search and listing endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::response::{success, ApiError, ApiResult};
use crate::models::CaseQuery;
use crate::server::AppState;
use crate::services::{ListingDay, CASE_NOT_FOUND};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CnrParams {
    pub cnr: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DetailsParams {
    pub case_type: String,
    pub case_number: String,
    pub year: String,
}

pub async fn search_cnr(
    State(state): State<AppState>,
    body: Result<Json<CnrParams>, JsonRejection>,
) -> ApiResult {
    let Json(params) = body?;
    search(&state, CaseQuery::cnr(params.cnr)).await
}

pub async fn search_details(
    State(state): State<AppState>,
    body: Result<Json<DetailsParams>, JsonRejection>,
) -> ApiResult {
    let Json(params) = body?;
    search(
        &state,
        CaseQuery::details(params.case_type, params.case_number, params.year),
    )
    .await
}

async fn search(state: &AppState, query: CaseQuery) -> ApiResult {
    match state.cases.search(&query).await? {
        Some(summary) => Ok(success(json!({ "data": summary }))),
        None => Err(ApiError::not_found(CASE_NOT_FOUND)),
    }
}

pub async fn listing_today(State(state): State<AppState>) -> ApiResult {
    listing(&state, ListingDay::Today).await
}

pub async fn listing_tomorrow(State(state): State<AppState>) -> ApiResult {
    listing(&state, ListingDay::Tomorrow).await
}

async fn listing(state: &AppState, day: ListingDay) -> ApiResult {
    let info = state.listings.listing(day).await?;
    Ok(success(json!({ "data": info })))
}

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use reliefmap_common::HelpOffer;

use super::{store_error, ApiError};
use crate::AppState;

#[derive(Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    query: String,
}

pub async fn api_list_offers(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let offers = state.offers.list_offers().await.map_err(store_error)?;
    Ok(Json(offers))
}

/// Store an arbitrary JSON object as a help offer. The id is assigned here.
pub async fn api_create_offer(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<serde_json::Map<String, serde_json::Value>>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(details) = payload?;
    let offer = HelpOffer::from_submission(details, Utc::now());
    let stored = state
        .offers
        .insert_offer(offer)
        .await
        .map_err(store_error)?;
    info!(offer_id = stored.id, "Help offer stored");
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn api_search_help(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let offers = state.offers.list_offers().await.map_err(store_error)?;
    let result = state.help.search(&request.query, &offers).await?;
    Ok(Json(result))
}

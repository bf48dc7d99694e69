use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::info;

use reliefmap_common::Report;
use reliefmap_core::IngestOutcome;

use super::{store_error, ApiError};
use crate::AppState;

pub async fn api_list_disasters(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let events = state.events.list_recent().await.map_err(store_error)?;
    Ok(Json(events))
}

/// Ingest a report: 201 with the new event, 200 with the merged one.
pub async fn api_report_disaster(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Report>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(report) = payload?;
    info!(
        disaster_type = %report.disaster_type,
        location = %report.location,
        has_image = report.image().is_some(),
        "Report received"
    );

    let outcome = state.engine.ingest(report).await?;
    let status = match outcome {
        IngestOutcome::Created(_) => StatusCode::CREATED,
        IngestOutcome::Merged(_) => StatusCode::OK,
    };
    Ok((status, Json(outcome.into_event())))
}

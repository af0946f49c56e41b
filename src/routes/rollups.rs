//! Rollup endpoints: hourly, daily and period summaries for one sensor.
//!
//! Each handler fetches the requested window from the store once and runs
//! the reducers over that snapshot.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, error, info};

use super::{failure, AppState};
use crate::models::{RainfallSource, RawSample, TimeWindow};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/sensors/{sensor_id}/hourly", get(hourly))
        .route("/sensors/{sensor_id}/daily", get(daily))
        .route("/sensors/{sensor_id}/period", get(period))
}

/// Query parameters shared by the rollup endpoints.
#[derive(Debug, Deserialize)]
pub struct RollupQuery {
    // ---
    /// Inclusive window start (RFC 3339).
    start: DateTime<Utc>,
    /// Exclusive window end (RFC 3339).
    end: DateTime<Utc>,
    /// `rate` (default) or `counter`; ignored by `/hourly`.
    #[serde(default)]
    source: RainfallSource,
}

async fn hourly(
    Path(sensor_id): Path<String>,
    Query(params): Query<RollupQuery>,
    State(state): State<AppState>,
) -> Response {
    // ---
    info!("GET /sensors/{}/hourly", sensor_id);
    let samples = match load_window(&state, &sensor_id, &params).await {
        Ok(samples) => samples,
        Err(response) => return response,
    };

    let records = state.aggregator.hourly(&samples);
    debug!("Returning {} hourly records for {}", records.len(), sensor_id);
    (StatusCode::OK, Json(records)).into_response()
}

async fn daily(
    Path(sensor_id): Path<String>,
    Query(params): Query<RollupQuery>,
    State(state): State<AppState>,
) -> Response {
    // ---
    info!("GET /sensors/{}/daily source={:?}", sensor_id, params.source);
    let samples = match load_window(&state, &sensor_id, &params).await {
        Ok(samples) => samples,
        Err(response) => return response,
    };

    let records = state.aggregator.daily(&samples, params.source);
    debug!("Returning {} daily records for {}", records.len(), sensor_id);
    (StatusCode::OK, Json(records)).into_response()
}

async fn period(
    Path(sensor_id): Path<String>,
    Query(params): Query<RollupQuery>,
    State(state): State<AppState>,
) -> Response {
    // ---
    info!("GET /sensors/{}/period source={:?}", sensor_id, params.source);
    let samples = match load_window(&state, &sensor_id, &params).await {
        Ok(samples) => samples,
        Err(response) => return response,
    };

    let days = state.aggregator.daily(&samples, params.source);
    let stats = state.aggregator.period(&days, &samples);
    debug!("Period over {} days for {}", stats.day_count, sensor_id);
    (StatusCode::OK, Json(stats)).into_response()
}

// ---

/// Validate the window and fetch its samples, or build the error response.
async fn load_window(
    state: &AppState,
    sensor_id: &str,
    params: &RollupQuery,
) -> Result<Vec<RawSample>, Response> {
    // ---
    let window = TimeWindow::new(params.start, params.end)
        .map_err(|e| failure(StatusCode::BAD_REQUEST, e.to_string()))?;

    state
        .store
        .fetch_samples(sensor_id, &window)
        .await
        .map_err(|e| {
            error!("Failed to load samples for {}: {}", sensor_id, e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load samples")
        })
}

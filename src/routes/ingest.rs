//! `POST /ingest`: pull the upstream station feed into the sample store.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tracing::{error, info};

use super::{failure, AppState};
use crate::ingest::{fetch_station_samples, store_readings};

// ---

pub fn router() -> Router<AppState> {
    Router::new().route("/ingest", post(handler))
}

async fn handler(State(state): State<AppState>) -> Response {
    // ---
    let Some(api_url) = state.config.station_api_url.as_deref() else {
        return failure(
            StatusCode::SERVICE_UNAVAILABLE,
            "No STATION_API_URL configured, ingest disabled",
        );
    };

    info!("POST /ingest - fetching station feed");
    let readings = match fetch_station_samples(api_url, state.config.api_max_pages).await {
        Ok(readings) => readings,
        Err(e) => {
            error!("Failed to fetch station feed: {}", e);
            return failure(StatusCode::BAD_GATEWAY, "Failed to fetch station feed");
        }
    };

    match store_readings(state.store.as_ref(), &readings).await {
        Ok(report) => {
            info!(
                "Ingest complete: {} fetched, {} stored",
                report.fetched, report.stored
            );
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(e) => {
            error!("Failed to store readings: {}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store readings")
        }
    }
}

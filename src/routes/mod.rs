//! HTTP gateway (EMBP): each sibling module exports one sub-router and
//! this file merges them over the shared [`AppState`].

use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json, Router};

use crate::aggregate::Aggregator;
use crate::store::SampleStore;
use crate::Config;

mod health;
mod ingest;
mod rollups;

// ---

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    // ---
    pub store: Arc<dyn SampleStore>,
    pub aggregator: Aggregator,
    pub config: Config,
}

impl AppState {
    // ---
    pub fn new(store: Arc<dyn SampleStore>, config: Config) -> Self {
        Self {
            store,
            aggregator: Aggregator::from_config(&config),
            config,
        }
    }
}

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(rollups::router())
        .merge(ingest::router())
        .merge(health::router())
        .with_state(state)
}

/// JSON string error body with the given status.
fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(message.into())).into_response()
}

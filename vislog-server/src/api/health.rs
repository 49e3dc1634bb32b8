//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::{AppState, ApiResult};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    /// Connected SSE viewers
    pub viewers: usize,
    /// Stored records (not capped)
    pub records: i64,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        module: "vislog-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        viewers: state.event_bus.subscriber_count(),
        records: state.store.count().await?,
    }))
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

//! Visitor log management endpoints
//!
//! Each mutation is stored first and broadcast second.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    routing::{delete, get},
    Json, Router,
};
use serde::Serialize;
use tracing::info;
use vislog_common::events::VisitorEvent;
use vislog_common::models::VisitorRecord;

use crate::db::RECENT_LIMIT;
use crate::{ApiError, AppState, ApiResult};

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// GET /api/logs
///
/// Up to 100 most recent records, newest first.
pub async fn list_logs(State(state): State<AppState>) -> ApiResult<Json<Vec<VisitorRecord>>> {
    let records = state.store.list_recent(RECENT_LIMIT).await?;
    Ok(Json(records))
}

/// DELETE /api/logs/:id
///
/// Succeeds whether or not the record existed; only an actual removal is
/// broadcast. A non-integer id is a 400.
pub async fn delete_log(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<SuccessResponse>> {
    let Path(id) = id.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if state.store.delete_by_id(id).await? {
        info!(id, "Visit deleted");
        state.event_bus.emit_lossy(VisitorEvent::RecordDeleted { id });
    }
    Ok(SuccessResponse::ok())
}

/// DELETE /api/logs/all
pub async fn clear_logs(State(state): State<AppState>) -> ApiResult<Json<SuccessResponse>> {
    let removed = state.store.delete_all().await?;
    info!(removed, "Visit log cleared");
    state.event_bus.emit_lossy(VisitorEvent::AllCleared);
    Ok(SuccessResponse::ok())
}

/// Build management routes
///
/// `/api/logs/all` is a static segment and takes priority over `:id`.
pub fn log_routes() -> Router<AppState> {
    Router::new()
        .route("/api/logs", get(list_logs))
        .route("/api/logs/all", delete(clear_logs))
        .route("/api/logs/:id", delete(delete_log))
}

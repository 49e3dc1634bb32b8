//! vislog-server library
//!
//! Records visitor metadata on every hit to `/log` and pushes each change
//! of the visitor log to connected dashboards over SSE.

pub mod api;
pub mod db;
pub mod enrich;
pub mod error;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use vislog_common::events::EventBus;

use crate::db::VisitStore;
use crate::enrich::Enricher;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Visitor record store
    pub store: VisitStore,
    /// Broadcast bus feeding every connected viewer
    pub event_bus: EventBus,
    /// User-agent + geolocation enrichment
    pub enricher: Enricher,
    /// Built dashboard to serve instead of the embedded page
    pub static_dir: Option<PathBuf>,
    /// Cancelled on shutdown so open viewer streams end
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(store: VisitStore, event_bus: EventBus, enricher: Enricher) -> Self {
        Self {
            store,
            event_bus,
            enricher,
            static_dir: None,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_static_dir(mut self, static_dir: Option<PathBuf>) -> Self {
        self.static_dir = static_dir;
        self
    }
}

/// Build application router
///
/// Any path without an explicit route gets the dashboard shell.
pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .merge(api::ingest_routes())
        .merge(api::log_routes())
        .merge(api::health_routes())
        .merge(api::ui_routes())
        .route("/events", axum::routing::get(api::event_stream));

    let router = match &state.static_dir {
        Some(dir) => {
            tracing::info!("Serving dashboard from {}", dir.display());
            router.fallback_service(
                ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))),
            )
        }
        None => router.fallback(api::serve_index),
    };

    router
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

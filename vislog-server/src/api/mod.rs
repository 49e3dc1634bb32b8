//! HTTP API handlers for vislog-server
//!
//! REST endpoints for ingestion and management, SSE for live updates.

pub mod health;
pub mod ingest;
pub mod logs;
pub mod sse;
pub mod ui;

pub use health::health_routes;
pub use ingest::ingest_routes;
pub use logs::log_routes;
pub use sse::event_stream;
pub use ui::{serve_index, ui_routes};

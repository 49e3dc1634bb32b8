//! Hit ingestion
//!
//! `GET /log`: enrich the caller, store the record, broadcast it, acknowledge.

use axum::{
    extract::{ConnectInfo, State},
    http::{header::USER_AGENT, HeaderMap},
    response::Html,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use tracing::info;
use vislog_common::events::VisitorEvent;

use crate::{AppState, ApiResult};

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Address reported when neither a proxy header nor a peer address exists
pub const UNKNOWN_ADDRESS: &str = "unknown";

const ACK_HTML: &str = r#"<!DOCTYPE html>
<html>
  <body style="background: #0f172a; color: #f8fafc; font-family: sans-serif; display: flex; align-items: center; justify-content: center; height: 100vh;">
    <div style="text-align: center; border: 1px solid rgba(255,255,255,0.1); padding: 2rem; border-radius: 1rem; background: rgba(30,41,59,0.7);">
      <h1>Logged Successfully</h1>
      <p>Your visit has been recorded.</p>
    </div>
  </body>
</html>
"#;

/// Caller address: first `X-Forwarded-For` hop, else the socket peer
pub fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match (forwarded, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => UNKNOWN_ADDRESS.to_string(),
    }
}

/// GET /log
///
/// Every call creates one record; repeated hits are distinct events.
pub async fn log_hit(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> ApiResult<Html<&'static str>> {
    let ip = client_address(&headers, peer.map(|ConnectInfo(addr)| addr));
    let user_agent = headers.get(USER_AGENT).and_then(|v| v.to_str().ok());

    let record = state.enricher.enrich(&ip, user_agent).await;
    let stored = state.store.insert(record).await?;

    info!(
        id = stored.id,
        ip = %stored.ip,
        device = %stored.device,
        city = %stored.city,
        country = %stored.country,
        "Visit logged"
    );

    state
        .event_bus
        .emit_lossy(VisitorEvent::NewRecord { record: stored });

    Ok(Html(ACK_HTML))
}

/// Build ingestion routes
pub fn ingest_routes() -> Router<AppState> {
    Router::new().route("/log", get(log_hit))
}

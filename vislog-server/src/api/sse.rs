//! Server-Sent Events push channel
//!
//! One stream per viewer. Events arrive in publish order; a viewer that
//! falls behind the bus capacity skips the overflow and carries on.

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// GET /events
///
/// Streams:
/// - `connected` once, on subscribe
/// - `new-log` with the stored record
/// - `log-deleted` with the record id
/// - `logs-cleared`
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Subscribe before the response is returned so nothing published after
    // this point is missed
    let mut rx = state.event_bus.subscribe();
    info!(
        "Viewer connected ({} active)",
        state.event_bus.subscriber_count()
    );

    let shutdown = state.shutdown.clone();

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("connected").data("connected"));

        loop {
            let received = tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("SSE: Server shutting down, closing stream");
                    break;
                }
                received = rx.recv() => received,
            };

            match received {
                Ok(event) => {
                    let event_type = event.event_type();
                    match event.payload_json() {
                        Ok(data) => {
                            debug!("SSE: Broadcasting {}", event_type);
                            yield Ok(Event::default().event(event_type).data(data));
                        }
                        Err(e) => warn!("SSE: Failed to serialize {}: {}", event_type, e),
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("SSE: Viewer lagged, {} event(s) dropped", skipped);
                }
                Err(RecvError::Closed) => {
                    debug!("SSE: Event bus closed");
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}

//! Broadcast events and the EventBus
//!
//! Every mutation of the visitor log is announced to connected viewers
//! through a single in-process [`EventBus`].

use tokio::sync::broadcast;

use crate::models::VisitorRecord;

/// Default channel capacity for the server's bus
pub const DEFAULT_EVENT_CAPACITY: usize = 1000;

/// Visitor log events pushed to viewers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitorEvent {
    /// A hit was enriched and stored
    NewRecord {
        /// The full stored record, including id and timestamp
        record: VisitorRecord,
    },

    /// One record was deleted
    RecordDeleted {
        /// Identifier of the removed record
        id: i64,
    },

    /// Every record was deleted
    AllCleared,
}

impl VisitorEvent {
    /// Wire name of the event on the push channel
    pub fn event_type(&self) -> &'static str {
        match self {
            VisitorEvent::NewRecord { .. } => "new-log",
            VisitorEvent::RecordDeleted { .. } => "log-deleted",
            VisitorEvent::AllCleared => "logs-cleared",
        }
    }

    /// JSON payload carried by the push channel
    ///
    /// The record for `new-log`, the bare id for `log-deleted`, `null` for
    /// `logs-cleared`.
    pub fn payload_json(&self) -> serde_json::Result<String> {
        match self {
            VisitorEvent::NewRecord { record } => serde_json::to_string(record),
            VisitorEvent::RecordDeleted { id } => serde_json::to_string(id),
            VisitorEvent::AllCleared => Ok("null".to_string()),
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central distribution bus for visitor log events
///
/// Wraps `tokio::broadcast`:
/// - Non-blocking publish (slow viewers don't block the request path)
/// - Each subscriber sees events in publish order
/// - No replay: a subscriber only sees events emitted after it subscribed
/// - Subscribers that fall more than `capacity` events behind lose the overflow
///
/// # Examples
///
/// ```
/// use vislog_common::events::{EventBus, VisitorEvent};
///
/// let bus = EventBus::new(16);
/// let mut rx = bus.subscribe();
///
/// bus.emit_lossy(VisitorEvent::AllCleared);
/// assert_eq!(rx.try_recv().unwrap(), VisitorEvent::AllCleared);
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<VisitorEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events buffered per lagging subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<VisitorEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: VisitorEvent,
    ) -> Result<usize, broadcast::error::SendError<VisitorEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Broadcasts are fire-and-forget: no viewer connected is not an error.
    pub fn emit_lossy(&self, event: VisitorEvent) {
        match self.emit(event) {
            Ok(n) => tracing::debug!("Event delivered to {} viewer(s)", n),
            Err(broadcast::error::SendError(event)) => {
                tracing::debug!("No viewers connected for {}", event.event_type())
            }
        }
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

//! Event types for the fpcompare event system
//!
//! Provides the shared event definitions and the EventBus that window
//! controllers use to notify a valve owner about new responses and user
//! actions (toggle compare, swap inputs, promote secondary).

mod valve_types;

pub use valve_types::{InputSide, ValveMode};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::api::{CompareResponse, Payload};

/// Application-wide events
///
/// Events are broadcast via EventBus and serialize with a `type` tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CompareEvent {
    /// A primary input window received a response
    ///
    /// Triggers:
    /// - Valve: push onto the primary input
    PrimaryResponse {
        /// Window that issued the query
        window_id: Uuid,
        /// Response (or failure) payload
        payload: Payload,
        /// When the response arrived
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A secondary input window received a response
    ///
    /// Triggers:
    /// - Valve: push onto the secondary input
    SecondaryResponse {
        /// Window that issued the query
        window_id: Uuid,
        /// Response (or failure) payload
        payload: Payload,
        /// When the response arrived
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Comparison was switched on or off (a secondary window joined or left)
    ///
    /// Triggers:
    /// - Valve: enable or disable merging
    MergeToggled {
        /// Whether merging is now enabled
        enabled: bool,
        /// When the toggle happened
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// User swapped the primary and secondary windows of a group
    ///
    /// Triggers:
    /// - Valve: swap inputs (merged mode only)
    InputsSwapped {
        /// When the swap was requested
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The primary window left its group and the secondary was promoted
    ///
    /// Triggers:
    /// - Valve: shift primary (passthrough mode only)
    PrimaryAdopted {
        /// When the promotion happened
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A valve produced a combined result
    ///
    /// Triggers:
    /// - Compare display: add a comparison
    ComparisonReady {
        /// Combined primary/secondary pairing
        comparison: CompareResponse,
        /// When the comparison was emitted
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl CompareEvent {
    /// Variant name, matching the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            CompareEvent::PrimaryResponse { .. } => "PrimaryResponse",
            CompareEvent::SecondaryResponse { .. } => "SecondaryResponse",
            CompareEvent::MergeToggled { .. } => "MergeToggled",
            CompareEvent::InputsSwapped { .. } => "InputsSwapped",
            CompareEvent::PrimaryAdopted { .. } => "PrimaryAdopted",
            CompareEvent::ComparisonReady { .. } => "ComparisonReady",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for application-wide events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use fpc_common::events::{CompareEvent, EventBus};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit(CompareEvent::InputsSwapped {
///     timestamp: chrono::Utc::now(),
/// }).ok();
///
/// assert_eq!(rx.try_recv().unwrap().event_type(), "InputsSwapped");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CompareEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered per subscriber before the
    /// oldest are dropped (the subscriber then observes a lag).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<CompareEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: CompareEvent,
    ) -> Result<usize, broadcast::error::SendError<CompareEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: CompareEvent) {
        let _ = self.tx.send(event);
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

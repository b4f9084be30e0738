//! EventBus integration
//!
//! The valve is single-threaded, so it never subscribes to the bus directly.
//! Instead its owner holds a [`BusBridge`] and pumps events into the valve on
//! its own thread, either by draining without blocking or by awaiting the next
//! command on a current-thread runtime. Merged results go back onto the bus
//! through a [`BusPublisher`].

use crate::compare::CompareValve;
use crate::control::ValveCommand;
use crate::error::ValveError;
use crate::valve::Observer;
use fpc_common::api::{CompareResponse, Payload};
use fpc_common::events::{CompareEvent, EventBus};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::broadcast::Receiver;
use tracing::{debug, warn};

/// Receives bus events and turns them into valve commands
pub struct BusBridge {
    rx: Receiver<CompareEvent>,
    lagged: u64,
    closed: bool,
}

impl BusBridge {
    /// Subscribe to `bus`; only events emitted from now on are seen
    pub fn new(bus: &EventBus) -> Self {
        Self::from_receiver(bus.subscribe())
    }

    pub fn from_receiver(rx: Receiver<CompareEvent>) -> Self {
        Self {
            rx,
            lagged: 0,
            closed: false,
        }
    }

    /// Map an event to the command it triggers, if any
    pub fn command_for(event: CompareEvent) -> Option<ValveCommand<Payload>> {
        match event {
            CompareEvent::PrimaryResponse { payload, .. } => Some(ValveCommand::PushPrimary(payload)),
            CompareEvent::SecondaryResponse { payload, .. } => Some(ValveCommand::PushSecondary(payload)),
            CompareEvent::MergeToggled { enabled, .. } => Some(ValveCommand::SetMergeEnabled(enabled)),
            CompareEvent::InputsSwapped { .. } => Some(ValveCommand::Swap),
            CompareEvent::PrimaryAdopted { .. } => Some(ValveCommand::ShiftPrimary),
            CompareEvent::ComparisonReady { .. } => None,
        }
    }

    /// Apply every queued event to `valve` without blocking
    ///
    /// Returns the number of commands applied.
    pub fn drain(&mut self, valve: &mut CompareValve) -> usize {
        let mut applied = 0;
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    if let Some(command) = Self::command_for(event) {
                        valve.apply(command);
                        applied += 1;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Valve bridge lagged, {} events dropped", skipped);
                    self.lagged += skipped;
                }
                Err(TryRecvError::Closed) => {
                    debug!("Event bus closed");
                    self.closed = true;
                    break;
                }
            }
        }
        applied
    }

    /// Wait for the next event that maps to a command
    ///
    /// Returns `None` once the bus is closed.
    pub async fn next_command(&mut self) -> Option<ValveCommand<Payload>> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if let Some(command) = Self::command_for(event) {
                        return Some(command);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Valve bridge lagged, {} events dropped", skipped);
                    self.lagged += skipped;
                }
                Err(RecvError::Closed) => {
                    debug!("Event bus closed");
                    self.closed = true;
                    return None;
                }
            }
        }
    }

    /// Total events dropped because this bridge fell behind
    pub fn lagged(&self) -> u64 {
        self.lagged
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Event announcing `command`, the inverse of [`BusBridge::command_for`]
pub fn event_for(command: ValveCommand<Payload>) -> CompareEvent {
    let timestamp = chrono::Utc::now();
    match command {
        ValveCommand::PushPrimary(payload) => CompareEvent::PrimaryResponse {
            window_id: payload.request().window_id,
            payload,
            timestamp,
        },
        ValveCommand::PushSecondary(payload) => CompareEvent::SecondaryResponse {
            window_id: payload.request().window_id,
            payload,
            timestamp,
        },
        ValveCommand::SetMergeEnabled(enabled) => CompareEvent::MergeToggled { enabled, timestamp },
        ValveCommand::Swap => CompareEvent::InputsSwapped { timestamp },
        ValveCommand::ShiftPrimary => CompareEvent::PrimaryAdopted { timestamp },
    }
}

/// Merge observer that republishes results as `ComparisonReady`
pub struct BusPublisher {
    bus: EventBus,
    published: usize,
}

impl BusPublisher {
    pub fn new(bus: EventBus) -> Self {
        Self { bus, published: 0 }
    }

    pub fn published(&self) -> usize {
        self.published
    }
}

impl Observer<CompareResponse> for BusPublisher {
    fn on_next(&mut self, comparison: CompareResponse) {
        self.bus.emit_lossy(CompareEvent::ComparisonReady {
            comparison,
            timestamp: chrono::Utc::now(),
        });
        self.published += 1;
    }

    fn on_error(&mut self, error: ValveError) {
        warn!("Comparison stream terminated: {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_ready_is_not_a_command() {
        let event = CompareEvent::ComparisonReady {
            comparison: CompareResponse::pair(
                &fpc_common::api::QueryResponse::new(fpc_common::api::QueryRequest::new(uuid::Uuid::new_v4(), "a")),
                &fpc_common::api::QueryResponse::new(fpc_common::api::QueryRequest::new(uuid::Uuid::new_v4(), "b")),
            ),
            timestamp: chrono::Utc::now(),
        };
        assert!(BusBridge::command_for(event).is_none());
    }

    #[test]
    fn test_event_for_inverts_command_for() {
        let commands = vec![
            ValveCommand::SetMergeEnabled(true),
            ValveCommand::Swap,
            ValveCommand::ShiftPrimary,
        ];
        for command in commands {
            let expected = command.clone();
            assert_eq!(BusBridge::command_for(event_for(command)), Some(expected));
        }
    }

    #[test]
    fn test_control_events_map_to_commands() {
        let now = chrono::Utc::now();
        assert_eq!(
            BusBridge::command_for(CompareEvent::MergeToggled {
                enabled: false,
                timestamp: now
            }),
            Some(ValveCommand::SetMergeEnabled(false))
        );
        assert_eq!(
            BusBridge::command_for(CompareEvent::InputsSwapped { timestamp: now }),
            Some(ValveCommand::Swap)
        );
        assert_eq!(
            BusBridge::command_for(CompareEvent::PrimaryAdopted { timestamp: now }),
            Some(ValveCommand::ShiftPrimary)
        );
    }
}

//! Script replay
//!
//! Drives a [`CompareValve`] from a plain-text script and writes everything
//! the valve emits as JSON lines. Script syntax, one command per line:
//!
//! ```text
//! # comment
//! primary car              push a response for "car" onto the primary input
//! secondary truck          push onto the secondary input
//! fail primary car timeout push a failed request (message optional)
//! swap | shift | enable | disable
//! ```

use crate::bridge::{event_for, BusBridge};
use crate::compare::{compare_config, CompareValve};
use crate::control::ValveCommand;
use crate::error::{Error, Result, ValveError};
use crate::valve::{MergeValve, Observer};
use fpc_common::api::{CompareResponse, Payload, QueryRequest, QueryResponse, RequestFailure};
use fpc_common::events::EventBus;
use fpc_common::{InputSide, ValveMode};
use serde::Serialize;
use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::rc::Rc;
use tracing::{debug, info};
use uuid::Uuid;

const DEFAULT_FAILURE_MESSAGE: &str = "request failed";

/// One line of replay output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum OutputRecord {
    Merge { primary: String, secondary: String },
    Primary { model: String, cached: bool },
    Secondary { model: String, cached: bool },
    Error { source: String, message: String },
}

type RecordBuffer = Rc<RefCell<Vec<OutputRecord>>>;

#[derive(Debug, Clone, Copy)]
enum Route {
    Merge,
    Primary,
    Secondary,
}

impl Route {
    fn name(self) -> &'static str {
        match self {
            Route::Merge => "merge",
            Route::Primary => "primary",
            Route::Secondary => "secondary",
        }
    }
}

struct RecordingObserver {
    route: Route,
    buffer: RecordBuffer,
}

impl RecordingObserver {
    fn shared(route: Route, buffer: &RecordBuffer) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            route,
            buffer: Rc::clone(buffer),
        }))
    }

    fn push_error(&mut self, error: ValveError) {
        self.buffer.borrow_mut().push(OutputRecord::Error {
            source: self.route.name().to_string(),
            message: error.to_string(),
        });
    }
}

impl Observer<CompareResponse> for RecordingObserver {
    fn on_next(&mut self, comparison: CompareResponse) {
        let (primary, secondary) = comparison.models();
        self.buffer.borrow_mut().push(OutputRecord::Merge {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
        });
    }

    fn on_error(&mut self, error: ValveError) {
        self.push_error(error);
    }
}

impl Observer<Payload> for RecordingObserver {
    fn on_next(&mut self, payload: Payload) {
        let model = payload.request().model.clone();
        let cached = payload.as_response().map(|r| r.cached).unwrap_or(false);
        let record = match self.route {
            Route::Secondary => OutputRecord::Secondary { model, cached },
            _ => OutputRecord::Primary { model, cached },
        };
        self.buffer.borrow_mut().push(record);
    }

    fn on_error(&mut self, error: ValveError) {
        self.push_error(error);
    }
}

/// Counts reported after a replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Commands applied to the valve
    pub commands: usize,
    /// Output lines written
    pub records: usize,
}

/// Script-driven valve with JSON-lines output
pub struct Replay {
    valve: CompareValve,
    buffer: RecordBuffer,
    bus: Option<(EventBus, BusBridge)>,
    primary_window: Uuid,
    secondary_window: Uuid,
}

impl Replay {
    pub fn new(mode: ValveMode) -> Self {
        let buffer: RecordBuffer = Rc::new(RefCell::new(Vec::new()));
        let mut valve = MergeValve::with_mode(compare_config(), mode);
        valve.set_merge_observer(RecordingObserver::shared(Route::Merge, &buffer));
        valve.set_primary_observer(RecordingObserver::shared(Route::Primary, &buffer));
        valve.set_secondary_observer(RecordingObserver::shared(Route::Secondary, &buffer));

        Self {
            valve,
            buffer,
            bus: None,
            primary_window: Uuid::new_v4(),
            secondary_window: Uuid::new_v4(),
        }
    }

    /// Route every command through an EventBus of `capacity` and a
    /// [`BusBridge`] instead of applying it directly
    ///
    /// Returns an error if `capacity` is zero.
    pub fn with_bus(mode: ValveMode, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(fpc_common::Error::InvalidInput("event bus capacity must be at least 1".to_string()).into());
        }
        let bus = EventBus::new(capacity);
        let bridge = BusBridge::new(&bus);
        let mut replay = Self::new(mode);
        replay.bus = Some((bus, bridge));
        Ok(replay)
    }

    pub fn valve(&self) -> &CompareValve {
        &self.valve
    }

    /// Parse one script line; blank lines and comments yield `None`
    pub fn parse_line(&self, line_no: usize, line: &str) -> Result<Option<ValveCommand<Payload>>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let script_error = |message: String| Error::Script {
            line: line_no,
            message,
        };
        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (line, ""),
        };

        let command = match keyword {
            "primary" | "secondary" => {
                let side: InputSide = keyword.parse()?;
                if rest.is_empty() {
                    return Err(script_error(format!("'{}' needs a term", keyword)));
                }
                let request = QueryRequest::new(self.window_for(side), rest);
                ValveCommand::push(side, Payload::from(QueryResponse::new(request)))
            }
            "fail" => {
                let mut parts = rest.splitn(3, char::is_whitespace);
                let side: InputSide = parts
                    .next()
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| script_error("'fail' needs a side".to_string()))?
                    .parse()
                    .map_err(|e: fpc_common::Error| script_error(e.to_string()))?;
                let term = parts
                    .next()
                    .ok_or_else(|| script_error("'fail' needs a term".to_string()))?;
                let message = parts
                    .next()
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .unwrap_or(DEFAULT_FAILURE_MESSAGE);
                let failure = RequestFailure {
                    request: QueryRequest::new(self.window_for(side), term),
                    message: message.to_string(),
                };
                ValveCommand::push(side, Payload::from(failure))
            }
            "swap" | "shift" | "enable" | "disable" if !rest.is_empty() => {
                return Err(script_error(format!("'{}' takes no arguments", keyword)));
            }
            "swap" => ValveCommand::Swap,
            "shift" => ValveCommand::ShiftPrimary,
            "enable" => ValveCommand::SetMergeEnabled(true),
            "disable" => ValveCommand::SetMergeEnabled(false),
            other => return Err(script_error(format!("unknown command '{}'", other))),
        };
        Ok(Some(command))
    }

    /// Apply one command and return what the valve emitted
    pub fn step(&mut self, command: ValveCommand<Payload>) -> Vec<OutputRecord> {
        debug!(command = command.name(), "Replaying");
        match self.bus.as_mut() {
            Some((bus, bridge)) => {
                bus.emit_lossy(event_for(command));
                bridge.drain(&mut self.valve);
            }
            None => self.valve.apply(command),
        }
        std::mem::take(&mut *self.buffer.borrow_mut())
    }

    /// Run a whole script, writing one JSON line per emitted value
    ///
    /// Stops at the first malformed line.
    pub fn run<B: BufRead, W: Write>(&mut self, input: B, out: &mut W) -> Result<ReplaySummary> {
        let mut summary = ReplaySummary::default();
        for (index, line) in input.lines().enumerate() {
            let line = line?;
            let Some(command) = self.parse_line(index + 1, &line)? else {
                continue;
            };
            summary.commands += 1;
            for record in self.step(command) {
                let json = serde_json::to_string(&record).map_err(|e| Error::Output(e.to_string()))?;
                writeln!(out, "{}", json)?;
                summary.records += 1;
            }
        }
        out.flush()?;
        info!(
            commands = summary.commands,
            records = summary.records,
            mode = %self.valve.mode(),
            "Replay finished"
        );
        Ok(summary)
    }

    fn window_for(&self, side: InputSide) -> Uuid {
        match side {
            InputSide::Primary => self.primary_window,
            InputSide::Secondary => self.secondary_window,
        }
    }
}

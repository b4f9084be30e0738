//! # fpcompare Valve Library (fpc-valve)
//!
//! Dual-mode valve joining two input streams.
//!
//! **Merged mode:** combine-latest over primary and secondary inputs; every
//! push after both sides have produced a value emits one combined value.
//!
//! **Passthrough mode:** each side is routed to its own observer through a
//! type filter and an optional transform.
//!
//! Around the valve:
//! - `control`: command-style driving of a valve
//! - `compare`: standard configuration for query payloads
//! - `bridge`: EventBus integration
//! - `replay`: script replay with JSON-lines output (used by `fpc-replay`)

pub mod bridge;
pub mod compare;
pub mod control;
pub mod error;
pub mod replay;
pub mod valve;

pub use control::ValveCommand;
pub use error::{BoxError, Error, Result, ValveError};
pub use valve::{DeclaredType, MergeValve, Observer, Recorder, SharedObserver, ValveConfig};

//! Merge-or-passthrough valve
//!
//! Module layout:
//! - `channel`: the two physical input channels and role assignment
//! - `config`: combine function, passthrough transform, declared input type
//! - `observer`: observer trait and shared handles
//! - `pipeline`: combine-latest subscription
//! - `router`: per-side passthrough routes
//! - `merge_valve`: the valve state machine tying them together

pub mod channel;
pub mod config;
pub mod observer;
pub mod pipeline;
pub mod router;

mod merge_valve;

pub use merge_valve::MergeValve;
pub use channel::{ChannelId, ChannelPair};
pub use config::{CombineFn, DeclaredType, Kinded, TransformFn, ValveConfig, ARITY};
pub use observer::{from_fn, FnObserver, Observer, Recorder, SharedObserver};
pub use pipeline::{CombinePipeline, MergeSubscription};
pub use router::PassthroughRoute;

//! Combine-latest pipeline
//!
//! A [`CombinePipeline`] is a recipe: which physical channel feeds each
//! combine argument, plus the combine function. Subscribing an observer to it
//! produces a [`MergeSubscription`] that tracks which inputs it has seen. A
//! fresh subscription has seen nothing, so it stays silent until both inputs
//! have been delivered to it at least once.

use super::channel::{ChannelId, ChannelPair};
use super::config::{CombineFn, ARITY};
use super::observer::SharedObserver;
use crate::error::ValveError;
use std::fmt;
use tracing::{trace, warn};

/// Built combine step bound to the current role assignment
pub struct CombinePipeline<T, R> {
    sources: [ChannelId; ARITY],
    combine: CombineFn<T, R>,
    generation: u64,
}

impl<T, R> CombinePipeline<T, R> {
    /// Build a pipeline reading `sources[0]` as primary and `sources[1]` as
    /// secondary
    pub(crate) fn build(sources: [ChannelId; ARITY], combine: CombineFn<T, R>, generation: u64) -> Self {
        Self {
            sources,
            combine,
            generation,
        }
    }

    /// Channels feeding the combine arguments, in argument order
    pub fn sources(&self) -> [ChannelId; ARITY] {
        self.sources
    }

    /// Build counter; increases on every rebuild
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Attach an observer with fresh "seen" state
    pub(crate) fn subscribe(&self, observer: SharedObserver<R>) -> MergeSubscription<T, R> {
        trace!(generation = self.generation, "Merge observer subscribed");
        MergeSubscription {
            sources: self.sources,
            combine: CombineFn::clone(&self.combine),
            observer,
            seen: [false; ARITY],
            terminated: false,
        }
    }
}

impl<T, R> fmt::Debug for CombinePipeline<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinePipeline")
            .field("sources", &self.sources)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Live attachment of the merge observer to a pipeline
///
/// Dropping it cancels the subscription.
pub struct MergeSubscription<T, R> {
    sources: [ChannelId; ARITY],
    combine: CombineFn<T, R>,
    observer: SharedObserver<R>,
    seen: [bool; ARITY],
    terminated: bool,
}

impl<T, R> MergeSubscription<T, R> {
    /// Handle a value that was just stored on channel `id`
    ///
    /// Returns true when a merged value was delivered.
    pub(crate) fn on_channel_next(&mut self, id: ChannelId, channels: &ChannelPair<T>) -> bool {
        if self.terminated {
            return false;
        }
        let Some(position) = self.sources.iter().position(|source| *source == id) else {
            return false;
        };
        self.seen[position] = true;

        if !self.seen.iter().all(|seen| *seen) {
            trace!(?id, "Merge waiting for the other input");
            return false;
        }

        let (Some(primary), Some(secondary)) = (
            channels.get(self.sources[0]).last(),
            channels.get(self.sources[1]).last(),
        ) else {
            return false;
        };

        match (self.combine)(primary, secondary) {
            Ok(merged) => {
                self.observer.borrow_mut().on_next(merged);
                true
            }
            Err(e) => {
                warn!("Combine function failed, terminating merge subscription: {}", e);
                self.terminated = true;
                self.observer.borrow_mut().on_error(ValveError::Combine(e));
                false
            }
        }
    }

    /// Which combine arguments have been delivered since subscribing
    pub fn seen(&self) -> [bool; ARITY] {
        self.seen
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

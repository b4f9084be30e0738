//! Passthrough routes
//!
//! A route forwards every value stored on one physical channel to one
//! observer, after the type filter and passthrough transform. The route keeps
//! the channel it was connected to; it does not follow role changes.

use super::channel::{ChannelId, ChannelPair};
use super::config::{DeclaredType, TransformFn, ValveConfig};
use super::observer::SharedObserver;
use crate::error::ValveError;
use fpc_common::InputSide;
use std::fmt;
use tracing::{trace, warn};

/// Live passthrough subscription for one side
pub struct PassthroughRoute<T, P> {
    side: InputSide,
    channel: ChannelId,
    filter: DeclaredType<T>,
    transform: TransformFn<T, P>,
    observer: SharedObserver<P>,
    terminated: bool,
}

impl<T, P> PassthroughRoute<T, P>
where
    T: 'static,
    P: 'static,
{
    /// Connect `observer` to `channel` using the filter and transform from
    /// `config` as they are now
    pub(crate) fn connect<R: 'static>(
        side: InputSide,
        channel: ChannelId,
        config: &ValveConfig<T, R, P>,
        observer: SharedObserver<P>,
    ) -> Self {
        trace!(%side, ?channel, filter = config.input_type().name(), "Passthrough route connected");
        Self {
            side,
            channel,
            filter: config.input_type().clone(),
            transform: config.passthrough_fn(),
            observer,
            terminated: false,
        }
    }

    /// Reconnect the same observer on the same channel with a new config
    pub(crate) fn reconnect<R: 'static>(self, config: &ValveConfig<T, R, P>) -> Self {
        Self::connect(self.side, self.channel, config, self.observer)
    }
}

impl<T, P> PassthroughRoute<T, P> {
    /// Handle a value that was just stored on channel `id`
    ///
    /// Returns true when a value was delivered.
    pub(crate) fn on_channel_next(&mut self, id: ChannelId, channels: &ChannelPair<T>) -> bool {
        if self.terminated || id != self.channel {
            return false;
        }
        let Some(value) = channels.get(id).last() else {
            return false;
        };
        if !self.filter.accepts(value) {
            trace!(side = %self.side, filter = self.filter.name(), "Value filtered out of passthrough");
            return false;
        }

        match (self.transform)(value) {
            Ok(out) => {
                self.observer.borrow_mut().on_next(out);
                true
            }
            Err(e) => {
                warn!("Passthrough transform failed on {} route, terminating: {}", self.side, e);
                self.terminated = true;
                self.observer.borrow_mut().on_error(ValveError::Passthrough {
                    side: self.side,
                    source: e,
                });
                false
            }
        }
    }

    /// Side this route was connected for
    pub fn side(&self) -> InputSide {
        self.side
    }

    /// Physical channel this route listens to
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl<T, P> fmt::Debug for PassthroughRoute<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassthroughRoute")
            .field("side", &self.side)
            .field("channel", &self.channel)
            .field("filter", &self.filter)
            .field("terminated", &self.terminated)
            .finish()
    }
}

//! Merge-or-passthrough valve
//!
//! The valve owns both input channels and dispatches every stored value to
//! whatever is currently subscribed:
//! - MERGED: one [`MergeSubscription`] combines the latest primary and
//!   secondary values and delivers the result to the merge observer.
//! - PASSTHROUGH: up to two [`PassthroughRoute`]s forward each side's values
//!   to the primary and secondary observers.
//!
//! Mode transitions, swaps and shifts tear subscriptions down and rebuild
//! them. Values stored on the channels survive every transition.

use super::channel::{ChannelId, ChannelPair};
use super::config::ValveConfig;
use super::observer::SharedObserver;
use super::pipeline::{CombinePipeline, MergeSubscription};
use super::router::PassthroughRoute;
use fpc_common::config::ValveSettings;
use fpc_common::{InputSide, ValveMode};
use std::fmt;
use tracing::{debug, trace};

/// Dual-mode valve over two inputs of type `T`
///
/// `R` is the merged output type, `P` the passthrough output type.
pub struct MergeValve<T, R, P = T> {
    channels: ChannelPair<T>,
    config: ValveConfig<T, R, P>,
    pipeline: CombinePipeline<T, R>,
    generation: u64,
    mode: ValveMode,

    /// Set by enable_merge; the next push first replays the other side
    carry_over: bool,

    merge_observer: Option<SharedObserver<R>>,
    primary_observer: Option<SharedObserver<P>>,
    secondary_observer: Option<SharedObserver<P>>,

    merge_subscription: Option<MergeSubscription<T, R>>,
    primary_route: Option<PassthroughRoute<T, P>>,
    secondary_route: Option<PassthroughRoute<T, P>>,
}

impl<T, R, P> MergeValve<T, R, P>
where
    T: 'static,
    R: 'static,
    P: 'static,
{
    /// Create a valve in MERGED mode
    pub fn new(config: ValveConfig<T, R, P>) -> Self {
        Self::with_mode(config, ValveMode::Merged)
    }

    /// Create a valve starting in `mode`
    pub fn with_mode(config: ValveConfig<T, R, P>, mode: ValveMode) -> Self {
        let channels = ChannelPair::new();
        let pipeline = Self::build_pipeline(&channels, &config, 1);
        debug!(%mode, "Valve created");
        Self {
            channels,
            config,
            pipeline,
            generation: 1,
            mode,
            carry_over: false,
            merge_observer: None,
            primary_observer: None,
            secondary_observer: None,
            merge_subscription: None,
            primary_route: None,
            secondary_route: None,
        }
    }

    /// Create a valve using loaded settings
    pub fn with_settings(config: ValveConfig<T, R, P>, settings: &ValveSettings) -> Self {
        Self::with_mode(config, settings.initial_mode)
    }

    // ========================================
    // Configuration
    // ========================================

    /// Replace the configuration and rebuild
    ///
    /// In MERGED mode a registered merge observer is re-subscribed (with fresh
    /// seen state). In PASSTHROUGH mode connected routes are reconnected on the
    /// same channels using the new filter and transform.
    pub fn set_configuration(&mut self, config: ValveConfig<T, R, P>) {
        self.config = config;
        self.rebuild_pipeline();

        match self.mode {
            ValveMode::Merged => self.resubscribe_merge(),
            ValveMode::Passthrough => {
                self.primary_route = self.primary_route.take().map(|route| route.reconnect(&self.config));
                self.secondary_route = self.secondary_route.take().map(|route| route.reconnect(&self.config));
            }
        }
        debug!(generation = self.generation, mode = %self.mode, "Valve configuration replaced");
    }

    pub fn configuration(&self) -> &ValveConfig<T, R, P> {
        &self.config
    }

    // ========================================
    // Observers
    // ========================================

    /// Register the merged-output observer, replacing any previous one
    ///
    /// Subscribed immediately in MERGED mode, otherwise on the next
    /// enable_merge.
    pub fn set_merge_observer(&mut self, observer: SharedObserver<R>) {
        self.merge_observer = Some(observer);
        if self.mode == ValveMode::Merged {
            self.resubscribe_merge();
        }
    }

    /// Register the primary passthrough observer
    ///
    /// Connected immediately in PASSTHROUGH mode, otherwise on the next
    /// disable_merge.
    pub fn set_primary_observer(&mut self, observer: SharedObserver<P>) {
        self.primary_observer = Some(observer);
        if self.mode == ValveMode::Passthrough {
            self.primary_route = None;
            self.connect_primary();
        }
    }

    /// Register the secondary passthrough observer
    pub fn set_secondary_observer(&mut self, observer: SharedObserver<P>) {
        self.secondary_observer = Some(observer);
        if self.mode == ValveMode::Passthrough {
            self.secondary_route = None;
            self.connect_secondary();
        }
    }

    // ========================================
    // Inputs
    // ========================================

    pub fn push_primary(&mut self, value: T) {
        self.push(InputSide::Primary, value);
    }

    pub fn push_secondary(&mut self, value: T) {
        self.push(InputSide::Secondary, value);
    }

    /// Store `value` as the latest for `side` and dispatch it
    ///
    /// The first push after enable_merge replays the other side's stored value
    /// before dispatching this one.
    pub fn push(&mut self, side: InputSide, value: T) {
        if std::mem::take(&mut self.carry_over) {
            let other = side.other();
            if self.channels.last(other).is_some() {
                debug!(%other, "Replaying carried-over value");
                self.dispatch(self.channels.id_of(other));
            }
        }

        let id = self.channels.store(side, value);
        trace!(%side, ?id, "Input pushed");
        self.dispatch(id);
    }

    // ========================================
    // Mode control
    // ========================================

    /// Switch to PASSTHROUGH; no-op if already there
    pub fn disable_merge(&mut self) {
        if self.mode == ValveMode::Passthrough {
            return;
        }
        self.connect_primary();
        self.connect_secondary();
        self.merge_subscription = None;
        self.carry_over = false;
        self.mode = ValveMode::Passthrough;
        debug!("Merge disabled");
    }

    /// Switch to MERGED; no-op if already there
    ///
    /// Emits nothing by itself. The next push replays the other side's stored
    /// value so a single push can produce a merged value.
    pub fn enable_merge(&mut self) {
        if self.mode == ValveMode::Merged {
            return;
        }
        self.carry_over = true;
        self.primary_route = None;
        self.secondary_route = None;
        self.mode = ValveMode::Merged;
        self.resubscribe_merge();
        debug!("Merge enabled");
    }

    pub fn set_merge_enabled(&mut self, enabled: bool) {
        if enabled {
            self.enable_merge();
        } else {
            self.disable_merge();
        }
    }

    /// Exchange primary and secondary roles (MERGED only)
    ///
    /// Stored values follow their channels, so the old secondary value becomes
    /// the primary value. Both are re-dispatched into a fresh subscription,
    /// producing one merged value when both sides hold values.
    pub fn swap(&mut self) {
        if self.mode != ValveMode::Merged {
            debug!("Swap ignored in passthrough mode");
            return;
        }
        self.channels.exchange_roles();
        self.rebuild_pipeline();
        self.resubscribe_merge();
        self.carry_over = false;
        debug!(primary = ?self.channels.id_of(InputSide::Primary), "Inputs swapped");

        for side in [InputSide::Primary, InputSide::Secondary] {
            if self.channels.last(side).is_some() {
                self.dispatch(self.channels.id_of(side));
            }
        }
    }

    /// Promote the secondary input to primary (PASSTHROUGH only)
    ///
    /// Only the primary route is rebuilt. The existing secondary route stays
    /// on its channel, which is now the primary one; after a shift both
    /// observers see primary pushes and neither sees secondary pushes until
    /// the routes are rebuilt by a mode change.
    pub fn shift_primary(&mut self) {
        if self.mode != ValveMode::Passthrough {
            debug!("Shift ignored in merged mode");
            return;
        }
        self.primary_route = None;
        self.channels.exchange_roles();
        self.rebuild_pipeline();
        self.connect_primary();
        debug!(primary = ?self.channels.id_of(InputSide::Primary), "Secondary shifted to primary");

        if self.channels.last(InputSide::Primary).is_some() {
            self.dispatch(self.channels.id_of(InputSide::Primary));
        }
    }

    // ========================================
    // Introspection
    // ========================================

    pub fn mode(&self) -> ValveMode {
        self.mode
    }

    pub fn is_merge_enabled(&self) -> bool {
        self.mode == ValveMode::Merged
    }

    pub fn last_primary(&self) -> Option<&T> {
        self.channels.last(InputSide::Primary)
    }

    pub fn last_secondary(&self) -> Option<&T> {
        self.channels.last(InputSide::Secondary)
    }

    /// Whether the next push will replay the other side first
    pub fn has_pending_carry_over(&self) -> bool {
        self.carry_over
    }

    /// Physical channel currently playing primary
    pub fn primary_channel(&self) -> ChannelId {
        self.channels.id_of(InputSide::Primary)
    }

    pub fn channels(&self) -> &ChannelPair<T> {
        &self.channels
    }

    pub fn pipeline(&self) -> &CombinePipeline<T, R> {
        &self.pipeline
    }

    /// Number of pipeline builds so far
    pub fn pipeline_generation(&self) -> u64 {
        self.generation
    }

    /// Channel the route for `side` is connected to, if connected
    pub fn route_channel(&self, side: InputSide) -> Option<ChannelId> {
        let route = match side {
            InputSide::Primary => self.primary_route.as_ref(),
            InputSide::Secondary => self.secondary_route.as_ref(),
        };
        route.map(|r| r.channel())
    }

    pub fn is_merge_subscribed(&self) -> bool {
        self.merge_subscription.is_some()
    }

    // ========================================
    // Internals
    // ========================================

    fn build_pipeline(channels: &ChannelPair<T>, config: &ValveConfig<T, R, P>, generation: u64) -> CombinePipeline<T, R> {
        CombinePipeline::build(
            [channels.id_of(InputSide::Primary), channels.id_of(InputSide::Secondary)],
            config.combine_fn(),
            generation,
        )
    }

    fn rebuild_pipeline(&mut self) {
        self.generation += 1;
        self.pipeline = Self::build_pipeline(&self.channels, &self.config, self.generation);
        trace!(generation = self.generation, sources = ?self.pipeline.sources(), "Pipeline rebuilt");
    }

    /// Cancel the merge subscription and, if an observer is registered,
    /// subscribe it again with fresh seen state
    fn resubscribe_merge(&mut self) {
        self.merge_subscription = None;
        if let Some(observer) = &self.merge_observer {
            self.merge_subscription = Some(self.pipeline.subscribe(SharedObserver::clone(observer)));
        }
    }

    fn connect_primary(&mut self) {
        if let Some(observer) = &self.primary_observer {
            let channel = self.channels.id_of(InputSide::Primary);
            self.primary_route = Some(PassthroughRoute::connect(
                InputSide::Primary,
                channel,
                &self.config,
                SharedObserver::clone(observer),
            ));
        }
    }

    fn connect_secondary(&mut self) {
        if let Some(observer) = &self.secondary_observer {
            let channel = self.channels.id_of(InputSide::Secondary);
            self.secondary_route = Some(PassthroughRoute::connect(
                InputSide::Secondary,
                channel,
                &self.config,
                SharedObserver::clone(observer),
            ));
        }
    }

    /// Deliver the value stored on `id` to every live subscription
    fn dispatch(&mut self, id: ChannelId) {
        if let Some(subscription) = self.merge_subscription.as_mut() {
            subscription.on_channel_next(id, &self.channels);
        }
        if let Some(route) = self.primary_route.as_mut() {
            route.on_channel_next(id, &self.channels);
        }
        if let Some(route) = self.secondary_route.as_mut() {
            route.on_channel_next(id, &self.channels);
        }
    }
}

impl<T, R, P> fmt::Debug for MergeValve<T, R, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeValve")
            .field("mode", &self.mode)
            .field("primary", &self.channels.id_of(InputSide::Primary))
            .field("generation", &self.generation)
            .field("carry_over", &self.carry_over)
            .field("merge_subscribed", &self.merge_subscription.is_some())
            .field("primary_route", &self.primary_route)
            .field("secondary_route", &self.secondary_route)
            .finish_non_exhaustive()
    }
}

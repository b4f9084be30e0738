//! Test helpers for fpc-valve integration tests
//!
//! Provides:
//! - Payload builders (`response`, `failure`)
//! - `ObservedValve`: a comparison valve with recorders on every output

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use fpc_common::api::{CompareResponse, Payload, QueryRequest, QueryResponse, RequestFailure};
use fpc_common::ValveMode;
use fpc_valve::compare::{compare_config, CompareValve};
use fpc_valve::valve::Recorder;
use fpc_valve::MergeValve;
use uuid::Uuid;

/// Successful response payload for `model`
pub fn response(model: &str) -> Payload {
    QueryResponse::new(QueryRequest::new(Uuid::new_v4(), model)).into()
}

/// Failed request payload for `model`
pub fn failure(model: &str) -> Payload {
    RequestFailure {
        request: QueryRequest::new(Uuid::new_v4(), model),
        message: "service unavailable".to_string(),
    }
    .into()
}

/// Model of a payload (response or failure)
pub fn model(payload: &Payload) -> &str {
    &payload.request().model
}

/// Comparison valve with a recorder attached to each output
pub struct ObservedValve {
    pub valve: CompareValve,
    pub merged: Rc<RefCell<Recorder<CompareResponse>>>,
    pub primary: Rc<RefCell<Recorder<Payload>>>,
    pub secondary: Rc<RefCell<Recorder<Payload>>>,
}

impl ObservedValve {
    pub fn new() -> Self {
        Self::with_mode(ValveMode::Merged)
    }

    pub fn with_mode(mode: ValveMode) -> Self {
        let mut valve = MergeValve::with_mode(compare_config(), mode);
        let merged = Recorder::<CompareResponse>::shared();
        let primary = Recorder::<Payload>::shared();
        let secondary = Recorder::<Payload>::shared();
        valve.set_merge_observer(merged.clone());
        valve.set_primary_observer(primary.clone());
        valve.set_secondary_observer(secondary.clone());
        Self {
            valve,
            merged,
            primary,
            secondary,
        }
    }

    pub fn push_primary(&mut self, model: &str) {
        self.valve.push_primary(response(model));
    }

    pub fn push_secondary(&mut self, model: &str) {
        self.valve.push_secondary(response(model));
    }

    pub fn merge_count(&self) -> usize {
        self.merged.borrow().next_count()
    }

    pub fn primary_count(&self) -> usize {
        self.primary.borrow().next_count()
    }

    pub fn secondary_count(&self) -> usize {
        self.secondary.borrow().next_count()
    }

    /// `(primary, secondary)` models of the most recent merged value
    pub fn last_merge(&self) -> Option<(String, String)> {
        self.merged.borrow().last().map(|c| {
            let (p, s) = c.models();
            (p.to_string(), s.to_string())
        })
    }

    pub fn last_primary_model(&self) -> Option<String> {
        self.valve.last_primary().map(|p| model(p).to_string())
    }

    pub fn last_secondary_model(&self) -> Option<String> {
        self.valve.last_secondary().map(|p| model(p).to_string())
    }

    /// `(merged, primary, secondary)` delivery counts
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.merge_count(), self.primary_count(), self.secondary_count())
    }
}

/// Expected `(primary, secondary)` model pair
pub fn models(primary: &str, secondary: &str) -> Option<(String, String)> {
    Some((primary.to_string(), secondary.to_string()))
}

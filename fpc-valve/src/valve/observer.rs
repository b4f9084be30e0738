//! Observer side of the valve
//!
//! Observers are shared handles (`Rc<RefCell<..>>`) so the same observer can
//! be registered once and then re-subscribed by the valve on every rebuild
//! without the caller having to register it again.

use crate::error::ValveError;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::warn;

/// Receiver of values (or a terminal failure) from the valve
pub trait Observer<V> {
    /// Called once per delivered value
    fn on_next(&mut self, value: V);

    /// Called at most once per subscription; no values follow until the
    /// valve re-creates the subscription
    fn on_error(&mut self, error: ValveError);
}

/// Shared observer handle as stored by the valve
pub type SharedObserver<V> = Rc<RefCell<dyn Observer<V>>>;

/// Observer built from a closure; failures are logged and dropped
pub struct FnObserver<F> {
    on_next: F,
}

impl<F> FnObserver<F> {
    pub fn new(on_next: F) -> Self {
        Self { on_next }
    }
}

impl<V, F> Observer<V> for FnObserver<F>
where
    F: FnMut(V),
{
    fn on_next(&mut self, value: V) {
        (self.on_next)(value)
    }

    fn on_error(&mut self, error: ValveError) {
        warn!("Unhandled valve error: {}", error);
    }
}

/// Wrap a closure as a shared observer
pub fn from_fn<V, F>(on_next: F) -> SharedObserver<V>
where
    V: 'static,
    F: FnMut(V) + 'static,
{
    Rc::new(RefCell::new(FnObserver::new(on_next)))
}

/// Observer that keeps everything it receives
///
/// Intended for tests and for tools that inspect output after the fact.
pub struct Recorder<V> {
    values: Vec<V>,
    errors: Vec<ValveError>,
}

impl<V> Default for Recorder<V> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<V> Recorder<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// New recorder behind a shared handle
    ///
    /// Clone the handle to register it; it coerces to [`SharedObserver`].
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn errors(&self) -> &[ValveError] {
        &self.errors
    }

    pub fn next_count(&self) -> usize {
        self.values.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Most recent value, if any
    pub fn last(&self) -> Option<&V> {
        self.values.last()
    }

    /// Take the recorded values, leaving the recorder empty
    pub fn take_values(&mut self) -> Vec<V> {
        std::mem::take(&mut self.values)
    }
}

impl<V> Observer<V> for Recorder<V> {
    fn on_next(&mut self, value: V) {
        self.values.push(value);
    }

    fn on_error(&mut self, error: ValveError) {
        self.errors.push(error);
    }
}

impl<V: fmt::Debug> fmt::Debug for Recorder<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorder")
            .field("values", &self.values)
            .field("errors", &self.errors.len())
            .finish()
    }
}

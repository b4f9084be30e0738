//! Command-style control of a valve
//!
//! Window controllers and the bus bridge drive a valve with [`ValveCommand`]s
//! instead of calling its methods directly, so a sequence of user actions can
//! be queued, logged or replayed.

use crate::valve::MergeValve;
use fpc_common::InputSide;
use std::fmt;
use tracing::trace;

/// One operation on a valve
#[derive(Clone, PartialEq, Eq)]
pub enum ValveCommand<T> {
    PushPrimary(T),
    PushSecondary(T),
    /// Enable (true) or disable (false) merging; repeating a state is a no-op
    SetMergeEnabled(bool),
    Swap,
    ShiftPrimary,
}

impl<T> ValveCommand<T> {
    /// Push onto `side`
    pub fn push(side: InputSide, value: T) -> Self {
        match side {
            InputSide::Primary => ValveCommand::PushPrimary(value),
            InputSide::Secondary => ValveCommand::PushSecondary(value),
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ValveCommand::PushPrimary(_) => "push_primary",
            ValveCommand::PushSecondary(_) => "push_secondary",
            ValveCommand::SetMergeEnabled(true) => "enable_merge",
            ValveCommand::SetMergeEnabled(false) => "disable_merge",
            ValveCommand::Swap => "swap",
            ValveCommand::ShiftPrimary => "shift_primary",
        }
    }
}

// Payloads can be large; the name is enough in logs
impl<T> fmt::Debug for ValveCommand<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<T, R, P> MergeValve<T, R, P>
where
    T: 'static,
    R: 'static,
    P: 'static,
{
    /// Apply one command
    pub fn apply(&mut self, command: ValveCommand<T>) {
        trace!(command = command.name(), "Applying valve command");
        match command {
            ValveCommand::PushPrimary(value) => self.push_primary(value),
            ValveCommand::PushSecondary(value) => self.push_secondary(value),
            ValveCommand::SetMergeEnabled(enabled) => self.set_merge_enabled(enabled),
            ValveCommand::Swap => self.swap(),
            ValveCommand::ShiftPrimary => self.shift_primary(),
        }
    }

    /// Apply commands in order
    pub fn apply_all<I>(&mut self, commands: I)
    where
        I: IntoIterator<Item = ValveCommand<T>>,
    {
        for command in commands {
            self.apply(command);
        }
    }
}

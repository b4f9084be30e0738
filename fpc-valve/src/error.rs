//! Error types for fpc-valve
//!
//! Two families live here:
//! - [`ValveError`] is what an observer receives when a user callback fails
//!   while a value is being delivered to it. It is terminal for that
//!   subscription.
//! - [`Error`] covers the surfaces around the valve (script replay, bus
//!   bridge, configuration).

use fpc_common::InputSide;
use thiserror::Error;

/// Boxed error returned by user-supplied combine/transform callbacks
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure delivered to an observer instead of a value
#[derive(Error, Debug)]
pub enum ValveError {
    /// The combine function rejected the current pair of inputs
    #[error("Combine function failed: {0}")]
    Combine(#[source] BoxError),

    /// The passthrough transform rejected a value on one side
    #[error("Passthrough transform failed on {side} input: {source}")]
    Passthrough {
        /// Side whose route was delivering
        side: InputSide,
        /// Error returned by the transform
        #[source]
        source: BoxError,
    },
}

/// Main error type for fpc-valve surfaces
#[derive(Error, Debug)]
pub enum Error {
    /// Replay script could not be parsed
    #[error("Script error on line {line}: {message}")]
    Script {
        /// 1-based line number
        line: usize,
        /// What was wrong with the line
        message: String,
    },

    /// Output could not be written
    #[error("Output error: {0}")]
    Output(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Shared configuration/input errors
    #[error(transparent)]
    Common(#[from] fpc_common::Error),
}

/// Convenience Result type using fpc-valve Error
pub type Result<T> = std::result::Result<T, Error>;

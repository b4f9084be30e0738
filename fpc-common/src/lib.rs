//! # fpcompare Common Library
//!
//! Shared code for the fpcompare crates including:
//! - Query/compare payload types
//! - Event types (CompareEvent enum) and the EventBus
//! - Configuration loading
//! - Common error type

pub mod api;
pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
pub use events::{InputSide, ValveMode};

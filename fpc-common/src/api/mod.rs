//! Shared API payload types

pub mod types;

pub use types::{CompareResponse, Payload, PayloadKind, QueryRequest, QueryResponse, RequestFailure};

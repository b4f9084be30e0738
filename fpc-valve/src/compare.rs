//! Standard valve configuration for query payloads
//!
//! Pairs a primary and a secondary [`QueryResponse`] into a
//! [`CompareResponse`]. Failed requests cannot be compared, so the combine
//! step rejects them, and the passthrough routes only forward successful
//! responses.

use crate::error::BoxError;
use crate::valve::{DeclaredType, Kinded, MergeValve, ValveConfig};
use fpc_common::api::{CompareResponse, Payload, PayloadKind};
use thiserror::Error;

/// Valve carrying query payloads
pub type CompareValve = MergeValve<Payload, CompareResponse, Payload>;

impl Kinded for Payload {
    type Kind = PayloadKind;

    fn kind(&self) -> PayloadKind {
        Payload::kind(self)
    }
}

/// Why two payloads could not be paired
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompareError {
    #[error("primary request '{model}' failed: {message}")]
    PrimaryFailed { model: String, message: String },

    #[error("secondary request '{model}' failed: {message}")]
    SecondaryFailed { model: String, message: String },
}

/// Pair two payloads; either side being a failure is an error
pub fn pair_payloads(primary: &Payload, secondary: &Payload) -> Result<CompareResponse, BoxError> {
    match (primary, secondary) {
        (Payload::Response(p), Payload::Response(s)) => Ok(CompareResponse::pair(p, s)),
        (Payload::Failure(f), _) => Err(Box::new(CompareError::PrimaryFailed {
            model: f.request.model.clone(),
            message: f.message.clone(),
        })),
        (_, Payload::Failure(f)) => Err(Box::new(CompareError::SecondaryFailed {
            model: f.request.model.clone(),
            message: f.message.clone(),
        })),
    }
}

/// Configuration used for comparing query responses
pub fn compare_config() -> ValveConfig<Payload, CompareResponse> {
    ValveConfig::new(pair_payloads).with_input_type(DeclaredType::kind(PayloadKind::Response))
}

//! Shared query/compare payload types
//!
//! These are the values window controllers push into a merge valve. The valve
//! itself treats them as opaque; only the combine function and the declared
//! passthrough type look inside.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ========================================
// Requests and responses
// ========================================

/// A query issued by one input window against the fingerprint service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Unique request id
    pub id: Uuid,

    /// Input window that issued the query
    pub window_id: Uuid,

    /// Query model (term, text or expression in its display form)
    pub model: String,
}

impl QueryRequest {
    /// Create a request for `model` issued by `window_id`
    pub fn new(window_id: Uuid, model: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            window_id,
            model: model.into(),
        }
    }
}

/// Successful response from the fingerprint service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Request this response answers
    pub request: QueryRequest,

    /// Active fingerprint positions
    #[serde(default)]
    pub fingerprint: Vec<u32>,

    /// Whether the response was served from the client-side cache
    #[serde(default)]
    pub cached: bool,
}

impl QueryResponse {
    /// Create a response with an empty fingerprint
    pub fn new(request: QueryRequest) -> Self {
        Self {
            request,
            fingerprint: Vec::new(),
            cached: false,
        }
    }

    /// Query model this response was produced for
    pub fn model(&self) -> &str {
        &self.request.model
    }
}

/// A request that failed at the service boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFailure {
    /// Request that failed
    pub request: QueryRequest,

    /// Human-readable failure description
    pub message: String,
}

// ========================================
// Payload (valve input type)
// ========================================

/// Value carried on either valve input
///
/// Window controllers forward both successes and failures; the passthrough
/// route only declares `PayloadKind::Response` so failures never reach the
/// per-side displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    /// Successful query response
    Response(QueryResponse),
    /// Failed query
    Failure(RequestFailure),
}

/// Runtime tag of a [`Payload`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    /// Tag of `Payload::Response`
    Response,
    /// Tag of `Payload::Failure`
    Failure,
}

impl Payload {
    /// Runtime tag of this payload
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Response(_) => PayloadKind::Response,
            Payload::Failure(_) => PayloadKind::Failure,
        }
    }

    /// Request this payload belongs to
    pub fn request(&self) -> &QueryRequest {
        match self {
            Payload::Response(r) => &r.request,
            Payload::Failure(f) => &f.request,
        }
    }

    /// The response, if this payload is a success
    pub fn as_response(&self) -> Option<&QueryResponse> {
        match self {
            Payload::Response(r) => Some(r),
            Payload::Failure(_) => None,
        }
    }
}

impl From<QueryResponse> for Payload {
    fn from(response: QueryResponse) -> Self {
        Payload::Response(response)
    }
}

impl From<RequestFailure> for Payload {
    fn from(failure: RequestFailure) -> Self {
        Payload::Failure(failure)
    }
}

// ========================================
// Compare (valve merge output)
// ========================================

/// Pairing of a primary and a secondary response, ready for comparison display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareResponse {
    /// Primary side response
    pub primary: QueryResponse,

    /// Secondary side response
    pub secondary: QueryResponse,

    /// When the pairing was produced
    pub created_at: DateTime<Utc>,
}

impl CompareResponse {
    /// Pair two responses in primary/secondary order
    pub fn pair(primary: &QueryResponse, secondary: &QueryResponse) -> Self {
        Self {
            primary: primary.clone(),
            secondary: secondary.clone(),
            created_at: Utc::now(),
        }
    }

    /// `(primary model, secondary model)`
    pub fn models(&self) -> (&str, &str) {
        (self.primary.model(), self.secondary.model())
    }
}

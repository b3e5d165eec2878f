//! Shared error type across gripwire crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed frame / unreadable body.
    BadRequest,
    /// Unknown test endpoint.
    NotFound,
    /// Hand-off upstream unreachable.
    BadGateway,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in logs and metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::BadGateway => "BAD_GATEWAY",
            ClientCode::Internal => "INTERNAL",
        }
    }

    /// HTTP status code the gateway answers with.
    pub fn http_status(self) -> u16 {
        match self {
            ClientCode::BadRequest => 400,
            ClientCode::NotFound => 404,
            ClientCode::BadGateway => 502,
            ClientCode::Internal => 500,
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, GripError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum GripError {
    /// Wrong content type or unrecognized leading event.
    #[error("{0}")]
    Protocol(String),
    /// Malformed or truncated WebSocket-over-HTTP frame.
    #[error("malformed frame: {0}")]
    Frame(String),
    /// The transport failed to deliver the request body.
    #[error("error reading request body: {0}")]
    BodyRead(String),
    #[error("no such test endpoint")]
    RouteNotFound,
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("invalid config: {0}")]
    Config(String),
    #[error("upstream request failed: {0}")]
    Upstream(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl GripError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            GripError::Protocol(_) => ClientCode::BadRequest,
            GripError::Frame(_) => ClientCode::BadRequest,
            GripError::BodyRead(_) => ClientCode::BadRequest,
            GripError::RouteNotFound => ClientCode::NotFound,
            GripError::UnsupportedVersion => ClientCode::BadRequest,
            GripError::Config(_) => ClientCode::BadRequest,
            GripError::Upstream(_) => ClientCode::BadGateway,
            GripError::Internal(_) => ClientCode::Internal,
        }
    }
}

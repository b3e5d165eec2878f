//! Test endpoints served when the holding proxy calls back with the signal header.
//!
//! - `grip_hold`: long-poll / stream / SSE hold instructions
//! - `ws_over_http`: WebSocket-over-HTTP event batches

pub mod grip_hold;
pub mod ws_over_http;

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use gripwire_core::error::{GripError, Result};
use gripwire_core::protocol::grip::GripControl;

/// Build a response carrying GRIP control headers.
pub fn render_control(status: u16, control: &GripControl, body: Bytes) -> Result<Response> {
    let mut builder = Response::builder().status(status);
    for (name, value) in control.headers() {
        builder = builder.header(name, value);
    }
    builder
        .body(Body::from(body))
        .map_err(|e| GripError::Internal(format!("building control response: {e}")))
}

/// Status + one-line plain text diagnostic.
pub fn error_response(err: &GripError) -> Response {
    let status = StatusCode::from_u16(err.client_code().http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, format!("{err}\n")).into_response()
}

use axum::response::Response;

use gripwire_core::error::Result;
use gripwire_core::protocol::grip::{self, TransportMode};

use super::render_control;

/// Tell the holding proxy to hold the client connection on `channel`.
pub fn hold_response(mode: TransportMode, channel: &str) -> Result<Response> {
    let resp = grip::initiate(mode, mode.content_type(), channel)?;
    tracing::debug!(%mode, channel, hold = ?resp.control.grip_hold(), "grip hold response");
    render_control(resp.status, &resp.control, resp.body)
}

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request},
    response::Response,
};

use gripwire_core::error::{GripError, Result};
use gripwire_core::protocol::ws_events::EventKind;
use gripwire_core::session;

use crate::app_state::AppState;

use super::render_control;

/// Answer one WebSocket-over-HTTP request from the holding proxy.
pub async fn handle(app: &AppState, req: Request<Body>, channel: &str) -> Result<Response> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    session::check_content_type(content_type.as_deref())?;

    let body = axum::body::to_bytes(req.into_body(), app.cfg().gateway.max_body_bytes)
        .await
        .map_err(|e| GripError::BodyRead(e.to_string()))?;

    let reply = session::handle_ws_events(content_type.as_deref(), &body, channel)?;

    for kind in &reply.events {
        let kind = match kind {
            EventKind::Open => "open",
            EventKind::Text => "text",
            EventKind::Unknown => "unknown",
        };
        app.metrics().ws_events.inc(&[("kind", kind)]);
    }
    tracing::debug!(channel, events = reply.events.len(), bytes = reply.body.len(), "websocket-events reply");

    render_control(200, &reply.control, reply.body)
}

//! Single entry point for every inbound request.
//!
//! Responsibilities:
//! - Derive host/path/signal and ask the routing rules for a target
//! - Serve test endpoints, or hand the request off to the holding proxy
//! - Stamp `X-Forwarded-*` on the hand-off request and on every response
//! - Record per-target metrics

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header::HOST, Request},
    response::Response,
};

use gripwire_core::error::GripError;
use gripwire_core::protocol::grip::TransportMode;
use gripwire_core::routing::{HandoffTarget, RoutingTarget};

use crate::app_state::AppState;
use crate::services::{error_response, grip_hold, ws_over_http};
use crate::transport::forwarded;

pub async fn ingress(
    State(app): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    req: Request<Body>,
) -> Response {
    let start = Instant::now();

    let host = request_host(&req);
    let path = req.uri().path().to_owned();
    let scheme = forwarded::inbound_scheme(req.uri(), &app.cfg().gateway.default_scheme).to_owned();
    let has_signal = req
        .headers()
        .get(app.cfg().routing.signal_header.as_str())
        .is_some_and(|v| !v.is_empty());

    let target = app.rules().route(&host, &path, has_signal);
    tracing::debug!(%host, %path, %remote, has_signal, route = target.as_str(), "routing decision");
    app.metrics().requests.inc(&[("target", target.as_str())]);

    let mut resp = match target {
        RoutingTarget::ServeTest(mode) => serve_test(&app, mode, req).await,
        RoutingTarget::HandoffSelf => {
            hand_off(&app, HandoffTarget::SelfService, remote, &scheme, req).await
        }
        RoutingTarget::HandoffOrigin => {
            hand_off(&app, HandoffTarget::Origin, remote, &scheme, req).await
        }
    };

    forwarded::apply(resp.headers_mut(), remote, &scheme);

    app.metrics()
        .responses
        .inc(&[("status", resp.status().as_str())]);
    app.metrics()
        .request_duration
        .observe(&[("target", target.as_str())], start.elapsed());

    resp
}

async fn hand_off(
    app: &AppState,
    handoff_target: HandoffTarget,
    remote: SocketAddr,
    scheme: &str,
    mut req: Request<Body>,
) -> Response {
    forwarded::apply(req.headers_mut(), remote, scheme);
    match app.handoff().handoff(handoff_target, req).await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::error!(handoff = %handoff_target, error = %e, "hand-off failed");
            app.metrics()
                .handoff_failures
                .inc(&[("target", handoff_target.label())]);
            error_response(&e)
        }
    }
}

async fn serve_test(app: &AppState, mode: Option<TransportMode>, req: Request<Body>) -> Response {
    let channel = app.cfg().routing.test_channel.as_str();

    let result = match mode {
        None => Err(GripError::RouteNotFound),
        Some(TransportMode::WebSocket) => ws_over_http::handle(app, req, channel).await,
        Some(mode) => grip_hold::hold_response(mode, channel),
    };

    result.unwrap_or_else(|e| {
        let code = e.client_code();
        tracing::warn!(code = code.as_str(), error = %e, "test request rejected");
        app.metrics().rejections.inc(&[("code", code.as_str())]);
        error_response(&e)
    })
}

/// Host header, falling back to the URI authority (HTTP/2, absolute-form).
fn request_host(req: &Request<Body>) -> String {
    req.headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri().host())
        .unwrap_or_default()
        .to_owned()
}

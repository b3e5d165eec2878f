//! Axum router wiring.
//!
//! Every path on the main listener belongs to the ingress handler; the
//! operational endpoints live on their own listener so they never shadow
//! origin traffic.

use axum::{routing::get, Router};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .fallback(transport::ingress::ingress)
        .with_state(state)
}

pub fn build_ops_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}

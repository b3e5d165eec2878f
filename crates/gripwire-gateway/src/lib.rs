//! gripwire gateway library entry.
//!
//! Wires configuration, the ingress handler, the hand-off collaborator, the
//! GRIP test endpoints and the operational endpoints into an axum service.
//! Consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
pub mod services;
pub mod transport;

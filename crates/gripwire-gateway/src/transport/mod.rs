//! Transport layer (HTTP ingress + hand-off).
//!
//! `ingress` receives every request and applies the routing decision;
//! `handoff` passes requests on to the holding proxy; `forwarded` stamps
//! the `X-Forwarded-*` headers.

pub mod forwarded;
pub mod handoff;
pub mod ingress;

pub use handoff::{Handoff, UpstreamHandoff};

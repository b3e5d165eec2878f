//! gripwire core: transport-agnostic GRIP primitives, routing decision, and error types.
//!
//! This crate defines the wire-level contracts shared by the gateway and its
//! tests: WebSocket-over-HTTP framing, GRIP control headers, the
//! WebSocket-over-HTTP session reply logic and the per-request routing
//! decision. It carries no transport or runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Every fallible path surfaces as `GripError`/`Result` so a hostile or
//! truncated body cannot take the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;
pub mod routing;
pub mod session;

/// Shared result type.
pub use error::{GripError, Result};

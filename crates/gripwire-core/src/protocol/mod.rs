//! Protocol modules (GRIP control + WebSocket-over-HTTP framing).
//!
//! - `grip`: control headers telling the holding proxy how to treat a response.
//! - `ws_events`: the `application/websocket-events` event line format.
//!
//! All parsers are panic-free: malformed input is reported as `GripError`
//! instead of indexing raw buffers.

pub mod grip;
pub mod ws_events;

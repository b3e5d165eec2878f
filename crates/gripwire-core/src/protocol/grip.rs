//! GRIP control responses.
//!
//! A handed-off request comes back from the holding proxy; the reply headers
//! tell it how to hold the client connection and which channel to attach.

use std::fmt;

use bytes::Bytes;

use crate::error::{GripError, Result};

pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_GRIP_HOLD: &str = "Grip-Hold";
pub const HEADER_GRIP_CHANNEL: &str = "Grip-Channel";
pub const HEADER_WS_EXTENSIONS: &str = "Sec-WebSocket-Extensions";

/// Extension value enabling GRIP control messages on a WebSocket-over-HTTP session.
pub const GRIP_WS_EXTENSION: &str = "grip; message-prefix=\"\"";

/// Transport a test endpoint exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    LongPoll,
    Stream,
    Sse,
    WebSocket,
}

impl TransportMode {
    /// Map a test sub-path segment (`long-poll`, `stream`, `sse`, `websocket`).
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "long-poll" => Some(TransportMode::LongPoll),
            "stream" => Some(TransportMode::Stream),
            "sse" => Some(TransportMode::Sse),
            "websocket" => Some(TransportMode::WebSocket),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransportMode::LongPoll => "long-poll",
            TransportMode::Stream => "stream",
            TransportMode::Sse => "sse",
            TransportMode::WebSocket => "websocket",
        }
    }

    /// Content type the held response is announced with.
    pub fn content_type(self) -> &'static str {
        match self {
            TransportMode::LongPoll | TransportMode::Stream => "text/plain",
            TransportMode::Sse => "text/event-stream",
            TransportMode::WebSocket => crate::protocol::ws_events::CONTENT_TYPE,
        }
    }

    /// Hold recipe; `None` for WebSocket, which is negotiated per event batch.
    pub fn grip_hold(self) -> Option<GripHold> {
        match self {
            TransportMode::LongPoll => Some(GripHold::Response),
            TransportMode::Stream | TransportMode::Sse => Some(GripHold::Stream),
            TransportMode::WebSocket => None,
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `Grip-Hold` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GripHold {
    /// Deliver one published message, then close.
    Response,
    /// Keep the response open and append every published message.
    Stream,
}

impl GripHold {
    pub fn as_str(self) -> &'static str {
        match self {
            GripHold::Response => "response",
            GripHold::Stream => "stream",
        }
    }
}

/// Control headers for one response. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GripControl {
    content_type: String,
    hold: Option<GripHold>,
    channel: Option<String>,
    ws_extensions: Option<&'static str>,
}

impl GripControl {
    /// Hold instruction for long-poll / stream / SSE responses.
    pub fn hold(content_type: impl Into<String>, hold: GripHold, channel: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            hold: Some(hold),
            channel: Some(channel.into()),
            ws_extensions: None,
        }
    }

    /// Headers for a WebSocket-over-HTTP reply. `grip_extension` is set on
    /// replies that acknowledge an OPEN.
    pub fn websocket_events(grip_extension: bool) -> Self {
        Self {
            content_type: crate::protocol::ws_events::CONTENT_TYPE.to_string(),
            hold: None,
            channel: None,
            ws_extensions: grip_extension.then_some(GRIP_WS_EXTENSION),
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn grip_hold(&self) -> Option<GripHold> {
        self.hold
    }

    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    pub fn ws_extensions(&self) -> Option<&str> {
        self.ws_extensions
    }

    /// Header list in emission order.
    pub fn headers(&self) -> Vec<(&'static str, &str)> {
        let mut out = vec![(HEADER_CONTENT_TYPE, self.content_type.as_str())];
        if let Some(hold) = self.hold {
            out.push((HEADER_GRIP_HOLD, hold.as_str()));
        }
        if let Some(channel) = self.channel.as_deref() {
            out.push((HEADER_GRIP_CHANNEL, channel));
        }
        if let Some(ext) = self.ws_extensions {
            out.push((HEADER_WS_EXTENSIONS, ext));
        }
        out
    }
}

/// Control response handed back to the holding proxy.
#[derive(Debug, Clone)]
pub struct GripResponse {
    pub control: GripControl,
    pub body: Bytes,
    pub status: u16,
}

/// Build the hold response for `mode`. Always 200 with an empty body.
pub fn initiate(mode: TransportMode, content_type: &str, channel: &str) -> Result<GripResponse> {
    let hold = mode.grip_hold().ok_or_else(|| {
        GripError::Protocol(format!("{mode} sessions are not initiated with a hold response"))
    })?;

    Ok(GripResponse {
        control: GripControl::hold(content_type, hold, channel),
        body: Bytes::new(),
        status: 200,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn long_poll_holds_single_response() {
        let resp = initiate(TransportMode::LongPoll, "text/plain", "test").unwrap();
        assert_eq!(resp.status, 200);
        assert!(resp.body.is_empty());
        assert_eq!(
            resp.control.headers(),
            vec![
                ("Content-Type", "text/plain"),
                ("Grip-Hold", "response"),
                ("Grip-Channel", "test"),
            ]
        );
    }

    #[test]
    fn stream_and_sse_hold_stream() {
        let stream = initiate(TransportMode::Stream, "text/plain", "test").unwrap();
        assert_eq!(stream.control.grip_hold(), Some(GripHold::Stream));
        assert_eq!(stream.control.content_type(), "text/plain");

        let sse = initiate(TransportMode::Sse, TransportMode::Sse.content_type(), "test").unwrap();
        assert_eq!(sse.control.grip_hold(), Some(GripHold::Stream));
        assert_eq!(sse.control.content_type(), "text/event-stream");
        assert_eq!(sse.control.channel(), Some("test"));
        assert_eq!(sse.control.ws_extensions(), None);
    }

    #[test]
    fn websocket_has_no_hold_recipe() {
        let err = initiate(TransportMode::WebSocket, "text/plain", "test").unwrap_err();
        assert_eq!(err.client_code().http_status(), 400);
    }

    #[test]
    fn segments_round_trip() {
        for mode in [
            TransportMode::LongPoll,
            TransportMode::Stream,
            TransportMode::Sse,
            TransportMode::WebSocket,
        ] {
            assert_eq!(TransportMode::from_segment(mode.as_str()), Some(mode));
        }
        assert_eq!(TransportMode::from_segment("poll"), None);
    }
}

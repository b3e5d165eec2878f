//! WebSocket-over-HTTP session replies.
//!
//! The holding proxy delivers client WebSocket traffic as a batch of events in
//! a POST body. Replies:
//! - OPEN  -> `OPEN` acknowledgement + subscribe command for the channel,
//!   with the `grip` extension header so the proxy honours control messages.
//! - TEXT  -> echo as `You said: <payload>\n`.
//!
//! Every OPEN and TEXT event of the batch is answered, in order. Other GRIP
//! events following the leading one are skipped.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{GripError, Result};
use crate::protocol::grip::GripControl;
use crate::protocol::ws_events::{self, EventKind, WsEvent};

const ECHO_PREFIX: &[u8] = b"You said: ";

/// Reply to one WebSocket-over-HTTP request.
#[derive(Debug, Clone)]
pub struct WsReply {
    pub control: GripControl,
    pub body: Bytes,
    /// Events answered, in order (for logging/metrics).
    pub events: Vec<EventKind>,
}

/// Reject anything not sent as `application/websocket-events` (exact match).
pub fn check_content_type(content_type: Option<&str>) -> Result<()> {
    if content_type != Some(ws_events::CONTENT_TYPE) {
        return Err(GripError::Protocol("Not a WebSocket-over-HTTP request.".into()));
    }
    Ok(())
}

/// Handle one WebSocket-over-HTTP request body for `channel`.
pub fn handle_ws_events(content_type: Option<&str>, body: &[u8], channel: &str) -> Result<WsReply> {
    check_content_type(content_type)?;

    if ws_events::decode_event_kind(body) == EventKind::Unknown {
        return Err(GripError::Protocol("unrecognized websocket event".into()));
    }

    let events = ws_events::decode_events(body)?;

    let mut out = BytesMut::new();
    let mut opened = false;
    let mut kinds = Vec::with_capacity(events.len());

    for event in events {
        match event {
            WsEvent::Open => {
                opened = true;
                kinds.push(EventKind::Open);
                out.put(ws_events::encode_open());
                out.put(ws_events::encode_subscribe(channel));
            }
            WsEvent::Text(payload) => {
                kinds.push(EventKind::Text);
                out.put(ws_events::encode_text(&echo(&payload)));
            }
        }
    }

    Ok(WsReply {
        control: GripControl::websocket_events(opened),
        body: out.freeze(),
        events: kinds,
    })
}

fn echo(payload: &[u8]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(ECHO_PREFIX.len() + payload.len() + 1);
    msg.extend_from_slice(ECHO_PREFIX);
    msg.extend_from_slice(payload);
    msg.push(b'\n');
    msg
}

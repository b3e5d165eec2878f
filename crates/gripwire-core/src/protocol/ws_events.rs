//! WebSocket-over-HTTP event framing (panic-free).
//!
//! Wire format, one event per line group:
//!
//! ```text
//! EVENTNAME[ HEXLEN]\r\n[PAYLOAD\r\n]
//! ```
//!
//! Only `OPEN` (no length, no payload) and `TEXT` (hex length + payload) are
//! answered. The other GRIP events (`BINARY`, `CLOSE`, `PING`, `PONG`,
//! `DISCONNECT`) are parsed and skipped when they follow a leading event.
//! Parsing rules:
//! - Never index raw buffers; use `strip_prefix` / `get` and surface
//!   `GripError` when bytes run out.
//! - The declared TEXT length must match the payload exactly.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{GripError, Result};

/// Content type of every WebSocket-over-HTTP request and reply body.
pub const CONTENT_TYPE: &str = "application/websocket-events";

const OPEN_LINE: &[u8] = b"OPEN\r\n";
const TEXT_PREFIX: &[u8] = b"TEXT ";
const CRLF: &[u8] = b"\r\n";

/// Events the proxy may batch after the leading one; parsed, never answered.
const SKIPPED_EVENTS: [&[u8]; 5] = [b"BINARY", b"CLOSE", b"PING", b"PONG", b"DISCONNECT"];

/// Longest accepted hex length field (covers any payload a body limit admits).
const MAX_LEN_DIGITS: usize = 8;

/// Classification of the leading event in a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Open,
    Text,
    Unknown,
}

/// A fully parsed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsEvent {
    /// Connection established.
    Open,
    /// Text message payload (raw bytes, not re-validated as UTF-8).
    Text(Bytes),
}

/// `OPEN\r\n`
pub fn encode_open() -> Bytes {
    Bytes::from_static(OPEN_LINE)
}

/// Encode a TEXT event.
///
/// The length is lowercase hex padded to two digits, so every payload up to
/// 255 bytes gets exactly two. Longer payloads widen the field rather than
/// truncating it.
pub fn encode_text(message: &[u8]) -> Bytes {
    let len_hex = format!("{:02x}", message.len());
    let mut out =
        BytesMut::with_capacity(TEXT_PREFIX.len() + len_hex.len() + message.len() + 2 * CRLF.len());
    out.put_slice(TEXT_PREFIX);
    out.put_slice(len_hex.as_bytes());
    out.put_slice(CRLF);
    out.put_slice(message);
    out.put_slice(CRLF);
    out.freeze()
}

/// Encode a GRIP control message subscribing the connection to `channel`.
///
/// Payload: `c:{"type":"subscribe","channel":"<channel>"}`. The channel is
/// JSON-escaped; key order is fixed.
pub fn encode_subscribe(channel: &str) -> Bytes {
    // Value's Display is infallible and yields a quoted, escaped JSON string.
    let channel_json = serde_json::Value::from(channel).to_string();
    let payload = format!(r#"c:{{"type":"subscribe","channel":{channel_json}}}"#);
    encode_text(payload.as_bytes())
}

/// Classify the leading event without reading past the buffer.
pub fn decode_event_kind(body: &[u8]) -> EventKind {
    if body.starts_with(OPEN_LINE) {
        EventKind::Open
    } else if body.starts_with(TEXT_PREFIX) {
        EventKind::Text
    } else {
        EventKind::Unknown
    }
}

/// Return the payload of the TEXT event at the start of `body`.
pub fn decode_text_payload(body: &[u8]) -> Result<Bytes> {
    let (payload, _rest) = split_text_event(body)?;
    Ok(Bytes::copy_from_slice(payload))
}

/// Parse the OPEN and TEXT events of a batched body, in order.
///
/// An empty body is an empty batch. Known GRIP events other than OPEN/TEXT
/// are skipped. Decoding stops at the first unrecognised event name; the
/// caller decides whether a leading unknown event is an error.
pub fn decode_events(body: &[u8]) -> Result<Vec<WsEvent>> {
    let mut events = Vec::new();
    let mut rest = body;

    while !rest.is_empty() {
        match decode_event_kind(rest) {
            EventKind::Open => {
                events.push(WsEvent::Open);
                rest = rest.get(OPEN_LINE.len()..).unwrap_or_default();
            }
            EventKind::Text => {
                let (payload, tail) = split_text_event(rest)?;
                events.push(WsEvent::Text(Bytes::copy_from_slice(payload)));
                rest = tail;
            }
            EventKind::Unknown => {
                let offset = body.len() - rest.len();
                let (name, tail) = split_any_event(rest)?;
                if !SKIPPED_EVENTS.contains(&name) {
                    tracing::debug!(offset, "unrecognized websocket event, ignoring rest of batch");
                    break;
                }
                tracing::trace!(offset, event = %String::from_utf8_lossy(name), "skipping websocket event");
                rest = tail;
            }
        }
    }

    Ok(events)
}

/// Split `NAME[ HEXLEN]\r\n[payload\r\n]...` into (name, remaining bytes).
fn split_any_event(body: &[u8]) -> Result<(&[u8], &[u8])> {
    let line_end = find_crlf(body).ok_or_else(|| frame_error("event line not terminated".into()))?;
    let header = body.get(..line_end).unwrap_or_default();
    let after_header = body.get(line_end + CRLF.len()..).unwrap_or_default();

    let Some(space) = header.iter().position(|&b| b == b' ') else {
        return Ok((header, after_header));
    };
    let name = header.get(..space).unwrap_or_default();
    let declared = parse_hex_len(header.get(space + 1..).unwrap_or_default())?;

    let tail = after_header
        .get(declared..)
        .and_then(|t| t.strip_prefix(CRLF))
        .ok_or_else(|| frame_error("payload does not match declared length".into()))?;

    Ok((name, tail))
}

/// Split `TEXT <hex>\r\n<payload>\r\n...` into (payload, remaining bytes).
fn split_text_event(body: &[u8]) -> Result<(&[u8], &[u8])> {
    let rest = body
        .strip_prefix(TEXT_PREFIX)
        .ok_or_else(|| frame_error("missing TEXT prefix".into()))?;

    let line_end = find_crlf(rest).ok_or_else(|| frame_error("length line not terminated".into()))?;
    let len_field = rest.get(..line_end).unwrap_or_default();
    let declared = parse_hex_len(len_field)?;

    let after_header = rest.get(line_end + CRLF.len()..).unwrap_or_default();
    let payload = after_header.get(..declared).ok_or_else(|| {
        frame_error(format!(
            "declared {declared} payload bytes, only {} present",
            after_header.len()
        ))
    })?;

    let tail = after_header
        .get(declared..)
        .and_then(|t| t.strip_prefix(CRLF))
        .ok_or_else(|| frame_error("payload does not match declared length".into()))?;

    Ok((payload, tail))
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(CRLF.len()).position(|w| w == CRLF)
}

fn parse_hex_len(field: &[u8]) -> Result<usize> {
    if field.is_empty() || field.len() > MAX_LEN_DIGITS || !field.iter().all(u8::is_ascii_hexdigit) {
        return Err(frame_error("invalid length field".into()));
    }
    let digits = std::str::from_utf8(field).map_err(|_| frame_error("invalid length field".into()))?;
    usize::from_str_radix(digits, 16).map_err(|e| frame_error(format!("invalid length field: {e}")))
}

fn frame_error(reason: String) -> GripError {
    tracing::debug!(%reason, "rejecting websocket-events frame");
    GripError::Frame(reason)
}

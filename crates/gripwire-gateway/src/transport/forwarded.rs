//! `X-Forwarded-*` headers.
//!
//! `X-Forwarded-For` carries the peer address of the current connection;
//! `X-Forwarded-Proto: https` is added only when the inbound scheme is https.

use std::net::SocketAddr;

use axum::http::{HeaderMap, HeaderValue, Uri};

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Inbound scheme: from an absolute-form URI, otherwise the configured default.
pub fn inbound_scheme<'a>(uri: &'a Uri, default_scheme: &'a str) -> &'a str {
    uri.scheme_str().unwrap_or(default_scheme)
}

/// Overwrite forwarding headers on `headers`.
pub fn apply(headers: &mut HeaderMap, remote: SocketAddr, scheme: &str) {
    // An IpAddr always renders as a valid header value.
    if let Ok(v) = HeaderValue::from_str(&remote.ip().to_string()) {
        headers.insert(X_FORWARDED_FOR, v);
    }
    if scheme.eq_ignore_ascii_case("https") {
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("https"));
    }
}

//! Hand-off to the holding proxy tier.
//!
//! A hand-off gives up handling of the current request: the request is
//! passed to a named downstream (`self` or `origin`) and whatever that
//! downstream answers becomes our response. The holding proxy addresses are
//! configured per label.
//!
//! Hop-by-hop headers are dropped in both directions. A client upgrade
//! request (`Connection: upgrade`) keeps its upgrade headers; when the
//! upstream answers `101` the two upgraded connections are bridged byte for
//! byte until either side closes.

use std::net::SocketAddr;
use std::str::FromStr;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{
        header::{
            CONNECTION, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE, TRAILER, TRANSFER_ENCODING,
            UPGRADE,
        },
        uri::{Authority, PathAndQuery, Scheme},
        HeaderMap, HeaderName, HeaderValue, Request, StatusCode, Uri,
    },
    response::Response,
};
use hyper::upgrade::OnUpgrade;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioIo},
};

use gripwire_core::error::{GripError, Result};
use gripwire_core::routing::HandoffTarget;

use crate::config::HandoffSection;

const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");

const HOP_BY_HOP: [HeaderName; 8] = [
    CONNECTION,
    KEEP_ALIVE,
    PROXY_AUTHENTICATE,
    PROXY_AUTHORIZATION,
    TE,
    TRAILER,
    TRANSFER_ENCODING,
    UPGRADE,
];

/// Transfers a request to a named downstream target.
#[async_trait]
pub trait Handoff: Send + Sync {
    async fn handoff(&self, target: HandoffTarget, req: Request<Body>) -> Result<Response>;
}

/// Forwards handed-off requests over HTTP/1.1 to the configured proxy address.
pub struct UpstreamHandoff {
    client: Client<HttpConnector, Body>,
    self_upstream: SocketAddr,
    origin_upstream: SocketAddr,
}

impl UpstreamHandoff {
    pub fn from_config(cfg: &HandoffSection) -> Result<Self> {
        let self_upstream = parse_upstream("handoff.self_upstream", &cfg.self_upstream)?;
        let origin_upstream = parse_upstream("handoff.origin_upstream", &cfg.origin_upstream)?;
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self {
            client,
            self_upstream,
            origin_upstream,
        })
    }

    pub fn upstream(&self, target: HandoffTarget) -> SocketAddr {
        match target {
            HandoffTarget::SelfService => self.self_upstream,
            HandoffTarget::Origin => self.origin_upstream,
        }
    }
}

#[async_trait]
impl Handoff for UpstreamHandoff {
    async fn handoff(&self, target: HandoffTarget, mut req: Request<Body>) -> Result<Response> {
        let upstream = self.upstream(target);
        let client_upgrade = is_upgrade(req.headers()).then(|| hyper::upgrade::on(&mut req));

        let (mut parts, body) = req.into_parts();
        parts.uri = upstream_uri(&parts.uri, upstream)?;
        strip_hop_by_hop(&mut parts.headers, client_upgrade.is_some());

        tracing::debug!(
            %target,
            %upstream,
            uri = %parts.uri,
            upgrade = client_upgrade.is_some(),
            "handing off request"
        );

        let mut resp = self
            .client
            .request(Request::from_parts(parts, body))
            .await
            .map_err(|e| GripError::Upstream(format!("{target} via {upstream}: {e}")))?;

        let switched = resp.status() == StatusCode::SWITCHING_PROTOCOLS;
        match (switched, client_upgrade) {
            (true, Some(client_upgrade)) => {
                let upstream_upgrade = hyper::upgrade::on(&mut resp);
                tokio::spawn(bridge(target, client_upgrade, upstream_upgrade));
            }
            (true, None) => {
                return Err(GripError::Upstream(format!(
                    "{target} via {upstream}: switched protocols without an upgrade request"
                )));
            }
            (false, _) => {}
        }

        let (mut parts, body) = resp.into_parts();
        strip_hop_by_hop(&mut parts.headers, switched);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

/// Copy bytes between the upgraded client and upstream connections.
async fn bridge(target: HandoffTarget, client: OnUpgrade, upstream: OnUpgrade) {
    let (client, upstream) = match tokio::try_join!(client, upstream) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(%target, error = %e, "upgrade bridge not established");
            return;
        }
    };

    let mut client = TokioIo::new(client);
    let mut upstream = TokioIo::new(upstream);
    match tokio::io::copy_bidirectional(&mut client, &mut upstream).await {
        Ok((sent, received)) => {
            tracing::debug!(%target, sent, received, "upgrade bridge closed");
        }
        Err(e) => {
            tracing::debug!(%target, error = %e, "upgrade bridge ended with error");
        }
    }
}

/// `Upgrade` present and `upgrade` listed among the `Connection` tokens.
fn is_upgrade(headers: &HeaderMap) -> bool {
    headers.contains_key(UPGRADE)
        && connection_tokens(headers).any(|t| t.eq_ignore_ascii_case("upgrade"))
}

fn connection_tokens(headers: &HeaderMap) -> impl Iterator<Item = &str> {
    headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Remove hop-by-hop headers, including any named by `Connection`.
///
/// With `keep_upgrade` the result carries `Connection: upgrade` plus the
/// original `Upgrade` header.
fn strip_hop_by_hop(headers: &mut HeaderMap, keep_upgrade: bool) {
    let named: Vec<HeaderName> = connection_tokens(headers)
        .filter_map(|t| HeaderName::from_bytes(t.as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        if keep_upgrade && *name == UPGRADE {
            continue;
        }
        headers.remove(name);
    }

    if keep_upgrade {
        headers.insert(CONNECTION, HeaderValue::from_static("upgrade"));
    }
}

/// Rewrite scheme/authority to the upstream, keeping path and query.
fn upstream_uri(original: &Uri, upstream: SocketAddr) -> Result<Uri> {
    let authority = Authority::from_str(&upstream.to_string())
        .map_err(|e| GripError::Internal(format!("upstream authority: {e}")))?;

    let mut uri_parts = original.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(authority);
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }

    Uri::from_parts(uri_parts).map_err(|e| GripError::Internal(format!("upstream uri: {e}")))
}

fn parse_upstream(field: &str, value: &str) -> Result<SocketAddr> {
    value
        .parse()
        .map_err(|_| GripError::Config(format!("{field} must be a valid SocketAddr")))
}

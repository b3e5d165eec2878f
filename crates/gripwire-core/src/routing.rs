//! Per-request routing decision.
//!
//! Test traffic on the edge domain is routed through the holding proxy first;
//! when the proxy re-issues it (signal header present) it is served here.
//! Everything else is handed off to the origin via the proxy.
//!
//! # Design Decisions
//! - Host matching is case-insensitive and ignores a `:port` suffix
//! - Path matching is case-sensitive
//! - Pure: the caller performs the hand-off or dispatch

use std::fmt;

use crate::protocol::grip::TransportMode;

/// Where a request goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingTarget {
    /// Serve a test endpoint directly. `None` is an unknown test sub-path (404).
    ServeTest(Option<TransportMode>),
    /// Route through the holding proxy, which calls this service back.
    HandoffSelf,
    /// Route through the holding proxy to the origin.
    HandoffOrigin,
}

impl RoutingTarget {
    /// Stable label for logs/metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            RoutingTarget::ServeTest(_) => "serve-test",
            RoutingTarget::HandoffSelf => "handoff-self",
            RoutingTarget::HandoffOrigin => "handoff-origin",
        }
    }
}

/// Named downstream a request is handed off to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandoffTarget {
    SelfService,
    Origin,
}

impl HandoffTarget {
    pub fn label(self) -> &'static str {
        match self {
            HandoffTarget::SelfService => "self",
            HandoffTarget::Origin => "origin",
        }
    }
}

impl fmt::Display for HandoffTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Compiled routing rules. Immutable after construction.
#[derive(Debug, Clone)]
pub struct RoutingRules {
    edge_domain_suffix: String,
    test_path_prefix: String,
}

impl RoutingRules {
    /// `edge_domain_suffix` is normalized to lowercase.
    pub fn new(edge_domain_suffix: impl Into<String>, test_path_prefix: impl Into<String>) -> Self {
        Self {
            edge_domain_suffix: edge_domain_suffix.into().to_ascii_lowercase(),
            test_path_prefix: test_path_prefix.into(),
        }
    }

    pub fn route(&self, host: &str, path: &str, has_proxy_signal: bool) -> RoutingTarget {
        let host = strip_port(host).to_ascii_lowercase();

        if !host.ends_with(&self.edge_domain_suffix) {
            return RoutingTarget::HandoffOrigin;
        }
        let Some(sub_path) = path.strip_prefix(self.test_path_prefix.as_str()) else {
            return RoutingTarget::HandoffOrigin;
        };

        if has_proxy_signal {
            RoutingTarget::ServeTest(TransportMode::from_segment(sub_path))
        } else {
            RoutingTarget::HandoffSelf
        }
    }
}

impl Default for RoutingRules {
    fn default() -> Self {
        Self::new(".edgecompute.app", "/test/")
    }
}

/// `example.com:443` -> `example.com`; bracketed IPv6 literals keep their colons.
fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port))
            if !port.is_empty()
                && port.bytes().all(|b| b.is_ascii_digit())
                && (!name.contains(':') || name.ends_with(']')) =>
        {
            name
        }
        _ => host,
    }
}

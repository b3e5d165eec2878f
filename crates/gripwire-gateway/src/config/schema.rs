use std::net::SocketAddr;

use serde::Deserialize;
use gripwire_core::error::{GripError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub ops: OpsSection,

    #[serde(default)]
    pub routing: RoutingSection,

    pub handoff: HandoffSection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(GripError::UnsupportedVersion);
        }

        self.gateway.validate()?;
        self.ops.validate()?;
        self.routing.validate()?;
        self.handoff.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Scheme assumed when the request URI does not carry one.
    #[serde(default = "default_scheme")]
    pub default_scheme: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_body_bytes: default_max_body_bytes(),
            default_scheme: default_scheme(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        parse_addr("gateway.listen", &self.listen)?;
        if !(1..=16 * 1024 * 1024).contains(&self.max_body_bytes) {
            return Err(GripError::Config(
                "gateway.max_body_bytes must be between 1 and 16777216".into(),
            ));
        }
        if !matches!(self.default_scheme.to_ascii_lowercase().as_str(), "http" | "https") {
            return Err(GripError::Config(
                "gateway.default_scheme must be http or https".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        parse_addr("gateway.listen", &self.listen)
    }
}

/// Operational listener (`/healthz`, `/metrics`). Disabled when `listen` is unset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpsSection {
    #[serde(default)]
    pub listen: Option<String>,
}

impl OpsSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<Option<SocketAddr>> {
        self.listen
            .as_deref()
            .map(|s| parse_addr("ops.listen", s))
            .transpose()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingSection {
    #[serde(default = "default_edge_domain_suffix")]
    pub edge_domain_suffix: String,

    #[serde(default = "default_test_path_prefix")]
    pub test_path_prefix: String,

    /// Header whose presence marks a request re-issued by the holding proxy.
    #[serde(default = "default_signal_header")]
    pub signal_header: String,

    #[serde(default = "default_test_channel")]
    pub test_channel: String,
}

impl Default for RoutingSection {
    fn default() -> Self {
        Self {
            edge_domain_suffix: default_edge_domain_suffix(),
            test_path_prefix: default_test_path_prefix(),
            signal_header: default_signal_header(),
            test_channel: default_test_channel(),
        }
    }
}

impl RoutingSection {
    pub fn validate(&self) -> Result<()> {
        if self.edge_domain_suffix.is_empty() {
            return Err(GripError::Config("routing.edge_domain_suffix must not be empty".into()));
        }
        if !self.test_path_prefix.starts_with('/') {
            return Err(GripError::Config("routing.test_path_prefix must start with '/'".into()));
        }
        if self.signal_header.is_empty()
            || !self.signal_header.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        {
            return Err(GripError::Config("routing.signal_header must be a valid header name".into()));
        }
        // The channel is sent back verbatim in Grip-Channel.
        if self.test_channel.is_empty()
            || self.test_channel.bytes().any(|b| b.is_ascii_control())
        {
            return Err(GripError::Config(
                "routing.test_channel must be non-empty and free of control characters".into(),
            ));
        }
        Ok(())
    }
}

/// Upstream address of the holding proxy, per hand-off label.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandoffSection {
    /// Target for `self`: the proxy calls this service back with the signal header.
    pub self_upstream: String,
    /// Target for `origin`: the proxy forwards to the real origin.
    pub origin_upstream: String,
}

impl HandoffSection {
    pub fn validate(&self) -> Result<()> {
        parse_addr("handoff.self_upstream", &self.self_upstream)?;
        parse_addr("handoff.origin_upstream", &self.origin_upstream)?;
        Ok(())
    }
}

fn parse_addr(field: &str, value: &str) -> Result<SocketAddr> {
    value
        .parse()
        .map_err(|_| GripError::Config(format!("{field} must be a valid SocketAddr")))
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_max_body_bytes() -> usize {
    64 * 1024
}
fn default_scheme() -> String {
    "http".into()
}
fn default_edge_domain_suffix() -> String {
    ".edgecompute.app".into()
}
fn default_test_path_prefix() -> String {
    "/test/".into()
}
fn default_signal_header() -> String {
    "Grip-Sig".into()
}
fn default_test_channel() -> String {
    "test".into()
}

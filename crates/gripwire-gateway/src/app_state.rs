//! Shared application state for the gripwire gateway.
//!
//! Composition root: compiles routing rules from config, owns the metrics
//! registry and the hand-off collaborator. Everything here is immutable
//! after construction apart from atomic metric counters.

use std::sync::Arc;

use gripwire_core::error::Result;
use gripwire_core::routing::RoutingRules;

use crate::config::GatewayConfig;
use crate::obs::GatewayMetrics;
use crate::transport::{Handoff, UpstreamHandoff};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    handoff: Arc<dyn Handoff>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    rules: RoutingRules,
    metrics: GatewayMetrics,
}

impl AppState {
    /// Build application state around an explicit hand-off implementation.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: GatewayConfig, handoff: Arc<dyn Handoff>) -> Result<Self> {
        cfg.validate()?;

        let rules = RoutingRules::new(
            cfg.routing.edge_domain_suffix.clone(),
            cfg.routing.test_path_prefix.clone(),
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                rules,
                metrics: GatewayMetrics::default(),
            }),
            handoff,
        })
    }

    /// Production wiring: hand-offs go to the configured upstreams.
    pub fn from_config(cfg: GatewayConfig) -> Result<Self> {
        let handoff = UpstreamHandoff::from_config(&cfg.handoff)?;
        Self::new(cfg, Arc::new(handoff))
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn rules(&self) -> &RoutingRules {
        &self.inner.rules
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.inner.metrics
    }

    pub fn handoff(&self) -> Arc<dyn Handoff> {
        Arc::clone(&self.handoff)
    }
}

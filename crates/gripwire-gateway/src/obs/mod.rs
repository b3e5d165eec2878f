//! Observability helpers (metrics registry).

pub mod metrics;

pub use metrics::GatewayMetrics;

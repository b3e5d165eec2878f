//! gripwire gateway
//!
//! - Loads strict YAML config (first CLI argument, default `gripwire.yaml`)
//! - Serves the GRIP test endpoints and hands everything else to the holding proxy
//! - Optional ops listener for `/healthz` and `/metrics`

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

use gripwire_gateway::{app_state, config, router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        service_version = %std::env::var("SERVICE_VERSION").unwrap_or_default(),
        "gripwire-gateway starting"
    );

    let path = std::env::args().nth(1).unwrap_or_else(|| "gripwire.yaml".to_string());
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.gateway.listen_addr()?;
    let ops_listen = cfg.ops.listen_addr()?;

    let state = app_state::AppState::from_config(cfg)?;

    if let Some(addr) = ops_listen {
        let ops = router::build_ops_router(state.clone());
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "ops listener starting");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, ops).await {
                tracing::error!(error = %e, "ops listener failed");
            }
        });
    }

    let app = router::build_router(state);
    let listener = TcpListener::bind(listen).await?;
    tracing::info!(%listen, config = %path, "gripwire-gateway listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

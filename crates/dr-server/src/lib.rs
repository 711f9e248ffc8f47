//! dr-server: HTTP front end for dwgrelay conversion jobs.
//!
//! - Axum router with CORS, request tracing, and request IDs
//! - `POST /api/dwg2dxf` upload endpoint backed by [`dr_convert::JobRunner`]
//! - Graceful shutdown via signal handling

pub mod context;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;

use std::net::SocketAddr;

use dr_core::config::Config;

use crate::context::AppContext;

/// Start the dwgrelay server.
///
/// Validates the configuration, reports converter availability, and serves
/// HTTP until a shutdown signal arrives.
pub async fn start(config: Config) -> dr_core::Result<()> {
    config.validate()?;
    for warning in config.warnings() {
        tracing::warn!("Config warning: {warning}");
    }

    let info = dr_convert::check_converter(&config.converter).await;
    if info.available {
        tracing::info!(
            "Tool found: {} ({})",
            info.name,
            info.version.as_deref().unwrap_or("unknown version")
        );
    } else {
        tracing::warn!(
            "Tool not found: {}; conversions will fail until it is installed",
            info.name
        );
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| dr_core::Error::Internal(format!("Invalid server address: {e}")))?;

    tracing::info!(
        "Accepting up to {} concurrent conversions (timeout {}s)",
        config.jobs.max_concurrent,
        config.converter.timeout_secs
    );

    let ctx = AppContext::from_config(config, info);
    let app = router::build_router(ctx);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| dr_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Starting server on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}

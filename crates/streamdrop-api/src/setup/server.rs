//! Server startup and graceful shutdown

use crate::setup::App;
use anyhow::Result;
use streamdrop_core::Config;

/// Serve until Ctrl+C or SIGTERM, then stop background tasks and purge storage.
pub async fn start_server(config: &Config, app: App) -> Result<()> {
    let addr = format!("{}:{}", config.host(), config.server_port());
    tracing::info!(addr = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        base_url = %config.base_url(),
        max_ingest_mb = config.max_ingest_size_bytes() / 1024 / 1024,
        "Server ready and accepting connections"
    );

    let App {
        state,
        router,
        background,
    } = app;

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    background.shutdown().await;

    match state.registry.purge_all().await {
        Ok(removed) => tracing::info!(entries = removed, "Storage purged on shutdown"),
        Err(e) => tracing::error!(error = %e, "Failed to purge storage on shutdown"),
    }

    streamdrop_infra::shutdown_telemetry().await;

    served?;
    Ok(())
}

/// Signal handler for graceful shutdown
///
/// Listens for Ctrl+C (SIGINT) and SIGTERM. If a handler cannot be installed, that
/// signal source is ignored and the other one still triggers shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!("Shutting down gracefully...");
}

//! Application setup and initialization

pub mod routes;
pub mod server;
pub mod services;

use crate::constants::{SERVICE_NAME, SERVICE_VERSION};
use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use streamdrop_core::Config;
use streamdrop_infra::LogFormat;

pub use services::BackgroundTasks;

/// Everything `start_server` needs: shared state, the router and the running
/// background tasks to stop at shutdown.
pub struct App {
    pub state: Arc<AppState>,
    pub router: axum::Router,
    pub background: BackgroundTasks,
}

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<App> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    streamdrop_infra::init_telemetry(
        SERVICE_NAME,
        SERVICE_VERSION,
        config.environment(),
        LogFormat::for_environment(config.is_production()),
    )
    .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        storage_dir = %config.storage_dir().display(),
        base_url = %config.base_url(),
        expiry_secs = config.expiry().as_secs(),
        sweep_interval_secs = config.sweep_interval().as_secs(),
        "Configuration loaded and validated successfully"
    );

    let state = services::initialize_services(&config).await?;
    let background = services::start_background_tasks(&config, &state);
    let router = routes::setup_routes(&config, state.clone());

    Ok(App {
        state,
        router,
        background,
    })
}

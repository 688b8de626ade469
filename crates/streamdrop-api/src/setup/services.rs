//! Service construction and background tasks

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use streamdrop_core::{Config, LinkBuilder};
use streamdrop_services::{ContentRegistry, IngestLimits, IngestService, IngestionGate, SweepService};
use streamdrop_storage::{LocalStorage, Storage};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Build storage, registry and ingestion, starting from an empty storage directory.
///
/// Links do not survive a restart, so files left by a previous run are removed.
pub async fn initialize_services(config: &Config) -> Result<Arc<AppState>> {
    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(config.storage_dir())
            .await
            .context("Failed to initialize local storage")?,
    );

    let registry = Arc::new(ContentRegistry::new(storage.clone()));
    registry
        .purge_all()
        .await
        .context("Failed to clear files from a previous run")?;

    let links = LinkBuilder::new(config.base_url());
    let ingest = Arc::new(
        IngestService::new(
            registry.clone(),
            IngestionGate::new(),
            links.clone(),
            config.expiry(),
            IngestLimits::from_config(config),
        )
        .context("Failed to initialize ingestion")?,
    );

    tracing::info!(
        root = %storage.root().display(),
        max_ingest_mb = config.max_ingest_size_bytes() / 1024 / 1024,
        allow_private_urls = config.allow_private_urls(),
        "Services initialized"
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        registry,
        ingest,
        storage,
        links,
    }))
}

/// Handle to the tasks that run beside the HTTP server.
pub struct BackgroundTasks {
    shutdown: CancellationToken,
    sweep: JoinHandle<()>,
}

impl BackgroundTasks {
    /// Signal every task to stop and wait for them.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.sweep.await {
            tracing::error!(error = %e, "Expiry sweep task ended abnormally");
        }
    }
}

pub fn start_background_tasks(config: &Config, state: &Arc<AppState>) -> BackgroundTasks {
    let shutdown = CancellationToken::new();
    let sweep_service = Arc::new(SweepService::new(
        state.registry.clone(),
        config.expiry(),
        config.sweep_interval(),
    ));
    let sweep = sweep_service.start(shutdown.child_token());

    BackgroundTasks { shutdown, sweep }
}

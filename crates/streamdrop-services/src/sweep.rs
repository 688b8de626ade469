use crate::registry::{ContentRegistry, SweepReport};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Periodically evicts expired registry entries and their files.
#[derive(Clone)]
pub struct SweepService {
    registry: Arc<ContentRegistry>,
    ttl: Duration,
    interval: Duration,
}

impl SweepService {
    pub fn new(registry: Arc<ContentRegistry>, ttl: Duration, interval: Duration) -> Self {
        Self {
            registry,
            ttl,
            interval,
        }
    }

    /// Start the background sweep task. The first sweep runs one interval after start.
    ///
    /// The task exits when `shutdown` is cancelled. A sweep that is already running
    /// finishes before the task exits.
    pub fn start(self: Arc<Self>, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval_at(Instant::now() + self.interval, self.interval);
            sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!(
                interval_secs = self.interval.as_secs(),
                ttl_secs = self.ttl.as_secs(),
                "Expiry sweep started"
            );

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::info!("Expiry sweep stopped");
                        break;
                    }
                    _ = sweep_interval.tick() => {
                        self.run_once().await;
                    }
                }
            }
        })
    }

    /// Run a single sweep against the current time.
    #[tracing::instrument(skip(self), fields(cleanup.operation = "expire_all"))]
    pub async fn run_once(&self) -> SweepReport {
        let report = self.registry.sweep(self.ttl, Utc::now()).await;

        if report.expired > 0 {
            tracing::info!(
                expired = report.expired,
                files_deleted = report.files_deleted,
                files_missing = report.files_missing,
                delete_failures = report.delete_failures,
                "Sweep completed"
            );
        } else {
            tracing::debug!("Sweep completed, nothing expired");
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::pin::Pin;
    use streamdrop_storage::{LocalStorage, Storage};
    use tempfile::tempdir;
    use tokio::io::AsyncRead;

    async fn registry_with_file(
        root: &std::path::Path,
    ) -> (Arc<ContentRegistry>, PathBuf, streamdrop_core::Token) {
        let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new(root).await.unwrap());
        let registry = Arc::new(ContentRegistry::new(storage.clone()));

        let path = storage.allocate_path("mp4");
        let reader: Pin<Box<dyn AsyncRead + Send + Unpin>> =
            Box::pin(std::io::Cursor::new(b"frames".to_vec()));
        storage.write_stream(&path, reader, 1024).await.unwrap();
        let token = registry.register("7", path.clone(), "video/mp4").await;

        (registry, path, token)
    }

    #[tokio::test]
    async fn test_run_once_evicts_with_zero_ttl() {
        let dir = tempdir().unwrap();
        let (registry, path, token) = registry_with_file(dir.path()).await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        let service = SweepService::new(registry.clone(), Duration::ZERO, Duration::from_secs(60));
        let report = service.run_once().await;

        assert_eq!(report.expired, 1);
        assert!(registry.resolve(&token).await.is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_run_once_keeps_fresh_entries() {
        let dir = tempdir().unwrap();
        let (registry, path, token) = registry_with_file(dir.path()).await;

        let service = SweepService::new(
            registry.clone(),
            Duration::from_secs(3600),
            Duration::from_secs(60),
        );
        let report = service.run_once().await;

        assert_eq!(report.expired, 0);
        assert!(registry.resolve(&token).await.is_some());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_background_task_sweeps_and_stops_on_cancel() {
        let dir = tempdir().unwrap();
        let (registry, path, token) = registry_with_file(dir.path()).await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        let service = Arc::new(SweepService::new(
            registry.clone(),
            Duration::ZERO,
            Duration::from_millis(20),
        ));
        let shutdown = CancellationToken::new();
        let handle = service.start(shutdown.clone());

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while registry.resolve(&token).await.is_some() {
            assert!(std::time::Instant::now() < deadline, "sweep never ran");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!path.exists());

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}

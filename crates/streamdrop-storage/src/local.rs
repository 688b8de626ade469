use crate::file::MediaFile;
use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt};
use uuid::Uuid;

/// Local filesystem storage implementation
#[derive(Clone, Debug)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance, creating the root directory if needed
    ///
    /// # Arguments
    /// * `root` - Directory for file storage (e.g., "storage" or "/var/lib/streamdrop")
    pub async fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();

        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(LocalStorage { root })
    }

    /// Reject paths that could escape the storage root.
    fn ensure_within_root(&self, path: &Path) -> StorageResult<()> {
        if path
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            return Err(StorageError::InvalidPath(format!(
                "{} contains parent directory components",
                path.display()
            )));
        }

        if !path.starts_with(&self.root) || path == self.root {
            return Err(StorageError::InvalidPath(format!(
                "{} is outside the storage directory",
                path.display()
            )));
        }

        Ok(())
    }

    async fn remove_partial(path: &Path) {
        if let Err(e) = fs::remove_file(path).await {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "Failed to remove partially written file"
                );
            }
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    fn root(&self) -> &Path {
        &self.root
    }

    fn allocate_path(&self, extension: &str) -> PathBuf {
        let extension: String = extension
            .trim_start_matches('.')
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(8)
            .collect();

        let filename = if extension.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            format!("{}.{}", Uuid::new_v4(), extension.to_lowercase())
        };

        self.root.join(filename)
    }

    async fn write_stream(
        &self,
        path: &Path,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
        max_bytes: u64,
    ) -> StorageResult<u64> {
        self.ensure_within_root(path)?;
        let start = std::time::Instant::now();

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to create file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        // One byte past the limit is enough to know the source is too large.
        let mut limited = reader.take(max_bytes.saturating_add(1));

        let outcome = match tokio::io::copy(&mut limited, &mut file).await {
            Ok(written) if written > max_bytes => {
                Err(StorageError::SizeLimitExceeded { limit: max_bytes })
            }
            Ok(written) => file.sync_all().await.map(|_| written).map_err(|e| {
                StorageError::WriteFailed(format!("Failed to sync file {}: {}", path.display(), e))
            }),
            Err(e) => Err(StorageError::WriteFailed(format!(
                "Failed to write stream to file {}: {}",
                path.display(),
                e
            ))),
        };
        drop(file);

        match outcome {
            Ok(written) => {
                tracing::info!(
                    path = %path.display(),
                    size_bytes = written,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage stream write successful"
                );
                Ok(written)
            }
            Err(e) => {
                Self::remove_partial(path).await;
                Err(e)
            }
        }
    }

    async fn open(&self, path: &Path) -> StorageResult<MediaFile> {
        self.ensure_within_root(path)?;

        let file = match fs::File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(path.display().to_string()));
            }
            Err(e) => {
                return Err(StorageError::ReadFailed(format!(
                    "Failed to open file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let metadata = file.metadata().await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to stat file {}: {}", path.display(), e))
        })?;

        if !metadata.is_file() {
            return Err(StorageError::NotFound(path.display().to_string()));
        }

        Ok(MediaFile::new(file, metadata.len(), path.to_path_buf()))
    }

    async fn delete(&self, path: &Path) -> StorageResult<bool> {
        self.ensure_within_root(path)?;

        match fs::remove_file(path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Local storage delete successful");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn purge(&self) -> StorageResult<()> {
        match fs::remove_dir_all(&self.root).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(StorageError::DeleteFailed(format!(
                    "Failed to remove storage directory {}: {}",
                    self.root.display(),
                    e
                )));
            }
        }

        fs::create_dir_all(&self.root).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to recreate storage directory {}: {}",
                self.root.display(),
                e
            ))
        })?;

        tracing::info!(root = %self.root.display(), "Local storage purged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::collections::HashSet;
    use tempfile::tempdir;

    fn reader(data: Vec<u8>) -> Pin<Box<dyn AsyncRead + Send + Unpin>> {
        Box::pin(std::io::Cursor::new(data))
    }

    async fn collect(stream: crate::ByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        let mut stream = stream;
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_write_then_read_span() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();

        let path = storage.allocate_path("mp4");
        let written = storage
            .write_stream(&path, reader(data.clone()), 10_000)
            .await
            .unwrap();
        assert_eq!(written, 1000);

        let file = storage.open(&path).await.unwrap();
        assert_eq!(file.len(), 1000);
        let span = collect(file.into_stream(100, 50).await.unwrap()).await;
        assert_eq!(span, data[100..150].to_vec());

        let file = storage.open(&path).await.unwrap();
        let all = collect(file.into_stream(0, 1000).await.unwrap()).await;
        assert_eq!(all, data);
    }

    #[tokio::test]
    async fn test_allocated_paths_are_unique_and_inside_root() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let paths: HashSet<PathBuf> = (0..1000).map(|_| storage.allocate_path(".MP4")).collect();
        assert_eq!(paths.len(), 1000);
        for path in &paths {
            assert!(path.starts_with(dir.path()));
            assert_eq!(path.extension().and_then(|e| e.to_str()), Some("mp4"));
        }

        let odd = storage.allocate_path("../../x");
        assert_eq!(odd.parent(), Some(dir.path()));
        assert_eq!(odd.extension().and_then(|e| e.to_str()), Some("x"));
    }

    #[tokio::test]
    async fn test_size_limit_removes_partial_file() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let path = storage.allocate_path("mp4");
        let result = storage.write_stream(&path, reader(vec![7u8; 101]), 100).await;
        assert!(matches!(
            result,
            Err(StorageError::SizeLimitExceeded { limit: 100 })
        ));
        assert!(!path.exists());

        let exact = storage.allocate_path("mp4");
        assert_eq!(
            storage
                .write_stream(&exact, reader(vec![7u8; 100]), 100)
                .await
                .unwrap(),
            100
        );
    }

    #[tokio::test]
    async fn test_write_never_overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let path = storage.allocate_path("mp4");
        storage
            .write_stream(&path, reader(b"first".to_vec()), 100)
            .await
            .unwrap();
        let result = storage
            .write_stream(&path, reader(b"second".to_vec()), 100)
            .await;
        assert!(matches!(result, Err(StorageError::WriteFailed(_))));
        assert_eq!(std::fs::read(&path).unwrap(), b"first");
    }

    #[tokio::test]
    async fn test_delete_is_tolerant_of_missing_files() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let path = storage.allocate_path("mp4");
        storage
            .write_stream(&path, reader(b"data".to_vec()), 100)
            .await
            .unwrap();

        assert!(storage.delete(&path).await.unwrap());
        assert!(!storage.delete(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_paths_outside_root_rejected() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let result = storage.delete(Path::new("/etc/passwd")).await;
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));

        let escaped = dir.path().join("..").join("other.mp4");
        let result = storage.open(&escaped).await;
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));

        let result = storage.delete(dir.path()).await;
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));
    }

    #[tokio::test]
    async fn test_open_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let result = storage.open(&storage.allocate_path("mp4")).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_purge_empties_and_recreates_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("media");
        let storage = LocalStorage::new(&root).await.unwrap();

        for _ in 0..3 {
            let path = storage.allocate_path("mp4");
            storage
                .write_stream(&path, reader(b"x".to_vec()), 10)
                .await
                .unwrap();
        }

        storage.purge().await.unwrap();
        assert!(root.is_dir());
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);

        // Purging an already removed root is fine.
        std::fs::remove_dir_all(&root).unwrap();
        storage.purge().await.unwrap();
        assert!(root.is_dir());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_open_handle_survives_delete() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let path = storage.allocate_path("mp4");
        storage
            .write_stream(&path, reader(vec![1u8; 4096]), 10_000)
            .await
            .unwrap();

        let file = storage.open(&path).await.unwrap();
        storage.delete(&path).await.unwrap();

        let data = collect(file.into_stream(0, 4096).await.unwrap()).await;
        assert_eq!(data.len(), 4096);
    }
}

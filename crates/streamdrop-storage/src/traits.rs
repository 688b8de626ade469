//! Storage abstraction trait
//!
//! This module defines the Storage trait that the registry and ingestion services use.

use crate::file::MediaFile;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("File exceeds size limit of {limit} bytes")]
    SizeLimitExceeded { limit: u64 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Chunked file contents, as served to HTTP bodies.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Storage abstraction trait
///
/// Files are addressed by their full path under [`Storage::root`]. The registry keeps
/// those paths; storage only guarantees that it never touches anything outside the root.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Directory holding every stored file
    fn root(&self) -> &Path;

    /// Reserve a fresh, collision-free path for a new file with the given extension
    fn allocate_path(&self, extension: &str) -> PathBuf;

    /// Write a file from a stream/reader, consuming it until EOF
    ///
    /// Fails with `SizeLimitExceeded` once more than `max_bytes` have been read. On any
    /// failure the partially written file is removed before returning.
    ///
    /// # Returns
    /// Number of bytes written
    async fn write_stream(
        &self,
        path: &Path,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
        max_bytes: u64,
    ) -> StorageResult<u64>;

    /// Open a stored file for reading
    ///
    /// Returns `NotFound` if the file is gone (expired, purged or removed out of band).
    async fn open(&self, path: &Path) -> StorageResult<MediaFile>;

    /// Delete a stored file
    ///
    /// Returns `Ok(false)` when the file was already gone.
    async fn delete(&self, path: &Path) -> StorageResult<bool>;

    /// Remove every stored file by deleting and recreating the root directory
    async fn purge(&self) -> StorageResult<()>;
}

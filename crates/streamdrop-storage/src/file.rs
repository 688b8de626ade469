//! Open handle on a stored media file.

use crate::traits::{ByteStream, StorageError, StorageResult};
use futures::StreamExt;
use std::io::SeekFrom;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

/// Read buffer size for streamed responses.
const CHUNK_SIZE: usize = 64 * 1024;

/// An opened stored file and its length at open time.
///
/// The handle stays valid after the file is unlinked, so a stream that has already
/// started completes even if the registry expires the entry mid-transfer.
#[derive(Debug)]
pub struct MediaFile {
    file: File,
    len: u64,
    path: PathBuf,
}

impl MediaFile {
    pub(crate) fn new(file: File, len: u64, path: PathBuf) -> Self {
        Self { file, len, path }
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stream `length` bytes starting at byte `start`.
    ///
    /// Seek failures are returned before any byte is produced. Read failures after that
    /// surface as an error item, which aborts the HTTP body.
    pub async fn into_stream(mut self, start: u64, length: u64) -> StorageResult<ByteStream> {
        if start > 0 {
            self.file.seek(SeekFrom::Start(start)).await.map_err(|e| {
                StorageError::ReadFailed(format!(
                    "Failed to seek to {} in {}: {}",
                    start,
                    self.path.display(),
                    e
                ))
            })?;
        }

        let reader = ReaderStream::with_capacity(self.file.take(length), CHUNK_SIZE);
        let path_display = self.path.display().to_string();

        let stream = reader.map(move |result| {
            result.map_err(|e| {
                tracing::error!(
                    error = %e,
                    path = %path_display,
                    "Local storage stream read error"
                );
                StorageError::ReadFailed(format!("Failed to read chunk: {}", e))
            })
        });

        Ok(Box::pin(stream))
    }
}

//! Ingestion adapters
//!
//! Both adapters follow the same path: take the user's gate permit, stream the source
//! into a freshly allocated file under the storage root, then register the finished file.
//! A token is only issued for a complete file; on every failure (including the task being
//! dropped mid-transfer) the partial file is removed and the user is released.

mod url_guard;

pub use url_guard::check_source_url;

use crate::gate::IngestionGate;
use crate::registry::ContentRegistry;
use futures::TryStreamExt;
use reqwest::StatusCode;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use streamdrop_core::media_types::{
    extension_for, is_accepted_remote_type, is_streamable, normalize_mime_type,
    registered_content_type,
};
use streamdrop_core::{AppError, Config, IngestOutcome, LinkBuilder, RegistryEntry};
use streamdrop_storage::StorageError;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;

/// Limits applied to every ingestion.
#[derive(Debug, Clone)]
pub struct IngestLimits {
    pub max_bytes: u64,
    /// Upper bound on a whole remote download, connect to last byte
    pub timeout: Duration,
    pub allow_private_urls: bool,
    pub allowlist: Option<Vec<String>>,
}

impl IngestLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_bytes: config.max_ingest_size_bytes(),
            timeout: config.ingest_timeout(),
            allow_private_urls: config.allow_private_urls(),
            allowlist: config.url_ingest_allowlist().map(|list| list.to_vec()),
        }
    }
}

pub struct IngestService {
    registry: Arc<ContentRegistry>,
    gate: IngestionGate,
    client: reqwest::Client,
    links: LinkBuilder,
    expiry: Duration,
    limits: IngestLimits,
}

impl IngestService {
    pub fn new(
        registry: Arc<ContentRegistry>,
        gate: IngestionGate,
        links: LinkBuilder,
        expiry: Duration,
        limits: IngestLimits,
    ) -> Result<Self, AppError> {
        // Redirect targets would bypass `check_source_url`, so they are not followed.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(limits.timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            registry,
            gate,
            client,
            links,
            expiry,
            limits,
        })
    }

    pub fn gate(&self) -> &IngestionGate {
        &self.gate
    }

    /// Download a remote file and register it.
    #[tracing::instrument(skip(self), fields(operation = "ingest_url"))]
    pub async fn ingest_url(&self, owner_id: &str, url: &str) -> Result<IngestOutcome, AppError> {
        let owner_id = validate_owner_id(owner_id)?;
        let _permit = self
            .gate
            .try_acquire(owner_id)
            .ok_or_else(|| AppError::IngestionBusy(owner_id.to_string()))?;

        let url = url.trim();
        let parsed_url = reqwest::Url::parse(url)
            .map_err(|_| AppError::InvalidInput(format!("Invalid URL format: {}", url)))?;

        check_source_url(
            &parsed_url,
            self.limits.allow_private_urls,
            self.limits.allowlist.as_deref(),
        )
        .await
        .map_err(|e| {
            tracing::warn!(url = %url, error = %e, "Source URL rejected");
            AppError::InvalidInput(format!("URL validation failed: {}", e))
        })?;

        tracing::info!(url = %url, "Downloading media from URL");

        let response = self
            .client
            .get(parsed_url.clone())
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, url = %url, "Failed to connect to URL");
                if e.is_timeout() {
                    AppError::IngestionFailed("Timed out connecting to URL.".to_string())
                } else {
                    AppError::IngestionFailed("Could not connect to URL.".to_string())
                }
            })?;

        if response.status().is_redirection() {
            tracing::warn!(
                status = %response.status(),
                url = %url,
                location = ?response.headers().get(reqwest::header::LOCATION),
                "URL redirected, redirects are not followed"
            );
            return Err(AppError::IngestionFailed(
                "Could not connect to URL.".to_string(),
            ));
        }

        if response.status() != StatusCode::OK {
            tracing::warn!(status = %response.status(), url = %url, "URL returned non-200 status");
            return Err(AppError::IngestionFailed(
                "Could not connect to URL.".to_string(),
            ));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_accepted_remote_type(&content_type) {
            tracing::warn!(content_type = %content_type, url = %url, "URL does not point to media");
            return Err(AppError::IngestionFailed(
                "The URL does not point to a valid video file.".to_string(),
            ));
        }

        if let Some(length) = response.content_length() {
            if length > self.limits.max_bytes {
                return Err(self.too_large());
            }
        }

        let content_type = registered_content_type(&content_type);
        let file_name = parsed_url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .and_then(sanitize_file_name)
            .unwrap_or_else(|| format!("video.{}", extension_for(&content_type)));

        let body = response
            .bytes_stream()
            .map_err(std::io::Error::other);
        let reader = StreamReader::new(Box::pin(body));

        self.store_and_register(owner_id, file_name, content_type, Box::pin(reader))
            .await
    }

    /// Store an uploaded body and register it.
    #[tracing::instrument(skip(self, reader), fields(operation = "ingest_upload"))]
    pub async fn ingest_upload(
        &self,
        owner_id: &str,
        file_name: Option<String>,
        content_type: &str,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
        declared_len: Option<u64>,
    ) -> Result<IngestOutcome, AppError> {
        let owner_id = validate_owner_id(owner_id)?;
        let _permit = self
            .gate
            .try_acquire(owner_id)
            .ok_or_else(|| AppError::IngestionBusy(owner_id.to_string()))?;

        if !is_streamable(content_type) {
            return Err(AppError::UnsupportedMediaType(
                "This document does not look like a video.".to_string(),
            ));
        }

        if declared_len.is_some_and(|len| len > self.limits.max_bytes) {
            return Err(self.too_large());
        }

        let content_type = normalize_mime_type(content_type);
        let file_name = file_name
            .as_deref()
            .and_then(sanitize_file_name)
            .unwrap_or_else(|| format!("upload.{}", extension_for(&content_type)));

        self.store_and_register(owner_id, file_name, content_type, reader)
            .await
    }

    async fn store_and_register(
        &self,
        owner_id: &str,
        file_name: String,
        content_type: String,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> Result<IngestOutcome, AppError> {
        let storage = self.registry.storage();
        let path = storage.allocate_path(extension_for(&content_type));
        let pending = PendingFile::new(path.clone());

        let size_bytes = storage
            .write_stream(&path, reader, self.limits.max_bytes)
            .await
            .map_err(|e| self.map_storage_error(e))?;

        if size_bytes == 0 {
            return Err(AppError::IngestionFailed(
                "The source is empty.".to_string(),
            ));
        }

        let entry = self
            .registry
            .register_entry(owner_id, pending.commit(), &content_type)
            .await;

        tracing::info!(
            token = %entry.token,
            file_name = %file_name,
            size_bytes,
            content_type = %content_type,
            "Ingestion completed"
        );

        Ok(self.outcome(entry, size_bytes, file_name))
    }

    fn outcome(&self, entry: RegistryEntry, size_bytes: u64, file_name: String) -> IngestOutcome {
        IngestOutcome {
            watch_url: self.links.watch_url(&entry.token),
            stream_url: self.links.stream_url(&entry.token),
            expires_at: entry.expires_at(self.expiry),
            token: entry.token,
            size_bytes,
            content_type: entry.content_type,
            file_name,
        }
    }

    fn too_large(&self) -> AppError {
        AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            self.limits.max_bytes / (1024 * 1024)
        ))
    }

    fn map_storage_error(&self, err: StorageError) -> AppError {
        match err {
            StorageError::SizeLimitExceeded { .. } => self.too_large(),
            StorageError::WriteFailed(details) => {
                tracing::warn!(error = %details, "Failed to write ingested media");
                AppError::IngestionFailed("Failed to download the file.".to_string())
            }
            other => AppError::Storage(other.to_string()),
        }
    }
}

fn validate_owner_id(owner_id: &str) -> Result<&str, AppError> {
    let owner_id = owner_id.trim();
    if owner_id.is_empty() {
        return Err(AppError::InvalidInput("owner_id is required".to_string()));
    }
    Ok(owner_id)
}

/// Display name for an ingested file: last path component, control characters removed.
fn sanitize_file_name(raw: &str) -> Option<String> {
    let name: String = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(raw)
        .chars()
        .filter(|c| !c.is_control())
        .take(255)
        .collect();
    let name = name.trim();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

/// Removes a file that never made it into the registry.
///
/// Runs on drop, so it also fires when the ingesting future is cancelled mid-write.
struct PendingFile {
    path: Option<PathBuf>,
}

impl PendingFile {
    fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    /// Hand the file over to its new owner.
    fn commit(mut self) -> PathBuf {
        self.path.take().unwrap_or_default()
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            remove_quietly(&path);
        }
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed partial ingestion file"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            error = %e,
            path = %path.display(),
            "Failed to remove partial ingestion file"
        ),
    }
}

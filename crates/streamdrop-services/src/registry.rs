//! Content registry
//!
//! Process-wide mapping from access tokens to stored media files. Entries are created
//! by ingestion once a file is fully on disk and live until they are strictly older than
//! the configured TTL, at which point a sweep removes them and deletes their files.
//!
//! The map is split into shards, each behind its own lock, so lookups for unrelated
//! tokens never contend. No lock is held while touching the filesystem: a sweep first
//! detaches expired entries from the map, then deletes their files. Whoever detaches an
//! entry is the only one allowed to delete its file.

use crate::shard::{shard_index, SHARD_COUNT};
use chrono::{DateTime, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use streamdrop_core::{RegistryEntry, ResolvedMedia, Token};
use streamdrop_storage::{Storage, StorageResult};
use tokio::sync::RwLock;

/// Outcome of one expiry sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries removed from the registry
    pub expired: usize,
    /// Files deleted from disk
    pub files_deleted: usize,
    /// Files that were already gone
    pub files_missing: usize,
    /// Files that could not be deleted
    pub delete_failures: usize,
}

pub struct ContentRegistry {
    shards: Vec<RwLock<HashMap<Token, RegistryEntry>>>,
    storage: Arc<dyn Storage>,
}

impl ContentRegistry {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let shards = (0..SHARD_COUNT)
            .map(|_| RwLock::new(HashMap::new()))
            .collect();
        Self { shards, storage }
    }

    fn shard(&self, token: &Token) -> &RwLock<HashMap<Token, RegistryEntry>> {
        &self.shards[shard_index(token)]
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Register a file that is already on disk and return its access token.
    ///
    /// The entry is visible to `resolve` before this returns.
    pub async fn register(
        &self,
        owner_id: &str,
        file_path: PathBuf,
        content_type: &str,
    ) -> Token {
        self.register_entry(owner_id, file_path, content_type)
            .await
            .token
    }

    /// Like [`register`](Self::register), returning a copy of the stored entry.
    #[tracing::instrument(skip(self, file_path, content_type), fields(owner_id = %owner_id))]
    pub async fn register_entry(
        &self,
        owner_id: &str,
        file_path: PathBuf,
        content_type: &str,
    ) -> RegistryEntry {
        loop {
            let token = Token::generate();
            let mut shard = self.shard(&token).write().await;

            match shard.entry(token.clone()) {
                Entry::Vacant(slot) => {
                    let entry = slot.insert(RegistryEntry {
                        token: token.clone(),
                        file_path,
                        owner_id: owner_id.to_string(),
                        created_at: Utc::now(),
                        content_type: content_type.to_string(),
                    });
                    tracing::info!(token = %token, "Registered media file");
                    return entry.clone();
                }
                Entry::Occupied(_) => {
                    tracing::warn!("Generated token collided with a live entry, regenerating");
                }
            }
        }
    }

    /// Look up the file behind a token.
    ///
    /// Does not check the disk; the file may have been removed since registration.
    pub async fn resolve(&self, token: &Token) -> Option<ResolvedMedia> {
        self.shard(token)
            .read()
            .await
            .get(token)
            .map(ResolvedMedia::from)
    }

    /// Full entry for a token, including owner and creation time.
    pub async fn get(&self, token: &Token) -> Option<RegistryEntry> {
        self.shard(token).read().await.get(token).cloned()
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let mut total = 0;
        for shard in &self.shards {
            total += shard.read().await.len();
        }
        total
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remove every entry strictly older than `ttl` at `now` and delete its file.
    ///
    /// Delete failures are logged and counted; the entry is gone either way.
    #[tracing::instrument(skip(self), fields(sweep.ttl_secs = ttl.as_secs()))]
    pub async fn sweep(&self, ttl: Duration, now: DateTime<Utc>) -> SweepReport {
        let mut expired = Vec::new();

        for shard in &self.shards {
            let mut map = shard.write().await;
            map.retain(|_, entry| {
                if entry.is_expired(ttl, now) {
                    expired.push(entry.clone());
                    false
                } else {
                    true
                }
            });
        }

        let mut report = SweepReport {
            expired: expired.len(),
            ..SweepReport::default()
        };

        for entry in expired {
            match self.storage.delete(&entry.file_path).await {
                Ok(true) => {
                    report.files_deleted += 1;
                    tracing::info!(
                        token = %entry.token,
                        path = %entry.file_path.display(),
                        created_at = %entry.created_at,
                        "Cleaned up expired media file"
                    );
                }
                Ok(false) => {
                    report.files_missing += 1;
                    tracing::debug!(
                        token = %entry.token,
                        path = %entry.file_path.display(),
                        "Expired media file was already gone"
                    );
                }
                Err(e) => {
                    report.delete_failures += 1;
                    tracing::error!(
                        error = %e,
                        token = %entry.token,
                        path = %entry.file_path.display(),
                        "Failed to delete expired media file, entry removed regardless"
                    );
                }
            }
        }

        report
    }

    /// Drop every entry and wipe the storage directory.
    ///
    /// Used at shutdown and startup. Tolerates files or the directory itself being gone.
    #[tracing::instrument(skip(self))]
    pub async fn purge_all(&self) -> StorageResult<usize> {
        let mut removed = 0;
        for shard in &self.shards {
            let mut map = shard.write().await;
            removed += map.len();
            map.clear();
        }

        tracing::info!(entries = removed, "Purging all storage");
        self.storage.purge().await?;
        Ok(removed)
    }
}

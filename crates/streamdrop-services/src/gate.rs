//! Per-user ingestion gate
//!
//! At most one ingestion runs per user at any moment. `try_acquire` is an atomic
//! test-and-set: it either marks the user busy and hands back a permit, or reports that
//! the user is already busy. It never waits.
//!
//! The permit releases the user when dropped, so the slot is freed on success, on error
//! and when the ingesting task is cancelled mid-flight.

use crate::shard::{shard_index, SHARD_COUNT};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct GateShards {
    /// Busy users, keyed to the generation of the permit that holds them
    shards: Vec<Mutex<HashMap<String, u64>>>,
    next_generation: AtomicU64,
}

/// Sharded set of users with an ingestion in flight
#[derive(Clone)]
pub struct IngestionGate {
    inner: Arc<GateShards>,
}

impl Default for IngestionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestionGate {
    pub fn new() -> Self {
        let shards = (0..SHARD_COUNT)
            .map(|_| Mutex::new(HashMap::new()))
            .collect();
        Self {
            inner: Arc::new(GateShards {
                shards,
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    // Critical sections never panic, but a poisoned map is still a valid map.
    fn lock(&self, user_id: &str) -> MutexGuard<'_, HashMap<String, u64>> {
        self.inner.shards[shard_index(user_id)]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark `user_id` busy if it is idle.
    ///
    /// Returns `None` when the user already has an ingestion in flight.
    pub fn try_acquire(&self, user_id: &str) -> Option<IngestionPermit> {
        let mut shard = self.lock(user_id);
        if shard.contains_key(user_id) {
            tracing::debug!(user_id = %user_id, "Ingestion rejected, user already busy");
            return None;
        }

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        shard.insert(user_id.to_string(), generation);
        drop(shard);

        tracing::debug!(user_id = %user_id, generation, "Ingestion gate acquired");
        Some(IngestionPermit {
            gate: self.clone(),
            user_id: user_id.to_string(),
            generation,
        })
    }

    /// Mark `user_id` idle. Releasing an idle user is a no-op.
    pub fn release(&self, user_id: &str) {
        if self.lock(user_id).remove(user_id).is_some() {
            tracing::debug!(user_id = %user_id, "Ingestion gate released");
        }
    }

    pub fn is_busy(&self, user_id: &str) -> bool {
        self.lock(user_id).contains_key(user_id)
    }

    /// Clear the mark only if it still belongs to the permit of `generation`.
    fn release_generation(&self, user_id: &str, generation: u64) {
        let mut shard = self.lock(user_id);
        if shard.get(user_id) == Some(&generation) {
            shard.remove(user_id);
            tracing::debug!(user_id = %user_id, generation, "Ingestion gate released");
        }
    }
}

/// Proof that a user holds the gate. Releases the user on drop, unless the mark was
/// already cleared and handed to a newer permit.
pub struct IngestionPermit {
    gate: IngestionGate,
    user_id: String,
    generation: u64,
}

impl Drop for IngestionPermit {
    fn drop(&mut self) {
        self.gate.release_generation(&self.user_id, self.generation);
    }
}

impl std::fmt::Debug for IngestionPermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionPermit")
            .field("user_id", &self.user_id)
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    #[test]
    fn test_second_acquire_is_rejected_until_release() {
        let gate = IngestionGate::new();

        let permit = gate.try_acquire("42").unwrap();
        assert!(gate.is_busy("42"));
        assert!(gate.try_acquire("42").is_none());

        drop(permit);
        assert!(!gate.is_busy("42"));
        assert!(gate.try_acquire("42").is_some());
    }

    #[test]
    fn test_users_are_independent() {
        let gate = IngestionGate::new();

        let _a = gate.try_acquire("alice").unwrap();
        assert!(gate.try_acquire("bob").is_some());
        assert!(gate.is_busy("alice"));
    }

    #[test]
    fn test_release_is_idempotent() {
        let gate = IngestionGate::new();
        gate.release("nobody");

        let permit = gate.try_acquire("42").unwrap();
        gate.release("42");
        assert!(!gate.is_busy("42"));
        // The permit's own release is now a no-op.
        drop(permit);
        assert!(!gate.is_busy("42"));
    }

    #[test]
    fn test_stale_permit_does_not_release_newer_holder() {
        let gate = IngestionGate::new();

        let first = gate.try_acquire("u").unwrap();
        gate.release("u");
        let second = gate.try_acquire("u").unwrap();

        drop(first);
        assert!(gate.is_busy("u"));
        assert!(gate.try_acquire("u").is_none());

        drop(second);
        assert!(!gate.is_busy("u"));
    }

    #[test]
    fn test_concurrent_acquire_admits_exactly_one() {
        const THREADS: usize = 32;
        let gate = IngestionGate::new();
        let barrier = Arc::new(Barrier::new(THREADS));
        let admitted = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let gate = gate.clone();
                let barrier = barrier.clone();
                let admitted = admitted.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    if let Some(permit) = gate.try_acquire("same-user") {
                        admitted.fetch_add(1, Ordering::SeqCst);
                        // Hold until every thread has tried.
                        std::thread::sleep(std::time::Duration::from_millis(50));
                        drop(permit);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(admitted.load(Ordering::SeqCst), 1);
        assert!(!gate.is_busy("same-user"));
    }

    #[tokio::test]
    async fn test_cancelled_task_releases_permit() {
        let gate = IngestionGate::new();
        let task_gate = gate.clone();

        let handle = tokio::spawn(async move {
            let _permit = task_gate.try_acquire("42").unwrap();
            std::future::pending::<()>().await;
        });

        while !gate.is_busy("42") {
            tokio::task::yield_now().await;
        }
        handle.abort();
        let _ = handle.await;

        assert!(!gate.is_busy("42"));
    }
}

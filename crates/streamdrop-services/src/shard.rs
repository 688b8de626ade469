use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Number of independently locked partitions for keyed state.
pub(crate) const SHARD_COUNT: usize = 16;

/// Pick the shard owning `key`.
pub(crate) fn shard_index<K: Hash + ?Sized>(key: &K) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() as usize) % SHARD_COUNT
}

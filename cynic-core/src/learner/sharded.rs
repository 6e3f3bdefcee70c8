//! Sharded mutex map for per-key serialization
//!
//! Q-table and posterior updates for a single key must be serialized while
//! distinct keys proceed in parallel. A fixed shard array of mutexes gives
//! exactly that without a global lock.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use parking_lot::Mutex;

const SHARD_COUNT: usize = 16;

/// A `HashMap` split across mutex shards by key hash
pub struct ShardedMap<K, V> {
    shards: Vec<Mutex<HashMap<K, V>>>,
}

impl<K: Hash + Eq + Clone, V: Clone> Default for ShardedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + Clone, V: Clone> ShardedMap<K, V> {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    fn shard(&self, key: &K) -> &Mutex<HashMap<K, V>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % SHARD_COUNT]
    }

    /// Run `f` with exclusive access to the key's entry, inserting the
    /// default first when absent. Only the key's shard is locked.
    pub fn with_entry<R>(&self, key: &K, default: impl FnOnce() -> V, f: impl FnOnce(&mut V) -> R) -> R {
        let mut shard = self.shard(key).lock();
        let value = shard.entry(key.clone()).or_insert_with(default);
        f(value)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.shard(key).lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone out every entry (stats and persistence snapshots)
    pub fn snapshot(&self) -> Vec<(K, V)> {
        let mut entries = Vec::new();
        for shard in &self.shards {
            for (k, v) in shard.lock().iter() {
                entries.push((k.clone(), v.clone()));
            }
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_insert_and_update() {
        let map: ShardedMap<String, u32> = ShardedMap::new();
        map.with_entry(&"a".to_string(), || 0, |v| *v += 1);
        map.with_entry(&"a".to_string(), || 0, |v| *v += 1);
        assert_eq!(map.get(&"a".to_string()), Some(2));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_snapshot_sees_all_shards() {
        let map: ShardedMap<u32, u32> = ShardedMap::new();
        for i in 0..100 {
            map.with_entry(&i, || i, |_| {});
        }
        assert_eq!(map.snapshot().len(), 100);
    }
}

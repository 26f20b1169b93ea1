use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use parking_lot::RwLock;
use serde::Serialize;

/// Deterministic key built from an operation name and its serialized parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new<P: Serialize>(operation: &str, params: &P) -> CacheKey {
        let params = serde_json::to_string(params).unwrap_or_default();
        CacheKey(format!("{operation}:{params}"))
    }
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// In-process TTL cache. Concurrent fills of the same key are last-writer-wins
/// within one generation; every `clear` starts a new generation.
pub struct ResultCache<V> {
    entries: RwLock<HashMap<CacheKey, CacheEntry<V>>>,
    generation: AtomicU64,
    ttl: Duration,
}

impl<V: Clone> ResultCache<V> {
    pub fn new(ttl: Duration) -> Self {
        ResultCache {
            entries: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Read before computing a value, then hand it to [`Self::set_if_current`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn get(&self, key: &CacheKey) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &CacheKey, now: Instant) -> Option<V> {
        self.entries
            .read()
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone())
    }

    pub fn set(&self, key: CacheKey, value: V, ttl: Duration) {
        let mut entries = self.entries.write();
        Self::insert(&mut entries, key, value, ttl);
    }

    /// Stores the value only if no `clear` happened since `generation` was read.
    /// Returns whether the value was stored.
    pub fn set_if_current(&self, key: CacheKey, value: V, ttl: Duration, generation: u64) -> bool {
        let mut entries = self.entries.write();
        // `clear` bumps the generation while holding the write lock.
        if self.generation.load(Ordering::Acquire) != generation {
            return false;
        }
        Self::insert(&mut entries, key, value, ttl);
        true
    }

    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        let count = entries.len();
        entries.clear();
        count
    }

    fn insert(entries: &mut HashMap<CacheKey, CacheEntry<V>>, key: CacheKey, value: V, ttl: Duration) {
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }
}

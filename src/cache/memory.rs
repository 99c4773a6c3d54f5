//! Process-local cache backed by a `HashMap`.
//!
//! Expired entries are dropped lazily when read; there is no background
//! sweep. The lock is held only for the map operation itself.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::Value;

use super::{Cache, CacheEntry, Clock, DEFAULT_TTL, SystemClock};

/// In-memory cache with a fixed TTL.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    /// Create a cache with the default ten-minute TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Create a cache whose entries live for `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create a cache that reads time from `clock`.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now_ms();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        // Expired: evict, unless a writer refreshed it in the meantime
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
            tracing::trace!(key, "Evicted expired cache entry");
        }
        None
    }

    fn set(&self, key: &str, value: Value) {
        let entry = CacheEntry::new(value, self.clock.now_ms(), self.ttl.as_millis() as u64);
        self.entries.write().insert(key.to_string(), entry);
    }

    fn delete(&self, key: &str) {
        self.entries.write().remove(key);
    }

    fn contains(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .read()
            .get(key)
            .is_some_and(|e| !e.is_expired(now))
    }
}

//! Response cache.
//!
//! Every row fetched from the service and every memoized result goes through
//! a [`Cache`]. The cache is injected into the [`Client`](crate::Client), never
//! global, so tests can use an in-memory store with a manual clock.
//!
//! Backends:
//! - [`MemoryCache`] - process-local map with lazy TTL expiry
//! - [`BlackHoleCache`] - stores nothing, for disabling caching
//! - `RedisCache` - distributed backend (feature `redis`)
//!
//! Keys follow the `"<namespace>:<identifier>"` convention, see [`cache_key`].

mod entry;
mod memory;
#[cfg(feature = "redis")]
mod distributed;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;

pub use entry::CacheEntry;
pub use memory::MemoryCache;
#[cfg(feature = "redis")]
pub use distributed::RedisCache;

/// Default time-to-live for cached entries (ten minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// A key-value store with per-entry expiry.
///
/// Reads of absent or expired keys are misses; writes reset the expiry.
/// Implementations must be usable from several threads, but are not required
/// to serialize racing writers on the same key.
pub trait Cache: Send + Sync {
    /// Get the value stored under `key`, or `None` on a miss.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store `value` under `key`, replacing any previous entry.
    fn set(&self, key: &str, value: Value);

    /// Remove the entry under `key`, if any.
    fn delete(&self, key: &str);

    /// Whether a live entry exists under `key`.
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// Shared handle to a cache backend.
pub type SharedCache = Arc<dyn Cache>;

/// Build a namespaced cache key.
pub fn cache_key(namespace: &str, identifier: &str) -> String {
    format!("{namespace}:{identifier}")
}

/// A cache that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlackHoleCache;

impl Cache for BlackHoleCache {
    fn get(&self, _key: &str) -> Option<Value> {
        None
    }

    fn set(&self, _key: &str, _value: Value) {}

    fn delete(&self, _key: &str) {}

    fn contains(&self, _key: &str) -> bool {
        false
    }
}

// == Clocks ==

/// Time source for expiry decisions, in Unix milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to. Useful for exercising expiry.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

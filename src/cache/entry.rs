//! Cache entry with an absolute expiry instant.

use serde_json::Value;

/// A single cached value and the Unix millisecond at which it expires.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Value,
    pub expires_at: u64,
}

impl CacheEntry {
    /// Create an entry that lives for `ttl_ms` from `now_ms`.
    pub fn new(value: Value, now_ms: u64, ttl_ms: u64) -> Self {
        Self {
            value,
            expires_at: now_ms.saturating_add(ttl_ms),
        }
    }

    /// An entry is expired once `now_ms` reaches its expiry instant.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }
}

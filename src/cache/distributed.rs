//! Redis-backed cache.
//!
//! Values are stored as JSON text with `SET key value EX ttl`, so expiry is
//! enforced by the server. Redis failures are logged and reported as misses;
//! a flaky cache must never fail a lookup that the service could answer.

use std::time::Duration;

use ::redis::Commands;
use parking_lot::Mutex;
use serde_json::Value;

use super::{Cache, DEFAULT_TTL};
use crate::error::{Error, Result};

/// Cache shared between processes through a Redis server.
pub struct RedisCache {
    connection: Mutex<::redis::Connection>,
    key_format: String,
    ttl: Duration,
}

impl RedisCache {
    /// Connect to `url` (e.g. `redis://127.0.0.1:6379`).
    pub fn connect(url: &str) -> Result<Self> {
        Self::connect_with(url, None, DEFAULT_TTL)
    }

    /// Connect with an optional key format and a TTL.
    ///
    /// `key_format` must contain `{}`, which is replaced by the sanitized key;
    /// use it to prefix keys, e.g. `"lastfm_{}"`.
    pub fn connect_with(url: &str, key_format: Option<&str>, ttl: Duration) -> Result<Self> {
        let key_format = key_format.unwrap_or("{}").to_string();
        if !key_format.contains("{}") {
            return Err(Error::config(format!(
                "Redis key format {key_format:?} has no {{}} placeholder"
            )));
        }

        let client = ::redis::Client::open(url)
            .map_err(|e| Error::config(format!("Invalid Redis URL {url:?}: {e}")))?;
        let connection = client
            .get_connection()
            .map_err(|e| Error::Network(format!("Redis connection to {url} failed: {e}")))?;

        tracing::info!(url, "Connected to Redis cache");
        Ok(Self {
            connection: Mutex::new(connection),
            key_format,
            ttl,
        })
    }

    fn expand_key(&self, key: &str) -> String {
        self.key_format.replacen("{}", &sanitize_key(key), 1)
    }
}

/// Replace runs of control characters and spaces with `_` and lowercase the
/// rest. Redis keys are binary-safe but the text protocol tools are not.
pub(crate) fn sanitize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut in_run = false;
    for c in key.chars() {
        if c <= '\u{21}' || c == '\u{7f}' {
            if !in_run {
                out.push('_');
                in_run = true;
            }
        } else {
            out.extend(c.to_lowercase());
            in_run = false;
        }
    }
    out
}

impl Cache for RedisCache {
    fn get(&self, key: &str) -> Option<Value> {
        let redis_key = self.expand_key(key);
        let raw: Option<String> = match self.connection.lock().get(&redis_key) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %redis_key, "Redis GET failed: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&raw?) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %redis_key, "Discarding undecodable cache entry: {}", e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: Value) {
        let redis_key = self.expand_key(key);
        let text = value.to_string();
        let result: ::redis::RedisResult<()> =
            self.connection
                .lock()
                .set_ex(&redis_key, text, self.ttl.as_secs().max(1));
        if let Err(e) = result {
            tracing::warn!(key = %redis_key, "Redis SET failed: {}", e);
        }
    }

    fn delete(&self, key: &str) {
        let redis_key = self.expand_key(key);
        let result: ::redis::RedisResult<()> = self.connection.lock().del(&redis_key);
        if let Err(e) = result {
            tracing::warn!(key = %redis_key, "Redis DEL failed: {}", e);
        }
    }

    fn contains(&self, key: &str) -> bool {
        let redis_key = self.expand_key(key);
        match self.connection.lock().exists(&redis_key) {
            Ok(exists) => exists,
            Err(e) => {
                tracing::warn!(key = %redis_key, "Redis EXISTS failed: {}", e);
                false
            }
        }
    }
}

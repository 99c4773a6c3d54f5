//! Memoization of derived results in the response cache.
//!
//! A memoized operation computes its result once per cache key and TTL
//! window. Keys come from explicit key-builder functions next to each
//! operation (see [`similar_artists_key`](crate::artists::similar_artists_key)),
//! never from runtime string templates.
//!
//! Callers racing on the same miss may both compute and both store; the last
//! write wins. That is the whole consistency story.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::{Cache, SharedCache};
use crate::client::Client;
use crate::error::Result;

/// Something that can reach a cache: its own, or its client's.
pub trait CacheScope {
    /// A cache owned by the object itself, preferred over the client's.
    fn local_cache(&self) -> Option<&SharedCache> {
        None
    }

    fn client(&self) -> &Client;

    /// The cache memoized results go to.
    fn scope_cache(&self) -> &dyn Cache {
        match self.local_cache() {
            Some(cache) => cache.as_ref(),
            None => self.client().cache().as_ref(),
        }
    }
}

impl CacheScope for Client {
    fn client(&self) -> &Client {
        self
    }
}

/// Return the result cached under `key`, or compute, store and return it.
///
/// An entry that no longer decodes as `T` counts as a miss.
pub fn memoize<S, T, F>(scope: &S, key: &str, compute: F) -> Result<T>
where
    S: CacheScope + ?Sized,
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Result<T>,
{
    let cache = scope.scope_cache();

    if let Some(hit) = cache.get(key) {
        match serde_json::from_value(hit) {
            Ok(value) => {
                tracing::debug!(key, "Memoized result hit");
                return Ok(value);
            }
            Err(e) => tracing::debug!(key, "Ignoring undecodable memoized result: {}", e),
        }
    }

    tracing::debug!(key, "Memoized result miss");
    let value = compute()?;
    match serde_json::to_value(&value) {
        Ok(encoded) => cache.set(key, encoded),
        Err(e) => tracing::warn!(key, "Result not stored, it does not serialize: {}", e),
    }
    Ok(value)
}

//! The API client.
//!
//! A [`Client`] owns the transport and the cache, both injected at
//! construction, and is cheap to clone: every entity keeps one to hydrate
//! itself later. All requests are synchronous.
//!
//! # Usage
//!
//! ```ignore
//! use lastfm_client::Client;
//!
//! let client = Client::new("your-api-key")?;
//! let mut cher = client.artists().get(Some("Cher"), None, false)?;
//! println!("{cher}: {:?}", cher.stats()?);
//!
//! let mut results = client.albums().search("Believe")?;
//! results.load_next_page()?;
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::albums::AlbumCollection;
use crate::artists::ArtistCollection;
use crate::cache::{BlackHoleCache, MemoryCache, SharedCache, cache_key};
use crate::config::{CacheBackend, Config};
use crate::error::{ApiErrorKind, Error, Result};
use crate::transport::{HttpTransport, Params, Transport};

/// last.fm API client.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    cache: SharedCache,
}

impl Client {
    /// Create a client for the public endpoint with an in-memory cache.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a client from a loaded configuration file.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .credentials
            .api_key
            .clone()
            .ok_or_else(|| Error::config("no API key configured ([credentials] api_key)"))?;

        let transport = HttpTransport::with_options(
            api_key,
            config.service.base_url.clone(),
            Duration::from_secs(config.service.timeout_secs),
        )?;

        let ttl = Duration::from_secs(config.cache.ttl_secs);
        let cache: SharedCache = match config.cache.backend {
            CacheBackend::Memory => Arc::new(MemoryCache::with_ttl(ttl)),
            CacheBackend::Disabled => Arc::new(BlackHoleCache),
            #[cfg(feature = "redis")]
            CacheBackend::Redis => {
                let url = config
                    .cache
                    .redis_url
                    .as_deref()
                    .ok_or_else(|| Error::config("Redis cache selected but no redis_url set"))?;
                Arc::new(crate::cache::RedisCache::connect_with(
                    url,
                    config.cache.key_format.as_deref(),
                    ttl,
                )?)
            }
            #[cfg(not(feature = "redis"))]
            CacheBackend::Redis => {
                return Err(Error::config(
                    "Redis cache selected but this build lacks the `redis` feature",
                ));
            }
        };

        Ok(Self::with_parts(Arc::new(transport), cache))
    }

    /// Assemble a client from an existing transport and cache.
    pub fn with_parts(transport: Arc<dyn Transport>, cache: SharedCache) -> Self {
        Self {
            inner: Arc::new(Inner { transport, cache }),
        }
    }

    /// Direct access to the transport, bypassing the cache.
    pub fn raw(&self) -> &dyn Transport {
        self.inner.transport.as_ref()
    }

    pub fn cache(&self) -> &SharedCache {
        &self.inner.cache
    }

    /// Call a remote method (uncached).
    pub fn call(&self, method: &str, params: &Params<'_>) -> Result<Value> {
        tracing::debug!(method, ?params, "Remote call");
        self.inner.transport.call(method, params)
    }

    pub fn artists(&self) -> ArtistCollection<'_> {
        ArtistCollection::new(self)
    }

    pub fn albums(&self) -> AlbumCollection<'_> {
        AlbumCollection::new(self)
    }

    /// Probe `"<namespace>:<candidate>"` for each present candidate, in
    /// order, and return the first hit.
    pub fn cache_find(&self, namespace: &str, candidates: &[Option<&str>]) -> Option<Value> {
        let cache = self.cache();
        candidates
            .iter()
            .flatten()
            .filter(|id| !id.trim().is_empty())
            .find_map(|id| {
                let key = cache_key(namespace, id);
                let hit = cache.get(&key);
                if hit.is_some() {
                    tracing::debug!(key = %key, "Cache hit");
                }
                hit
            })
    }

    /// Store `value` under `"<namespace>:<id>"` for every id.
    pub fn cache_store<I, S>(&self, namespace: &str, ids: I, value: &Value)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            let id = id.as_ref();
            if id.trim().is_empty() {
                continue;
            }
            self.cache().set(&cache_key(namespace, id), value.clone());
        }
    }

    /// Cache-checked fetch.
    ///
    /// Returns the first cached candidate; on a total miss runs `fetch` and
    /// writes the result under every id `keys_of` derives from it, so a later
    /// lookup by any of them (including ids the caller did not know) hits.
    pub fn cached_fetch<F, K>(
        &self,
        namespace: &str,
        candidates: &[Option<&str>],
        fetch: F,
        keys_of: K,
    ) -> Result<Value>
    where
        F: FnOnce() -> Result<Value>,
        K: FnOnce(&Value) -> Vec<String>,
    {
        if let Some(hit) = self.cache_find(namespace, candidates) {
            return Ok(hit);
        }

        tracing::debug!(namespace, ?candidates, "Cache miss, fetching");
        let fresh = fetch()?;
        let ids = keys_of(&fresh);
        self.cache_store(namespace, &ids, &fresh);
        Ok(fresh)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

/// Map the service's "invalid parameters" answer to a lookup into
/// [`Error::NotFound`]; that is how unknown artists and albums are reported.
pub(crate) fn lookup_error(err: Error, namespace: &'static str, key: &str) -> Error {
    match err.api_error().map(|e| e.kind()) {
        Some(ApiErrorKind::InvalidParameters) => Error::not_found(namespace, key),
        _ => err,
    }
}

/// Builder for [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    transport: Option<Arc<dyn Transport>>,
    cache: Option<SharedCache>,
}

impl ClientBuilder {
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a custom transport instead of HTTP.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn cache(mut self, cache: SharedCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Disable caching.
    pub fn no_cache(self) -> Self {
        self.cache(Arc::new(BlackHoleCache))
    }

    pub fn build(self) -> Result<Client> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let api_key = self
                    .api_key
                    .ok_or_else(|| Error::config("cannot create a client with no API key"))?;
                Arc::new(HttpTransport::with_options(
                    api_key,
                    self.base_url
                        .unwrap_or_else(|| crate::transport::DEFAULT_BASE_URL.to_string()),
                    self.timeout.unwrap_or(Duration::from_secs(30)),
                )?)
            }
        };
        let cache = self.cache.unwrap_or_else(|| Arc::new(MemoryCache::new()));
        Ok(Client::with_parts(transport, cache))
    }
}

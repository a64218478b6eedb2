//! Ranking result cache
//!
//! Provides the cache port used by the ranking service:
//! - Versioned key schema
//! - Object-safe backend trait (`CacheOperations`) with Redis and in-memory impls
//! - Typed JSON access and compute-if-absent (`remember`) on top of any backend
//! - Metrics integration

mod clock;
mod error;
mod keys;
mod memory;
mod metrics;
mod redis_cache;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CacheError, CacheResult};
pub use keys::{CacheKey, CACHE_VERSION};
pub use memory::MemoryCache;
pub use metrics::CacheMetrics;
pub use redis_cache::RedisCache;

use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default TTL values (seconds)
pub mod ttl {
    pub const TRENDING: u64 = 300; // 5 minutes
    pub const HERO: u64 = 600; // 10 minutes
    pub const SOURCE_DISTRIBUTION: u64 = 3600; // 1 hour
}

/// Raw backend operations. Values are opaque strings (JSON at the `ContentCache` layer).
#[async_trait::async_trait]
pub trait CacheOperations: Send + Sync {
    /// Get a value; `None` on miss or expiry
    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>>;

    /// Set a value with TTL
    async fn set_raw(&self, key: &str, value: String, ttl_secs: u64) -> CacheResult<()>;

    /// Delete a key
    async fn del(&self, key: &str) -> CacheResult<()>;
}

/// Typed cache client over any backend
#[derive(Clone)]
pub struct ContentCache {
    backend: Arc<dyn CacheOperations>,
    metrics: CacheMetrics,
}

impl ContentCache {
    pub fn new(backend: Arc<dyn CacheOperations>) -> Self {
        Self {
            backend,
            metrics: CacheMetrics::new(),
        }
    }

    pub fn with_metrics(backend: Arc<dyn CacheOperations>, metrics: CacheMetrics) -> Self {
        Self { backend, metrics }
    }

    /// Get and deserialize a value. Corrupted entries are dropped and reported as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        let raw = match self.backend.get_raw(key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache get failed");
                self.metrics.record_error(key, "backend");
                return Err(e);
            }
        };

        let Some(data) = raw else {
            debug!(key = %key, "Cache miss");
            self.metrics.record_miss(key);
            return Ok(None);
        };

        match serde_json::from_str::<T>(&data) {
            Ok(value) => {
                debug!(key = %key, "Cache hit");
                self.metrics.record_hit(key);
                Ok(Some(value))
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache deserialization failed");
                self.metrics.record_error(key, "deserialize");
                self.backend.del(key).await?;
                self.metrics.record_invalidation(key);
                Ok(None)
            }
        }
    }

    /// Serialize and store a value with TTL
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
    ) -> CacheResult<()> {
        let data = serde_json::to_string(value)?;
        if let Err(e) = self.backend.set_raw(key, data, ttl_secs).await {
            self.metrics.record_error(key, "backend");
            return Err(e);
        }
        self.metrics.record_write(key);
        Ok(())
    }

    pub async fn del(&self, key: &str) -> CacheResult<()> {
        self.backend.del(key).await?;
        self.metrics.record_invalidation(key);
        Ok(())
    }

    /// Compute-if-absent: return the cached value, or run `compute`, store its
    /// result for `ttl_secs` and return it. Errors from `compute` are not cached.
    pub async fn remember<T, E, F, Fut>(&self, key: &str, ttl_secs: u64, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get::<T>(key).await? {
            return Ok(cached);
        }

        let value = compute().await?;
        self.set(key, &value, ttl_secs).await?;
        Ok(value)
    }
}

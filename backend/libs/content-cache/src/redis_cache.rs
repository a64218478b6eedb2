//! Redis-backed cache backend.

use crate::{CacheOperations, CacheResult};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    /// Add jitter to TTL to prevent thundering herd
    fn add_jitter(ttl_secs: u64) -> u64 {
        let jitter_percent = (rand::random::<u32>() % 10) as f64 / 100.0;
        let jitter = (ttl_secs as f64 * jitter_percent).round() as u64;
        ttl_secs + jitter
    }

    /// Ping Redis to check connection health
    pub async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| {
                warn!("Redis PING failed: {}", e);
                e
            })?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CacheOperations for RedisCache {
    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await.map_err(|e| {
            warn!(key = %key, error = %e, "Redis get error");
            e
        })?;
        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: String, ttl_secs: u64) -> CacheResult<()> {
        let ttl_with_jitter = Self::add_jitter(ttl_secs);
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_with_jitter)
            .await
            .map_err(|e| {
                warn!(key = %key, error = %e, "Redis SETEX failed");
                e
            })?;

        debug!(key = %key, ttl = ttl_with_jitter, "Cache set");
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        debug!(key = %key, "Cache delete");
        Ok(())
    }
}

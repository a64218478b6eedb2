//! In-process cache backend with exact TTL expiry.
//!
//! Used by tests and by single-node deployments without Redis. Expiry is
//! evaluated against the injected [`Clock`], so a [`ManualClock`] gives fully
//! deterministic TTL behaviour.
//!
//! [`ManualClock`]: crate::ManualClock

use crate::{CacheError, CacheOperations, CacheResult, Clock, SystemClock};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

// Roughly a century; keeps `Duration::seconds` within its representable range.
const MAX_TTL_SECS: i64 = 100 * 365 * 24 * 3600;

struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

pub struct MemoryCache {
    entries: DashMap<String, Entry>,
    clock: Arc<dyn Clock>,
    available: AtomicBool,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            available: AtomicBool::new(true),
        }
    }

    /// Simulate a backend outage: every operation fails with `Unavailable` until restored.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries
            .iter()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_available(&self) -> CacheResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::Unavailable("memory cache disabled".to_string()))
        }
    }
}

#[async_trait::async_trait]
impl CacheOperations for MemoryCache {
    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>> {
        self.ensure_available()?;
        let now = self.clock.now();

        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            debug!(key = %key, "Memory cache entry expired");
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set_raw(&self, key: &str, value: String, ttl_secs: u64) -> CacheResult<()> {
        self.ensure_available()?;
        let secs = i64::try_from(ttl_secs)
            .unwrap_or(i64::MAX)
            .min(MAX_TTL_SECS);
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(Duration::seconds(secs))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.entries
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        self.ensure_available()?;
        self.entries.remove(key);
        Ok(())
    }
}

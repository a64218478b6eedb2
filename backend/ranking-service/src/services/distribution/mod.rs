use crate::error::Result;
use crate::models::{SourceDistribution, SourceStat};
use crate::services::authority::normalize_domain;
use crate::store::{PostStore, SourceCounts};
use chrono::{DateTime, Utc};
use content_cache::{CacheKey, ContentCache};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Source-distribution cache
///
/// Share of qualifying posts per normalized domain, stored wholesale under a
/// single key. Concurrent misses within this process wait on one
/// recomputation instead of each scanning the store.
pub struct SourceDistributionCache {
    store: Arc<dyn PostStore>,
    cache: ContentCache,
    ttl_secs: u64,
    flight: Mutex<()>,
}

impl SourceDistributionCache {
    pub fn new(store: Arc<dyn PostStore>, cache: ContentCache, ttl_secs: u64) -> Self {
        Self {
            store,
            cache,
            ttl_secs,
            flight: Mutex::new(()),
        }
    }

    pub async fn get(&self, now: DateTime<Utc>) -> Result<SourceDistribution> {
        let key = CacheKey::source_distribution();

        if let Some(cached) = self.cache.get::<SourceDistribution>(&key).await? {
            return Ok(cached);
        }

        let _guard = self.flight.lock().await;

        // Another caller may have filled it while we waited
        if let Some(cached) = self.cache.get::<SourceDistribution>(&key).await? {
            debug!("Source distribution filled by concurrent caller");
            return Ok(cached);
        }

        let counts = self.store.count_by_source(now).await?;
        let distribution = build_distribution(&counts);
        self.cache.set(&key, &distribution, self.ttl_secs).await?;

        info!(
            total_posts = counts.total,
            sources = distribution.len(),
            "Recomputed source distribution"
        );
        Ok(distribution)
    }
}

/// Group raw URL counts by normalized domain. The denominator is every
/// qualifying post, including those without a source.
pub fn build_distribution(counts: &SourceCounts) -> SourceDistribution {
    let mut distribution = SourceDistribution::new();
    if counts.total == 0 {
        return distribution;
    }

    for (url, count) in &counts.by_source_url {
        distribution
            .entry(normalize_domain(url))
            .or_insert(SourceStat {
                count: 0,
                percentage: 0.0,
            })
            .count += count;
    }

    for stat in distribution.values_mut() {
        stat.percentage = stat.count as f64 / counts.total as f64 * 100.0;
    }
    distribution
}

//! Content Ranking Service
//!
//! Entry point used by the batch job and the binary. Wires the scorer, the
//! diversity reorderer and the source-distribution cache to a post store and
//! exposes the cached feed queries (trending, hero) plus the uncached
//! anonymous feed.

use crate::config::{RankingConfig, RankingWeights};
use crate::error::{RankingError, Result};
use crate::models::{Post, ScoreBreakdown, SourceDistribution};
use crate::services::authority::{AuthorityTableSpec, DomainAuthorityTable};
use crate::services::distribution::SourceDistributionCache;
use crate::services::diversity::DiversityLayer;
use crate::services::ranking::ContentScorer;
use crate::store::{PostOrder, PostQuery, PostStore};
use crate::utils::{days_window_start, hours_window_start};
use chrono::{DateTime, Utc};
use content_cache::{CacheKey, ContentCache};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

pub const CONFIGURATION_VERSION: &str = "1.0.0";

/// Introspection view of the active ranking setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfiguration {
    pub weights: RankingWeights,
    pub source_authorities: AuthorityTableSpec,
    pub version: String,
    pub last_updated: DateTime<Utc>,
}

pub struct ContentRankingService {
    store: Arc<dyn PostStore>,
    cache: ContentCache,
    scorer: ContentScorer,
    diversity: DiversityLayer,
    distribution: SourceDistributionCache,
    config: RankingConfig,
}

impl ContentRankingService {
    pub fn new(
        store: Arc<dyn PostStore>,
        cache: ContentCache,
        authority: Arc<DomainAuthorityTable>,
        config: RankingConfig,
    ) -> Self {
        let distribution =
            SourceDistributionCache::new(store.clone(), cache.clone(), config.cache.distribution_ttl);

        Self {
            scorer: ContentScorer::new(config.weights, authority),
            diversity: DiversityLayer::new(),
            store,
            cache,
            distribution,
            config,
        }
    }

    /// Weighted score of one post at `now`.
    pub async fn calculate_content_score(&self, post: &Post, now: DateTime<Utc>) -> Result<f64> {
        let distribution = self.distribution_if_needed(now).await?;
        Ok(self.scorer.score(post, now, distribution.as_ref()))
    }

    pub async fn get_score_breakdown(
        &self,
        post: &Post,
        now: DateTime<Utc>,
    ) -> Result<ScoreBreakdown> {
        let distribution = self.distribution_if_needed(now).await?;
        Ok(self.scorer.breakdown(post, now, distribution.as_ref()))
    }

    pub fn apply_source_diversity(&self, posts: Vec<Post>, limit: usize) -> Vec<Post> {
        self.diversity.apply_source_diversity(posts, limit)
    }

    pub async fn get_source_distribution(&self, now: DateTime<Utc>) -> Result<SourceDistribution> {
        self.distribution.get(now).await
    }

    /// Rank an arbitrary set: persisted score when present, finite and
    /// non-zero, otherwise computed; newer first on ties; then source diversity.
    pub async fn rank_for_anonymous_user(
        &self,
        posts: Vec<Post>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Post>> {
        if posts.is_empty() {
            return Ok(posts);
        }

        let distribution = self.distribution_if_needed(now).await?;
        let mut scored: Vec<(f64, Post)> = posts
            .into_iter()
            .map(|post| {
                let score = match post.ranking_score {
                    Some(persisted) if persisted.is_finite() && persisted != 0.0 => persisted,
                    _ => self.scorer.score(&post, now, distribution.as_ref()),
                };
                (score, post)
            })
            .collect();

        scored.sort_by(|(sa, a), (sb, b)| {
            sb.total_cmp(sa)
                .then_with(|| b.published_at.cmp(&a.published_at))
        });

        let limit = scored.len();
        let ranked = scored.into_iter().map(|(_, post)| post).collect();
        Ok(self.diversity.apply_source_diversity(ranked, limit))
    }

    /// Anonymous home feed from persisted scores. Not cached.
    pub async fn get_ranked_posts_for_anonymous_user(
        &self,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<Post>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let fetch = limit.saturating_mul(self.config.thresholds.overfetch_factor.max(1));
        let query = PostQuery::qualifying(now)
            .order_by(PostOrder::RankingScoreDesc)
            .limit(fetch);
        let candidates = self.store.query(&query).await?;

        debug!(limit, candidates = candidates.len(), "Ranking anonymous feed");
        Ok(self.diversity.apply_source_diversity(candidates, limit))
    }

    /// Recent posts with some traction, cached per `(limit, window_hours)`.
    pub async fn get_trending_posts(
        &self,
        limit: usize,
        window_hours: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Post>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let key = CacheKey::trending(limit, window_hours);
        let thresholds = self.config.thresholds;

        self.cache
            .remember(&key, self.config.cache.trending_ttl, || async move {
                let since = hours_window_start(now, window_hours);
                let recent = self.store.query(&PostQuery::qualifying(now).since(since)).await?;

                let mut trending: Vec<Post> = self
                    .rank_for_anonymous_user(recent, now)
                    .await?
                    .into_iter()
                    .filter(|p| {
                        p.views_count >= thresholds.trending_min_views
                            || p.likes_count >= thresholds.trending_min_likes
                    })
                    .collect();
                trending.truncate(limit);

                info!(limit, window_hours, count = trending.len(), "Computed trending posts");
                Ok::<_, RankingError>(trending)
            })
            .await
    }

    /// Strongest posts of the recent window, cached per `limit`.
    pub async fn get_hero_content(&self, limit: usize, now: DateTime<Utc>) -> Result<Vec<Post>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let key = CacheKey::hero(limit);
        let thresholds = self.config.thresholds;

        self.cache
            .remember(&key, self.config.cache.hero_ttl, || async move {
                let since = days_window_start(now, thresholds.hero_window_days);
                let recent = self.store.query(&PostQuery::qualifying(now).since(since)).await?;

                let distribution = self.distribution_if_needed(now).await?;
                let mut hero: Vec<Post> = self
                    .rank_for_anonymous_user(recent, now)
                    .await?
                    .into_iter()
                    .filter(|p| {
                        self.scorer.score(p, now, distribution.as_ref())
                            >= thresholds.hero_content_score
                    })
                    .collect();
                hero.truncate(limit);

                info!(limit, count = hero.len(), "Computed hero content");
                Ok::<_, RankingError>(hero)
            })
            .await
    }

    pub fn get_configuration(&self, now: DateTime<Utc>) -> RankingConfiguration {
        RankingConfiguration {
            weights: *self.scorer.weights(),
            source_authorities: self.scorer.authority().spec(),
            version: CONFIGURATION_VERSION.to_string(),
            last_updated: now,
        }
    }

    async fn distribution_if_needed(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<SourceDistribution>> {
        if !self.scorer.uses_source_diversity() {
            return Ok(None);
        }
        self.distribution.get(now).await.map(Some)
    }
}

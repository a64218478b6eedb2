// ============================================
// Score Batch Job
// ============================================
//
// Recomputes the persisted ranking_score of qualifying posts so the
// anonymous feed can sort in the database.
//
// Workflow:
// 1. Fetch posts whose score is missing or older than the stale window
//    (every qualifying post when forced)
// 2. Score each post at a single `now`
// 3. Write score and calculated_at back; a failed write is counted, not fatal
//
// Usage:
//   content-ranking --mode score-batch [--force]

use crate::error::Result;
use crate::services::ContentRankingService;
use crate::store::PostStore;
use crate::utils::hours_window_start;
use chrono::{DateTime, Utc};
use content_cache::Clock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::sleep;
use tracing::{error, info};
use uuid::Uuid;

/// Score batch job configuration
#[derive(Debug, Clone)]
pub struct ScoreBatchConfig {
    /// Recompute every qualifying post, ignoring staleness
    pub force: bool,
    /// Scores older than this are recomputed
    pub stale_after_hours: i64,
    /// Whether to run continuously or exit after one pass
    pub run_once: bool,
    /// Interval between passes (if not run_once)
    pub interval_secs: u64,
}

impl Default for ScoreBatchConfig {
    fn default() -> Self {
        Self {
            force: false,
            stale_after_hours: 6,
            run_once: true,
            interval_secs: 3600,
        }
    }
}

impl ScoreBatchConfig {
    /// Create config from environment variables; unparsable values fall back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            force: std::env::var("SCORE_BATCH_FORCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.force),
            stale_after_hours: std::env::var("SCORE_STALE_AFTER_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.stale_after_hours),
            run_once: std::env::var("SCORE_RUN_ONCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.run_once),
            interval_secs: std::env::var("SCORE_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.interval_secs),
        }
    }
}

/// Score batch job statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchJobStats {
    pub run_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub posts_processed: u32,
    pub posts_succeeded: u32,
    pub posts_failed: u32,
    pub total_duration_ms: u64,
}

/// Score batch job runner
pub struct ScoreBatchJob {
    config: ScoreBatchConfig,
    service: Arc<ContentRankingService>,
    store: Arc<dyn PostStore>,
    clock: Arc<dyn Clock>,
}

impl ScoreBatchJob {
    pub fn new(
        config: ScoreBatchConfig,
        service: Arc<ContentRankingService>,
        store: Arc<dyn PostStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            service,
            store,
            clock,
        }
    }

    /// Run the batch job
    pub async fn run(&self) -> Result<BatchJobStats> {
        loop {
            let stats = self.run_once(self.clock.now()).await?;

            info!(
                run_id = ?stats.run_id,
                processed = stats.posts_processed,
                succeeded = stats.posts_succeeded,
                failed = stats.posts_failed,
                duration_ms = stats.total_duration_ms,
                "Score batch pass completed"
            );

            if self.config.run_once {
                return Ok(stats);
            }

            info!(
                interval_secs = self.config.interval_secs,
                "Sleeping until next pass"
            );
            sleep(std::time::Duration::from_secs(self.config.interval_secs)).await;
        }
    }

    /// Run a single pass with every post scored at `now`
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<BatchJobStats> {
        let start_time = Instant::now();
        let run_id = Uuid::new_v4();
        let mut stats = BatchJobStats {
            run_id: Some(run_id),
            started_at: Some(now),
            ..Default::default()
        };

        let stale_before = if self.config.force {
            None
        } else {
            Some(hours_window_start(now, self.config.stale_after_hours))
        };

        info!(
            %run_id,
            force = self.config.force,
            stale_after_hours = self.config.stale_after_hours,
            "Starting score batch pass"
        );

        let posts = self.store.stale_scores(now, stale_before).await?;
        info!(%run_id, post_count = posts.len(), "Fetched posts for scoring");

        for post in &posts {
            stats.posts_processed += 1;

            let score = self.service.calculate_content_score(post, now).await?;

            match self.store.write_score(post.id, score, now).await {
                Ok(()) => stats.posts_succeeded += 1,
                Err(e) => {
                    stats.posts_failed += 1;
                    error!(
                        %run_id,
                        post_id = post.id,
                        error = %e,
                        "Failed to write ranking score"
                    );
                }
            }
        }

        stats.completed_at = Some(self.clock.now());
        stats.total_duration_ms = start_time.elapsed().as_millis() as u64;

        Ok(stats)
    }
}

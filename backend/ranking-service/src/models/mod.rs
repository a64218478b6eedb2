use crate::utils::hours_between;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type PostId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }

    /// Unknown values map to `Draft` so they never qualify as published.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "published" => PostStatus::Published,
            "archived" => PostStatus::Archived,
            _ => PostStatus::Draft,
        }
    }
}

/// A scraped article/video/podcast as seen by the ranking engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub status: PostStatus,
    pub source_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub views_count: u64,
    pub likes_count: u64,
    /// Persisted score written by the batch job; may be stale.
    pub ranking_score: Option<f64>,
    pub ranking_calculated_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Published status, a publish timestamp, and that timestamp not in the future.
    pub fn is_published(&self, now: DateTime<Utc>) -> bool {
        self.status == PostStatus::Published
            && self.published_at.map(|at| at <= now).unwrap_or(false)
    }

    /// Whole hours since publish, `None` when never published.
    pub fn hours_since_publish(&self, now: DateTime<Utc>) -> Option<i64> {
        self.published_at.map(|at| hours_between(at, now))
    }

    pub fn has_source(&self) -> bool {
        self.source_url
            .as_deref()
            .map(|url| !url.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Score, weight and weighted contribution of one signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalScore {
    pub score: f64,
    pub weight: f64,
    pub weighted_score: f64,
}

impl SignalScore {
    pub fn new(score: f64, weight: f64) -> Self {
        Self {
            score,
            weight,
            weighted_score: score * weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorityBreakdown {
    #[serde(flatten)]
    pub signal: SignalScore,
    pub domain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecencyBreakdown {
    #[serde(flatten)]
    pub signal: SignalScore,
    pub hours_old: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementBreakdown {
    #[serde(flatten)]
    pub signal: SignalScore,
    pub views: u64,
    pub likes: u64,
    /// Likes per 100 views, rounded to two decimals.
    pub engagement_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiversityBreakdown {
    #[serde(flatten)]
    pub signal: SignalScore,
    pub domain: String,
}

/// Per-signal reporting view of a post's score. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub source_authority: AuthorityBreakdown,
    pub recency: RecencyBreakdown,
    pub engagement: EngagementBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_diversity: Option<DiversityBreakdown>,
    pub total_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceStat {
    pub count: u64,
    pub percentage: f64,
}

/// Normalized domain → share of all published posts.
pub type SourceDistribution = BTreeMap<String, SourceStat>;

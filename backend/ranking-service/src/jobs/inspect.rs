// ============================================
// Ranking Inspection Report
// ============================================
//
// Ranks a sample of published posts and reports the top entries, the score
// breakdown of the winner, and the current hero and trending lists.
//
// Usage:
//   content-ranking --mode inspect [--limit 10]

use crate::error::Result;
use crate::models::{Post, PostId, ScoreBreakdown};
use crate::services::authority::source_domain;
use crate::services::ContentRankingService;
use crate::store::{PostQuery, PostStore};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Posts sampled from the store before ranking
pub const INSPECTION_SAMPLE_SIZE: usize = 50;
const SHOWCASE_SIZE: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub id: PostId,
    pub title: String,
    pub domain: String,
    pub score: f64,
    pub views: u64,
    pub likes: u64,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredTitle {
    pub id: PostId,
    pub title: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InspectionReport {
    pub generated_at: DateTime<Utc>,
    pub sampled: usize,
    pub ranked: Vec<RankedEntry>,
    pub top_breakdown: Option<ScoreBreakdown>,
    pub hero: Vec<ScoredTitle>,
    pub trending: Vec<ScoredTitle>,
}

impl InspectionReport {
    pub fn is_empty(&self) -> bool {
        self.sampled == 0
    }
}

pub async fn build_inspection_report(
    service: &ContentRankingService,
    store: &dyn PostStore,
    limit: usize,
    trending_hours: i64,
    now: DateTime<Utc>,
) -> Result<InspectionReport> {
    let sample = store
        .query(&PostQuery::qualifying(now).limit(INSPECTION_SAMPLE_SIZE))
        .await?;
    let sampled = sample.len();

    let mut top = service.rank_for_anonymous_user(sample, now).await?;
    top.truncate(limit);

    let mut ranked = Vec::with_capacity(top.len());
    for (index, post) in top.iter().enumerate() {
        ranked.push(RankedEntry {
            rank: index + 1,
            id: post.id,
            title: post.title.clone(),
            domain: source_domain(post.source_url.as_deref()),
            score: service.calculate_content_score(post, now).await?,
            views: post.views_count,
            likes: post.likes_count,
            published_at: post.published_at,
        });
    }

    let top_breakdown = match top.first() {
        Some(post) => Some(service.get_score_breakdown(post, now).await?),
        None => None,
    };

    let hero = service.get_hero_content(SHOWCASE_SIZE, now).await?;
    let trending = service
        .get_trending_posts(SHOWCASE_SIZE, trending_hours, now)
        .await?;

    Ok(InspectionReport {
        generated_at: now,
        sampled,
        ranked,
        top_breakdown,
        hero: scored_titles(service, &hero, now).await?,
        trending: scored_titles(service, &trending, now).await?,
    })
}

async fn scored_titles(
    service: &ContentRankingService,
    posts: &[Post],
    now: DateTime<Utc>,
) -> Result<Vec<ScoredTitle>> {
    let mut titles = Vec::with_capacity(posts.len());
    for post in posts {
        titles.push(ScoredTitle {
            id: post.id,
            title: post.title.clone(),
            score: service.calculate_content_score(post, now).await?,
        });
    }
    Ok(titles)
}

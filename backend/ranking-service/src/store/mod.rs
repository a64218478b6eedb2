//! Post store port
//!
//! Read/write access to posts, kept behind a trait so the ranking engine can
//! run against Postgres in production and an in-memory store in tests.

mod memory;
mod postgres;

pub use memory::InMemoryPostStore;
pub use postgres::PgPostStore;

use crate::error::StoreError;
use crate::models::{Post, PostId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOrder {
    /// Persisted score descending, NULLs last, newer first on ties.
    RankingScoreDesc,
    None,
}

/// Selects qualifying posts: published with `published_at <= published_before`.
#[derive(Debug, Clone, PartialEq)]
pub struct PostQuery {
    pub published_before: DateTime<Utc>,
    pub published_after: Option<DateTime<Utc>>,
    pub order: PostOrder,
    pub limit: Option<usize>,
}

impl PostQuery {
    pub fn qualifying(now: DateTime<Utc>) -> Self {
        Self {
            published_before: now,
            published_after: None,
            order: PostOrder::None,
            limit: None,
        }
    }

    pub fn since(mut self, after: DateTime<Utc>) -> Self {
        self.published_after = Some(after);
        self
    }

    pub fn order_by(mut self, order: PostOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Qualifying post counts grouped by raw `source_url`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceCounts {
    /// All qualifying posts, sourced or not.
    pub total: u64,
    /// Only non-empty source URLs.
    pub by_source_url: Vec<(String, u64)>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn query(&self, query: &PostQuery) -> Result<Vec<Post>, StoreError>;

    async fn write_score(
        &self,
        post_id: PostId,
        score: f64,
        calculated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Qualifying posts whose score was never computed or computed before
    /// `stale_before`. `None` returns every qualifying post.
    async fn stale_scores(
        &self,
        now: DateTime<Utc>,
        stale_before: Option<DateTime<Utc>>,
    ) -> Result<Vec<Post>, StoreError>;

    async fn count_by_source(&self, now: DateTime<Utc>) -> Result<SourceCounts, StoreError>;
}

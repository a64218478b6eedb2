use super::{PostOrder, PostQuery, PostStore, SourceCounts};
use crate::error::StoreError;
use crate::models::{Post, PostId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-process post store with the same query semantics as `PgPostStore`.
///
/// Counts read calls and can simulate an outage, which is what the service
/// and job tests need to observe caching and error propagation.
pub struct InMemoryPostStore {
    posts: RwLock<Vec<Post>>,
    available: AtomicBool,
    reads: AtomicUsize,
}

impl Default for InMemoryPostStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::with_posts(Vec::new())
    }

    pub fn with_posts(posts: Vec<Post>) -> Self {
        Self {
            posts: RwLock::new(posts),
            available: AtomicBool::new(true),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn insert(&self, post: Post) {
        self.write_lock().push(post);
    }

    pub fn get(&self, id: PostId) -> Option<Post> {
        self.read_lock().iter().find(|p| p.id == id).cloned()
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, AtomicOrdering::SeqCst);
    }

    /// Number of read calls served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(AtomicOrdering::SeqCst)
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, Vec<Post>> {
        self.posts.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, Vec<Post>> {
        self.posts.write().unwrap_or_else(|e| e.into_inner())
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(AtomicOrdering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store offline".to_string()))
        }
    }

    fn begin_read(&self) -> Result<(), StoreError> {
        self.check_available()?;
        self.reads.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(())
    }
}

fn newer_first(a: &Post, b: &Post) -> Ordering {
    // None sorts before Some, so reversing puts unpublished last
    b.published_at.cmp(&a.published_at)
}

fn score_desc(a: &Post, b: &Post) -> Ordering {
    match (a.ranking_score, b.ranking_score) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn query(&self, query: &PostQuery) -> Result<Vec<Post>, StoreError> {
        self.begin_read()?;

        let mut posts: Vec<Post> = self
            .read_lock()
            .iter()
            .filter(|p| p.is_published(query.published_before))
            .filter(|p| match (query.published_after, p.published_at) {
                (Some(after), Some(at)) => at >= after,
                _ => true,
            })
            .cloned()
            .collect();

        match query.order {
            PostOrder::RankingScoreDesc => {
                posts.sort_by(|a, b| score_desc(a, b).then_with(|| newer_first(a, b)))
            }
            PostOrder::None => {}
        }

        if let Some(limit) = query.limit {
            posts.truncate(limit);
        }
        Ok(posts)
    }

    async fn write_score(
        &self,
        post_id: PostId,
        score: f64,
        calculated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.check_available()?;

        if let Some(post) = self.write_lock().iter_mut().find(|p| p.id == post_id) {
            post.ranking_score = Some(score);
            post.ranking_calculated_at = Some(calculated_at);
        }
        Ok(())
    }

    async fn stale_scores(
        &self,
        now: DateTime<Utc>,
        stale_before: Option<DateTime<Utc>>,
    ) -> Result<Vec<Post>, StoreError> {
        self.begin_read()?;

        Ok(self
            .read_lock()
            .iter()
            .filter(|p| p.is_published(now))
            .filter(|p| match (stale_before, p.ranking_calculated_at) {
                (None, _) | (Some(_), None) => true,
                (Some(cutoff), Some(at)) => at < cutoff,
            })
            .cloned()
            .collect())
    }

    async fn count_by_source(&self, now: DateTime<Utc>) -> Result<SourceCounts, StoreError> {
        self.begin_read()?;

        let mut counts = SourceCounts::default();
        let mut grouped: BTreeMap<String, u64> = BTreeMap::new();
        for post in self.read_lock().iter().filter(|p| p.is_published(now)) {
            counts.total += 1;
            if let Some(url) = post.source_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
                *grouped.entry(url.to_string()).or_default() += 1;
            }
        }
        counts.by_source_url = grouped.into_iter().collect();

        Ok(counts)
    }
}

use chrono::{DateTime, Duration, TimeZone, Utc};
use content_cache::{ContentCache, ManualClock, MemoryCache};
use content_ranking::jobs::{ScoreBatchConfig, ScoreBatchJob};
use content_ranking::{
    ContentRankingService, DomainAuthorityTable, InMemoryPostStore, Post, PostStatus,
    PostStore, RankingConfig, RankingError, RankingWeights,
};
use std::sync::Arc;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 18, 12, 0, 0).unwrap()
}

fn post(id: i64, source: &str, hours_old: i64, views: u64, likes: u64) -> Post {
    Post {
        id,
        title: format!("Article {id}"),
        status: PostStatus::Published,
        source_url: Some(source.to_string()),
        published_at: Some(now() - Duration::hours(hours_old)),
        views_count: views,
        likes_count: likes,
        ranking_score: None,
        ranking_calculated_at: None,
    }
}

struct Harness {
    store: Arc<InMemoryPostStore>,
    cache: Arc<MemoryCache>,
    clock: ManualClock,
    service: Arc<ContentRankingService>,
}

fn harness(posts: Vec<Post>, weights: RankingWeights) -> Harness {
    let store = Arc::new(InMemoryPostStore::with_posts(posts));
    let clock = ManualClock::new(now());
    let cache = Arc::new(MemoryCache::with_clock(Arc::new(clock.clone())));
    let config = RankingConfig {
        weights,
        ..RankingConfig::default()
    };
    let service = Arc::new(ContentRankingService::new(
        store.clone(),
        ContentCache::new(cache.clone()),
        Arc::new(DomainAuthorityTable::default()),
        config,
    ));

    Harness {
        store,
        cache,
        clock,
        service,
    }
}

fn ids(posts: &[Post]) -> Vec<i64> {
    posts.iter().map(|p| p.id).collect()
}

#[tokio::test]
async fn test_official_source_outranks_unknown_blog() {
    let h = harness(Vec::new(), RankingWeights::three_factor());
    let official = post(1, "https://laravel.com/blog/laravel-12", 1, 100, 10);
    let unknown = post(2, "https://unknown-blog.com/laravel-12", 1, 100, 10);

    let official_score = h.service.calculate_content_score(&official, now()).await.unwrap();
    let unknown_score = h.service.calculate_content_score(&unknown, now()).await.unwrap();
    assert!(official_score > unknown_score);

    let ranked = h
        .service
        .rank_for_anonymous_user(vec![unknown, official], now())
        .await
        .unwrap();
    assert_eq!(ids(&ranked), vec![1, 2]);
}

#[tokio::test]
async fn test_hero_content_only_keeps_strong_posts() {
    let posts = vec![
        post(1, "https://laravel.com/a", 1, 100, 10),
        post(2, "https://laracasts.com/b", 2, 80, 8),
        post(3, "https://freek.dev/c", 3, 60, 6),
        post(4, "https://spatie.be/d", 30, 10, 1),
        post(5, "https://medium.com/e", 50, 5, 0),
        post(6, "https://unknown-blog.com/f", 60, 0, 0),
        post(7, "https://blog.example.com/g", 100, 2, 0),
        post(8, "https://dev.to/h", 150, 0, 0),
        post(9, "https://laravel-news.com/i", 4, 90, 9),
        post(10, "https://stitcher.io/j", 5, 70, 7),
        // Outside the seven day window
        post(11, "https://laravel.com/old", 24 * 8, 1000, 100),
    ];
    let h = harness(posts, RankingWeights::three_factor());

    let hero = h.service.get_hero_content(3, now()).await.unwrap();

    assert!(!hero.is_empty());
    assert!(hero.len() <= 3);
    assert!(hero.iter().all(|p| p.id != 11));
    for p in &hero {
        let score = h.service.calculate_content_score(p, now()).await.unwrap();
        assert!(score >= 7.0, "post {} scored {score}", p.id);
    }
}

#[tokio::test]
async fn test_hero_content_is_cached_for_ten_minutes() {
    let h = harness(
        vec![post(1, "https://laravel.com/a", 1, 100, 10)],
        RankingWeights::three_factor(),
    );

    let first = h.service.get_hero_content(3, now()).await.unwrap();
    assert_eq!(ids(&first), vec![1]);

    h.store.insert(post(2, "https://laracasts.com/b", 2, 80, 8));
    let reads = h.store.read_count();

    h.clock.advance(Duration::seconds(599));
    let cached = h.service.get_hero_content(3, now()).await.unwrap();
    assert_eq!(ids(&cached), vec![1]);
    assert_eq!(h.store.read_count(), reads);

    h.clock.advance(Duration::seconds(2));
    let refreshed = h.service.get_hero_content(3, now()).await.unwrap();
    assert!(refreshed.iter().any(|p| p.id == 2), "{:?}", ids(&refreshed));
    assert!(h.store.read_count() > reads);
}

#[tokio::test]
async fn test_trending_filters_and_caches() {
    let posts = vec![
        post(1, "https://laravel.com/a", 2, 50, 0),
        post(2, "https://spatie.be/b", 3, 1, 3),
        post(3, "https://freek.dev/c", 4, 3, 1),
        post(4, "https://laracasts.com/d", 30, 500, 50),
    ];
    let h = harness(posts, RankingWeights::three_factor());

    let first = h.service.get_trending_posts(10, 24, now()).await.unwrap();
    let mut first_ids = ids(&first);
    first_ids.sort_unstable();
    // Post 3 lacks traction; post 4 is outside the window
    assert_eq!(first_ids, vec![1, 2]);

    h.store.insert(post(5, "https://stitcher.io/e", 1, 400, 40));
    let reads = h.store.read_count();
    let cached = h.service.get_trending_posts(10, 24, now()).await.unwrap();
    assert_eq!(ids(&cached), ids(&first));
    assert_eq!(h.store.read_count(), reads);

    // A different window is a different entry
    let wider = h.service.get_trending_posts(10, 48, now()).await.unwrap();
    assert!(wider.iter().any(|p| p.id == 4));

    h.clock.advance(Duration::seconds(301));
    let refreshed = h.service.get_trending_posts(10, 24, now()).await.unwrap();
    assert!(refreshed.iter().any(|p| p.id == 5));
}

#[tokio::test]
async fn test_anonymous_feed_spreads_sources() {
    let mut posts = Vec::new();
    for (id, score) in [(1, 9.0), (2, 8.5), (3, 8.0), (4, 7.5)] {
        let mut p = post(id, "https://stitcher.io/blog", 1, 0, 0);
        p.ranking_score = Some(score);
        posts.push(p);
    }
    let mut other = post(5, "https://spatie.be/blog", 1, 0, 0);
    other.ranking_score = Some(3.0);
    posts.push(other);
    let h = harness(posts, RankingWeights::three_factor());

    let feed = h.service.get_ranked_posts_for_anonymous_user(4, now()).await.unwrap();

    assert_eq!(ids(&feed), vec![1, 2, 5, 3]);
}

#[tokio::test]
async fn test_single_source_inventory_keeps_every_post() {
    let posts: Vec<Post> = (1..=5)
        .map(|id| post(id, "https://stitcher.io/blog", id, 0, 0))
        .collect();
    let h = harness(Vec::new(), RankingWeights::three_factor());

    let result = h.service.apply_source_diversity(posts, 5);

    assert_eq!(ids(&result), vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_dominant_source_is_penalized_with_diversity_weight() {
    let mut posts: Vec<Post> = (1..=8)
        .map(|id| post(id, "https://stitcher.io/blog", 2, 10, 1))
        .collect();
    posts.push(post(9, "https://spatie.be/blog", 2, 10, 1));
    posts.push(post(10, "https://spatie.be/other", 2, 10, 1));
    let h = harness(posts, RankingWeights::four_factor());

    let distribution = h.service.get_source_distribution(now()).await.unwrap();
    assert!((distribution["stitcher.io"].percentage - 80.0).abs() < 1e-9);

    let stitcher = h.store.get(1).unwrap();
    let breakdown = h.service.get_score_breakdown(&stitcher, now()).await.unwrap();
    assert_eq!(breakdown.source_diversity.map(|d| d.signal.score), Some(2.0));

    // Distribution is served from cache on later scoring calls
    let reads = h.store.read_count();
    for id in 1..=10 {
        let p = h.store.get(id).unwrap();
        h.service.calculate_content_score(&p, now()).await.unwrap();
    }
    assert_eq!(h.store.read_count(), reads);
}

#[tokio::test]
async fn test_scores_are_deterministic() {
    let h = harness(Vec::new(), RankingWeights::four_factor());
    let p = post(1, "https://www.Medium.com/@someone/post", 40, 321, 17);

    let first = h.service.calculate_content_score(&p, now()).await.unwrap();
    for _ in 0..5 {
        let again = h.service.calculate_content_score(&p, now()).await.unwrap();
        assert!((again - first).abs() < 1e-9);
    }
}

#[tokio::test]
async fn test_collaborator_outages_are_distinct_errors() {
    let h = harness(vec![post(1, "https://laravel.com/a", 1, 50, 5)], RankingWeights::three_factor());

    h.store.set_available(false);
    let err = h.service.get_hero_content(3, now()).await.unwrap_err();
    assert!(matches!(err, RankingError::StoreUnavailable(_)));

    h.store.set_available(true);
    h.cache.set_available(false);
    let err = h.service.get_hero_content(3, now()).await.unwrap_err();
    assert!(matches!(err, RankingError::CacheUnavailable(_)));
}

#[tokio::test]
async fn test_score_batch_job_refreshes_stale_scores() {
    let h = harness(
        vec![
            post(1, "https://laravel.com/a", 1, 100, 10),
            post(2, "https://unknown-blog.com/b", 5, 10, 0),
        ],
        RankingWeights::three_factor(),
    );
    let store: Arc<dyn PostStore> = h.store.clone();
    let job = ScoreBatchJob::new(
        ScoreBatchConfig::default(),
        h.service.clone(),
        store,
        Arc::new(h.clock.clone()),
    );

    let stats = job.run_once(now()).await.unwrap();
    assert_eq!(stats.posts_succeeded, 2);

    let scored = h.store.get(1).unwrap();
    assert_eq!(scored.ranking_calculated_at, Some(now()));
    let expected = h.service.calculate_content_score(&scored, now()).await.unwrap();
    assert!((scored.ranking_score.unwrap() - expected).abs() < 1e-9);

    // Fresh scores are skipped until they age past the stale window
    assert_eq!(job.run_once(now() + Duration::hours(1)).await.unwrap().posts_processed, 0);
    assert_eq!(job.run_once(now() + Duration::hours(7)).await.unwrap().posts_processed, 2);
}

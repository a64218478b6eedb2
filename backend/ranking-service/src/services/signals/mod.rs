//! Signal Calculators
//!
//! Pure functions of a post and an explicit `now`. Every signal lives on a
//! 0 to 10 scale so the configured weights are directly comparable.

use crate::models::{Post, SourceDistribution};
use crate::services::authority::normalize_domain;
use crate::utils::exponential_decay;
use chrono::{DateTime, Utc};

pub const MAX_SIGNAL_SCORE: f64 = 10.0;

/// Posts younger than this keep the full recency score.
const FRESH_HOURS: f64 = 24.0;
/// End of the slow first-week decay.
const WEEK_HOURS: f64 = 168.0;
/// Tail time constant after the first week (30 days).
const TAIL_HOURS: f64 = 24.0 * 30.0;

/// Diversity score for sources the distribution has never seen.
pub const NEUTRAL_DIVERSITY_SCORE: f64 = 5.0;

pub fn recency_score(post: &Post, now: DateTime<Utc>) -> f64 {
    let Some(hours) = post.hours_since_publish(now) else {
        return 0.0;
    };
    let hours = hours as f64;

    if hours <= FRESH_HOURS {
        MAX_SIGNAL_SCORE
    } else if hours <= WEEK_HOURS {
        MAX_SIGNAL_SCORE * exponential_decay(hours - FRESH_HOURS, WEEK_HOURS)
    } else {
        3.0 * exponential_decay(hours - WEEK_HOURS, TAIL_HOURS)
    }
}

/// Likes per 100 views; 0 when there are no views.
pub fn engagement_rate(post: &Post) -> f64 {
    if post.views_count == 0 {
        return 0.0;
    }
    post.likes_count as f64 / post.views_count as f64 * 100.0
}

pub fn engagement_score(post: &Post, now: DateTime<Utc>) -> f64 {
    let hours_live = post.hours_since_publish(now).unwrap_or(1).max(1) as f64;

    let view_velocity = post.views_count as f64 / hours_live;
    let like_velocity = post.likes_count as f64 / hours_live;

    // Likes are weighted ten times a view
    let raw = view_velocity * 0.4 + like_velocity * 10.0 * 0.4 + engagement_rate(post) * 0.2;

    ((raw + 1.0).ln() * 2.0).clamp(0.0, MAX_SIGNAL_SCORE)
}

/// Step function over a source's share of all published posts.
pub fn diversity_score_for_percentage(percentage: f64) -> f64 {
    if percentage > 50.0 {
        2.0
    } else if percentage > 20.0 {
        4.0
    } else if percentage > 10.0 {
        6.0
    } else if percentage > 5.0 {
        7.0
    } else {
        9.0
    }
}

/// Boosts under-represented sources, penalizes dominant ones.
pub fn source_diversity_score(post: &Post, distribution: &SourceDistribution) -> f64 {
    if !post.has_source() {
        return NEUTRAL_DIVERSITY_SCORE;
    }

    let domain = normalize_domain(post.source_url.as_deref().unwrap_or_default());
    distribution
        .get(&domain)
        .map(|stat| diversity_score_for_percentage(stat.percentage))
        .unwrap_or(NEUTRAL_DIVERSITY_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PostStatus, SourceStat};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 18, 12, 0, 0).unwrap()
    }

    fn post_aged(hours: i64, views: u64, likes: u64) -> Post {
        Post {
            id: 1,
            title: "Queues in depth".to_string(),
            status: PostStatus::Published,
            source_url: Some("https://stitcher.io/blog/queues".to_string()),
            published_at: Some(now() - Duration::hours(hours)),
            views_count: views,
            likes_count: likes,
            ranking_score: None,
            ranking_calculated_at: None,
        }
    }

    #[test]
    fn test_recency_bands() {
        assert_eq!(recency_score(&post_aged(0, 0, 0), now()), 10.0);
        assert_eq!(recency_score(&post_aged(24, 0, 0), now()), 10.0);

        let day_two = recency_score(&post_aged(48, 0, 0), now());
        assert!((day_two - 10.0 * (-24.0f64 / 168.0).exp()).abs() < 1e-9);

        let week = recency_score(&post_aged(168, 0, 0), now());
        assert!((week - 10.0 * (-144.0f64 / 168.0).exp()).abs() < 1e-9);

        let month = recency_score(&post_aged(168 + 720, 0, 0), now());
        assert!((month - 3.0 * (-1.0f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn test_recency_is_zero_when_unpublished() {
        let mut post = post_aged(1, 0, 0);
        post.published_at = None;
        assert_eq!(recency_score(&post, now()), 0.0);
    }

    #[test]
    fn test_recency_never_increases_with_age() {
        let mut previous = f64::INFINITY;
        for hours in (0..2000).step_by(7) {
            let score = recency_score(&post_aged(hours, 0, 0), now());
            assert!(score <= previous, "recency rose at {hours}h");
            previous = score;
        }
    }

    #[test]
    fn test_engagement_formula() {
        // 1h old, 100 views, 10 likes: raw = 40 + 40 + 2 = 82
        let score = engagement_score(&post_aged(1, 100, 10), now());
        assert!((score - 83.0f64.ln() * 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_engagement_caps_at_ten() {
        let score = engagement_score(&post_aged(1, 1_000_000, 100_000), now());
        assert_eq!(score, MAX_SIGNAL_SCORE);
    }

    #[test]
    fn test_engagement_without_views_or_publish_date() {
        let mut post = post_aged(0, 0, 0);
        assert_eq!(engagement_rate(&post), 0.0);
        assert_eq!(engagement_score(&post, now()), 0.0);

        post.published_at = None;
        post.likes_count = 3;
        // hours_live falls back to 1: raw = 0.4 * 30 = 12
        assert!((engagement_score(&post, now()) - 13.0f64.ln() * 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_diversity_steps() {
        assert_eq!(diversity_score_for_percentage(75.0), 2.0);
        assert_eq!(diversity_score_for_percentage(50.0), 4.0);
        assert_eq!(diversity_score_for_percentage(20.5), 4.0);
        assert_eq!(diversity_score_for_percentage(20.0), 6.0);
        assert_eq!(diversity_score_for_percentage(10.0), 7.0);
        assert_eq!(diversity_score_for_percentage(5.0), 9.0);
        assert_eq!(diversity_score_for_percentage(0.0), 9.0);
    }

    #[test]
    fn test_source_diversity_lookup() {
        let mut distribution = SourceDistribution::new();
        distribution.insert(
            "stitcher.io".to_string(),
            SourceStat {
                count: 60,
                percentage: 60.0,
            },
        );

        let dominant = post_aged(1, 0, 0);
        assert_eq!(source_diversity_score(&dominant, &distribution), 2.0);

        let mut unseen = post_aged(1, 0, 0);
        unseen.source_url = Some("https://www.spatie.be/blog".to_string());
        assert_eq!(source_diversity_score(&unseen, &distribution), NEUTRAL_DIVERSITY_SCORE);

        let mut sourceless = post_aged(1, 0, 0);
        sourceless.source_url = None;
        assert_eq!(source_diversity_score(&sourceless, &distribution), NEUTRAL_DIVERSITY_SCORE);
    }
}

use crate::config::RankingWeights;
use crate::models::{
    AuthorityBreakdown, DiversityBreakdown, EngagementBreakdown, Post, RecencyBreakdown,
    ScoreBreakdown, SignalScore, SourceDistribution,
};
use crate::services::authority::{source_domain, DomainAuthorityTable};
use crate::services::signals::{
    engagement_rate, engagement_score, recency_score, source_diversity_score,
    NEUTRAL_DIVERSITY_SCORE,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Content Scorer
///
/// Pure function of `(post, now, distribution)`. The distribution is only
/// consulted when the diversity weight is active; a missing distribution
/// scores every source as neutral.
#[derive(Clone)]
pub struct ContentScorer {
    weights: RankingWeights,
    authority: Arc<DomainAuthorityTable>,
}

impl ContentScorer {
    pub fn new(weights: RankingWeights, authority: Arc<DomainAuthorityTable>) -> Self {
        Self { weights, authority }
    }

    pub fn weights(&self) -> &RankingWeights {
        &self.weights
    }

    pub fn authority(&self) -> &DomainAuthorityTable {
        &self.authority
    }

    pub fn uses_source_diversity(&self) -> bool {
        self.weights.diversity_weight().is_some()
    }

    pub fn score(
        &self,
        post: &Post,
        now: DateTime<Utc>,
        distribution: Option<&SourceDistribution>,
    ) -> f64 {
        self.signals(post, now, distribution)
            .iter()
            .map(|s| s.weighted_score)
            .sum()
    }

    pub fn breakdown(
        &self,
        post: &Post,
        now: DateTime<Utc>,
        distribution: Option<&SourceDistribution>,
    ) -> ScoreBreakdown {
        let domain = source_domain(post.source_url.as_deref());
        let signals = self.signals(post, now, distribution);
        let total_score = signals.iter().map(|s| s.weighted_score).sum();

        ScoreBreakdown {
            source_authority: AuthorityBreakdown {
                signal: signals[0],
                domain: domain.clone(),
            },
            recency: RecencyBreakdown {
                signal: signals[1],
                hours_old: post.hours_since_publish(now),
            },
            engagement: EngagementBreakdown {
                signal: signals[2],
                views: post.views_count,
                likes: post.likes_count,
                engagement_rate: (engagement_rate(post) * 100.0).round() / 100.0,
            },
            source_diversity: signals
                .get(3)
                .map(|signal| DiversityBreakdown {
                    signal: *signal,
                    domain,
                }),
            total_score,
        }
    }

    /// Authority, recency, engagement, then diversity when active.
    fn signals(
        &self,
        post: &Post,
        now: DateTime<Utc>,
        distribution: Option<&SourceDistribution>,
    ) -> Vec<SignalScore> {
        let mut signals = vec![
            SignalScore::new(
                self.authority.authority_score(post.source_url.as_deref()),
                self.weights.source_authority,
            ),
            SignalScore::new(recency_score(post, now), self.weights.recency),
            SignalScore::new(engagement_score(post, now), self.weights.engagement),
        ];

        if let Some(weight) = self.weights.diversity_weight() {
            let diversity = distribution
                .map(|d| source_diversity_score(post, d))
                .unwrap_or(NEUTRAL_DIVERSITY_SCORE);
            signals.push(SignalScore::new(diversity, weight));
        }

        signals
    }
}

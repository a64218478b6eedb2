use crate::models::Post;
use crate::services::authority::source_domain;
use tracing::debug;

/// Diversity Layer - source-diversity reordering
///
/// Greedy: walk the ranked candidates and defer any post that would make the
/// tail of the output a run longer than `max_consecutive_from_source` from one
/// domain. Deferred posts get a second chance once the tail has moved on, and
/// whatever is still left is appended at the end so no content is dropped.
pub struct DiversityLayer {
    max_consecutive_from_source: usize,
}

impl Default for DiversityLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl DiversityLayer {
    pub fn new() -> Self {
        Self {
            max_consecutive_from_source: 2,
        }
    }

    /// Create with custom consecutive source limit (minimum 1)
    pub fn with_source_limit(max_consecutive: usize) -> Self {
        Self {
            max_consecutive_from_source: max_consecutive.max(1),
        }
    }

    /// Reorder `candidates` so no domain runs longer than the limit, keeping
    /// at most `limit` posts. Output length is `min(limit, candidates.len())`.
    pub fn apply_source_diversity(&self, candidates: Vec<Post>, limit: usize) -> Vec<Post> {
        if limit == 0 || candidates.is_empty() {
            return Vec::new();
        }

        let mut selected: Vec<(String, Post)> = Vec::with_capacity(limit.min(candidates.len()));
        // Buckets keep first-deferral order; posts inside keep input order.
        let mut deferred: Vec<(String, Vec<Post>)> = Vec::new();

        for post in candidates {
            if selected.len() >= limit {
                break;
            }

            let domain = source_domain(post.source_url.as_deref());
            if self.violates_source_diversity(&selected, &domain) {
                match deferred.iter_mut().find(|(d, _)| *d == domain) {
                    Some((_, bucket)) => bucket.push(post),
                    None => deferred.push((domain, vec![post])),
                }
            } else {
                selected.push((domain, post));
            }
        }

        // Second chance for deferred posts now that the tail may have changed
        let mut leftovers: Vec<(String, Post)> = Vec::new();
        for (domain, bucket) in deferred {
            for post in bucket {
                if selected.len() < limit && !self.violates_source_diversity(&selected, &domain) {
                    selected.push((domain.clone(), post));
                } else {
                    leftovers.push((domain.clone(), post));
                }
            }
        }

        if selected.len() < limit && !leftovers.is_empty() {
            debug!(
                shortfall = limit - selected.len(),
                leftovers = leftovers.len(),
                "Backfilling deferred posts; inventory lacks source variety"
            );
            let room = limit - selected.len();
            selected.extend(leftovers.into_iter().take(room));
        }

        selected.into_iter().map(|(_, post)| post).collect()
    }

    /// Last N domains of the output, newest first
    fn get_recent_sources<'a>(&self, selected: &'a [(String, Post)]) -> Vec<&'a str> {
        selected
            .iter()
            .rev()
            .take(self.max_consecutive_from_source)
            .map(|(domain, _)| domain.as_str())
            .collect()
    }

    /// Appending `domain` would extend a run that is already at the limit
    fn violates_source_diversity(&self, selected: &[(String, Post)], domain: &str) -> bool {
        let recent = self.get_recent_sources(selected);
        if recent.len() < self.max_consecutive_from_source {
            return false;
        }
        recent.iter().all(|d| *d == domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostStatus;

    fn post(id: i64, source: Option<&str>) -> Post {
        Post {
            id,
            title: format!("post {id}"),
            status: PostStatus::Published,
            source_url: source.map(str::to_string),
            published_at: None,
            views_count: 0,
            likes_count: 0,
            ranking_score: None,
            ranking_calculated_at: None,
        }
    }

    fn ids(posts: &[Post]) -> Vec<i64> {
        posts.iter().map(|p| p.id).collect()
    }

    fn assert_no_long_runs(posts: &[Post]) {
        for window in posts.windows(3) {
            let domains: Vec<String> = window
                .iter()
                .map(|p| source_domain(p.source_url.as_deref()))
                .collect();
            assert!(
                !(domains[0] == domains[1] && domains[1] == domains[2]),
                "three consecutive posts from {}",
                domains[0]
            );
        }
    }

    #[test]
    fn test_third_consecutive_source_is_deferred() {
        let layer = DiversityLayer::new();
        let posts = vec![
            post(1, Some("https://laravel.com/a")),
            post(2, Some("https://laravel.com/b")),
            post(3, Some("https://www.laravel.com/c")),
            post(4, Some("https://freek.dev/d")),
        ];

        let result = layer.apply_source_diversity(posts, 4);

        assert_eq!(ids(&result), vec![1, 2, 4, 3]);
        assert_no_long_runs(&result);
    }

    #[test]
    fn test_invariant_holds_when_inventory_allows() {
        let layer = DiversityLayer::new();
        let sources = [
            "https://stitcher.io/1",
            "https://stitcher.io/2",
            "https://stitcher.io/3",
            "https://stitcher.io/4",
            "https://spatie.be/1",
            "https://freek.dev/1",
            "https://spatie.be/2",
            "https://laravel.com/1",
        ];
        let posts: Vec<Post> = sources
            .iter()
            .enumerate()
            .map(|(i, s)| post(i as i64 + 1, Some(*s)))
            .collect();

        let result = layer.apply_source_diversity(posts, 8);

        assert_eq!(ids(&result), vec![1, 2, 5, 6, 7, 8, 3, 4]);
        assert_no_long_runs(&result);
    }

    #[test]
    fn test_single_source_inventory_is_returned_in_order() {
        let layer = DiversityLayer::new();
        let posts: Vec<Post> = (1..=5)
            .map(|i| post(i, Some("https://stitcher.io/blog")))
            .collect();

        let result = layer.apply_source_diversity(posts, 5);

        assert_eq!(ids(&result), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_limit_truncates_and_zero_is_empty() {
        let layer = DiversityLayer::new();
        let posts: Vec<Post> = (1..=6)
            .map(|i| post(i, Some(if i % 2 == 0 { "https://a.com" } else { "https://b.com" })))
            .collect();

        assert_eq!(ids(&layer.apply_source_diversity(posts.clone(), 3)), vec![1, 2, 3]);
        assert!(layer.apply_source_diversity(posts, 0).is_empty());
        assert!(layer.apply_source_diversity(Vec::new(), 5).is_empty());
    }

    #[test]
    fn test_missing_sources_share_the_unknown_bucket() {
        let layer = DiversityLayer::new();
        let posts = vec![
            post(1, None),
            post(2, Some("")),
            post(3, Some("not a url")),
            post(4, Some("https://laracasts.com/series")),
        ];

        let result = layer.apply_source_diversity(posts, 4);

        assert_eq!(ids(&result), vec![1, 2, 4, 3]);
    }

    #[test]
    fn test_with_source_limit() {
        let layer = DiversityLayer::with_source_limit(1);
        let posts = vec![
            post(1, Some("https://a.com")),
            post(2, Some("https://a.com")),
            post(3, Some("https://b.com")),
        ];

        let result = layer.apply_source_diversity(posts, 3);

        assert_eq!(ids(&result), vec![1, 3, 2]);
    }
}

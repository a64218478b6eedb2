//! Cache key schema for ranking results
//!
//! Key format: v{VERSION}:{entity}:{identifier}[:sub_key]

/// Cache schema version - increment when changing key formats or payload shapes
pub const CACHE_VERSION: u32 = 1;

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Trending window cache
    /// Format: v1:trending:{limit}:{window_hours}
    pub fn trending(limit: usize, window_hours: i64) -> String {
        format!("v{}:trending:{}:{}", CACHE_VERSION, limit, window_hours)
    }

    /// Hero content cache
    /// Format: v1:hero:{limit}
    pub fn hero(limit: usize) -> String {
        format!("v{}:hero:{}", CACHE_VERSION, limit)
    }

    /// Process-wide source distribution aggregate
    /// Format: v1:source_distribution
    pub fn source_distribution() -> String {
        format!("v{}:source_distribution", CACHE_VERSION)
    }

    /// Extract entity type from key
    pub fn entity_type(key: &str) -> Option<&str> {
        let mut parts = key.split(':');
        match (parts.next(), parts.next()) {
            (Some(_), Some(entity)) => Some(entity),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trending_key_includes_window() {
        assert_eq!(CacheKey::trending(10, 24), "v1:trending:10:24");
        assert_ne!(CacheKey::trending(10, 24), CacheKey::trending(10, 48));
        assert_ne!(CacheKey::trending(10, 24), CacheKey::trending(5, 24));
    }

    #[test]
    fn test_hero_key() {
        assert_eq!(CacheKey::hero(3), "v1:hero:3");
    }

    #[test]
    fn test_entity_type() {
        assert_eq!(CacheKey::entity_type("v1:trending:10:24"), Some("trending"));
        assert_eq!(
            CacheKey::entity_type(&CacheKey::source_distribution()),
            Some("source_distribution")
        );
        assert_eq!(CacheKey::entity_type("invalid"), None);
    }
}

use crate::services::authority::{AuthorityTableError, DomainAuthorityTable};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error(transparent)]
    AuthorityTable(#[from] AuthorityTableError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub ranking: RankingConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub service_name: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// Signal weights. Weights need not sum to 1, but the presets do.
///
/// `source_diversity` of `None` (or zero) disables the diversity signal and
/// with it every read of the source-distribution cache.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingWeights {
    pub source_authority: f64,
    pub recency: f64,
    pub engagement: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_diversity: Option<f64>,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self::three_factor()
    }
}

impl RankingWeights {
    /// Authority / recency / engagement.
    pub fn three_factor() -> Self {
        Self {
            source_authority: 0.4,
            recency: 0.3,
            engagement: 0.3,
            source_diversity: None,
        }
    }

    /// Adds source diversity and rebalances the other three.
    pub fn four_factor() -> Self {
        Self {
            source_authority: 0.35,
            recency: 0.3,
            engagement: 0.25,
            source_diversity: Some(0.1),
        }
    }

    /// Active diversity weight, if any.
    pub fn diversity_weight(&self) -> Option<f64> {
        self.source_diversity.filter(|w| *w > 0.0)
    }
}

/// Cache windows in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingCacheTtls {
    pub trending_ttl: u64,
    pub hero_ttl: u64,
    pub distribution_ttl: u64,
}

impl Default for RankingCacheTtls {
    fn default() -> Self {
        Self {
            trending_ttl: content_cache::ttl::TRENDING,
            hero_ttl: content_cache::ttl::HERO,
            distribution_ttl: content_cache::ttl::SOURCE_DISTRIBUTION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingThresholds {
    pub hero_content_score: f64,
    pub hero_window_days: i64,
    pub trending_min_views: u64,
    pub trending_min_likes: u64,
    pub trending_hours: i64,
    /// Candidates fetched per requested slot for the anonymous feed.
    pub overfetch_factor: usize,
}

impl Default for RankingThresholds {
    fn default() -> Self {
        Self {
            hero_content_score: 7.0,
            hero_window_days: 7,
            trending_min_views: 10,
            trending_min_likes: 2,
            trending_hours: 24,
            overfetch_factor: 3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RankingConfig {
    pub weights: RankingWeights,
    pub cache: RankingCacheTtls,
    pub thresholds: RankingThresholds,
    pub authority_table_path: Option<PathBuf>,
}

fn env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        _ => Ok(default),
    }
}

fn env_opt<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        _ => Ok(None),
    }
}

impl RankingConfig {
    /// Table from `authority_table_path`, or the built-in one when unset.
    pub fn load_authority_table(&self) -> Result<DomainAuthorityTable, ConfigError> {
        match &self.authority_table_path {
            Some(path) => Ok(DomainAuthorityTable::load_from_file(path)?),
            None => Ok(DomainAuthorityTable::default()),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = RankingConfig::default();

        Ok(RankingConfig {
            weights: RankingWeights {
                source_authority: env_or(
                    "RANKING_WEIGHT_SOURCE",
                    defaults.weights.source_authority,
                )?,
                recency: env_or("RANKING_WEIGHT_RECENCY", defaults.weights.recency)?,
                engagement: env_or("RANKING_WEIGHT_ENGAGEMENT", defaults.weights.engagement)?,
                source_diversity: env_opt("RANKING_WEIGHT_DIVERSITY")?,
            },
            cache: RankingCacheTtls {
                trending_ttl: env_or("RANKING_CACHE_TRENDING_TTL", defaults.cache.trending_ttl)?,
                hero_ttl: env_or("RANKING_CACHE_HERO_TTL", defaults.cache.hero_ttl)?,
                distribution_ttl: env_or(
                    "RANKING_CACHE_DISTRIBUTION_TTL",
                    defaults.cache.distribution_ttl,
                )?,
            },
            thresholds: RankingThresholds {
                hero_content_score: env_or(
                    "RANKING_HERO_THRESHOLD",
                    defaults.thresholds.hero_content_score,
                )?,
                hero_window_days: env_or("RANKING_HERO_DAYS", defaults.thresholds.hero_window_days)?,
                trending_min_views: env_or(
                    "RANKING_TRENDING_MIN_VIEWS",
                    defaults.thresholds.trending_min_views,
                )?,
                trending_min_likes: env_or(
                    "RANKING_TRENDING_MIN_LIKES",
                    defaults.thresholds.trending_min_likes,
                )?,
                trending_hours: env_or("RANKING_TRENDING_HOURS", defaults.thresholds.trending_hours)?,
                overfetch_factor: env_or(
                    "RANKING_OVERFETCH_FACTOR",
                    defaults.thresholds.overfetch_factor,
                )?,
            },
            authority_table_path: env_opt::<String>("RANKING_AUTHORITY_TABLE_PATH")?
                .map(PathBuf::from),
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let log_format = match env::var("LOG_FORMAT")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Config {
            service: ServiceConfig {
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "content-ranking".to_string()),
                log_format,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgres://localhost:5432/content".to_string()),
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            },
            ranking: RankingConfig::from_env()?,
        })
    }
}

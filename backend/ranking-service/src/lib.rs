pub mod config;
pub mod error;
pub mod jobs;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

pub use config::{Config, RankingConfig, RankingWeights};
pub use error::{RankingError, Result, StoreError};
pub use models::{Post, PostStatus, ScoreBreakdown, SourceDistribution};
pub use services::{
    ContentRankingService, ContentScorer, DiversityLayer, DomainAuthorityTable,
    RankingConfiguration,
};
pub use store::{InMemoryPostStore, PgPostStore, PostOrder, PostQuery, PostStore};

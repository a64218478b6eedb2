//! Error types for the ranking service
//!
//! Malformed post data never produces an error; scoring falls back to
//! defaults. Only collaborator failures surface here, each as its own kind so
//! callers can tell "backend down" apart from "no content".

use content_cache::CacheError;
use thiserror::Error;

/// Failure reported by a post store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Post store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum RankingError {
    #[error("Post store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(#[source] CacheError),

    #[error("Cache serialization error: {0}")]
    Serialization(#[source] CacheError),
}

impl From<StoreError> for RankingError {
    fn from(err: StoreError) -> Self {
        RankingError::StoreUnavailable(err)
    }
}

impl From<CacheError> for RankingError {
    fn from(err: CacheError) -> Self {
        if err.is_unavailable() {
            RankingError::CacheUnavailable(err)
        } else {
            RankingError::Serialization(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, RankingError>;

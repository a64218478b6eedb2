//! Cache error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),
}

impl CacheError {
    /// True when the backend itself could not be reached, as opposed to a bad payload.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CacheError::Redis(_) | CacheError::Unavailable(_))
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

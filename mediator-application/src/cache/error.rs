use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid cache pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("cache backend: {0}")]
    Backend(String),

    #[error("cache factory failed: {0}")]
    Factory(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

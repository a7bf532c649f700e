//! Error types for cache operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur while reading or writing the audio cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create the cache root directory
    #[error("Failed to create cache directory {path}: {source}")]
    CreateRoot {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Atomic replacement of a cache entry failed
    #[error("Failed to persist cache entry {path}: {reason}")]
    Persist { path: PathBuf, reason: String },
}

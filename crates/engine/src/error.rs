//! Error types for the recitation engine

use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur inside the playback engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Audio decode failure
    #[error("Decode error: {0}")]
    Decode(String),

    /// Audio output device failure
    #[error("Output error: {0}")]
    Output(String),

    /// Seek failure
    #[error("Seek error: {0}")]
    Seek(String),

    /// The media pipeline rejected an operation
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Remote fetch failure
    #[error(transparent)]
    Network(#[from] murattal_network::NetworkError),

    /// Cache failure
    #[error(transparent)]
    Cache(#[from] murattal_cache::CacheError),

    /// Invalid verse coordinates in a play intent
    #[error(transparent)]
    Verse(#[from] murattal_core::VerseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::Decode("bad frame".to_string());
        assert!(err.to_string().contains("bad frame"));
    }
}

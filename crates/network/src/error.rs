// crates/network/src/error.rs
//! Error types for network operations

use thiserror::Error;

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Errors that can occur during network operations
#[derive(Debug, Error)]
pub enum NetworkError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the remote
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed timing payload
    #[error("Invalid timing payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// Custom error
    #[error("{0}")]
    Custom(String),
}

impl NetworkError {
    /// Returns true if the error is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        match self {
            NetworkError::Status { status, .. } => (400..500).contains(status),
            NetworkError::Http(e) => e.status().map(|s| s.is_client_error()).unwrap_or(false),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = NetworkError::Status {
            status: 404,
            reason: "Not Found".to_string(),
        };
        assert!(err.to_string().contains("404"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_server_error_not_client() {
        let err = NetworkError::Status {
            status: 503,
            reason: "Service Unavailable".to_string(),
        };
        assert!(!err.is_client_error());
    }
}

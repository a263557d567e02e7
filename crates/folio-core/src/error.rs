use thiserror::Error;

/// Application-wide error types for Folio.
#[derive(Error, Debug)]
pub enum AppError {
    /// Upstream responded with a non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limit exceeded (HTTP 429), surfaced after the transport gave up.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The requested resource does not exist upstream (HTTP 404 or
    /// an explicit "not found" from a provider).
    #[error("Resource not found")]
    NotFound,

    /// The bibliographic search collaborator failed.
    #[error("Search error: {0}")]
    SearchError(String),

    /// Durable blob store operation failed.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) | AppError::RateLimitExceeded => true,
            AppError::HttpStatus { status, .. } => {
                matches!(status, 429 | 500 | 502 | 503 | 504)
            }
            _ => false,
        }
    }

    /// Returns true if this error is a rate-limit signal. Only these
    /// count toward opening a provider's circuit breaker.
    pub fn is_rate_limit(&self) -> bool {
        matches!(
            self,
            AppError::RateLimitExceeded | AppError::HttpStatus { status: 429, .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(AppError::NetworkError("reset".into()).is_retryable());
        assert!(AppError::Timeout(30).is_retryable());
        assert!(AppError::RateLimitExceeded.is_retryable());
        assert!(
            AppError::HttpStatus {
                status: 503,
                url: "https://api.example.org".into(),
            }
            .is_retryable()
        );
        assert!(
            !AppError::HttpStatus {
                status: 404,
                url: "https://api.example.org".into(),
            }
            .is_retryable()
        );
        assert!(!AppError::NotFound.is_retryable());
        assert!(!AppError::SearchError("bad query".into()).is_retryable());
    }

    #[test]
    fn test_rate_limit_detection() {
        assert!(AppError::RateLimitExceeded.is_rate_limit());
        assert!(
            AppError::HttpStatus {
                status: 429,
                url: "https://api.example.org".into(),
            }
            .is_rate_limit()
        );
        assert!(!AppError::Timeout(10).is_rate_limit());
        assert!(
            !AppError::HttpStatus {
                status: 500,
                url: "https://api.example.org".into(),
            }
            .is_rate_limit()
        );
    }
}

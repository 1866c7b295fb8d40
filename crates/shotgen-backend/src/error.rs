//! Backend error types.

use shotgen_models::ErrorKind;
use thiserror::Error;

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors that can occur while calling a generation backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after_ms: Option<u64>,
    },

    #[error("Server error {0}: {1}")]
    ServerFault(u16, String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Request rejected ({0}): {1}")]
    MalformedRequest(u16, String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl BackendError {
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn malformed_response(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Map a non-success HTTP status to an error.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            401 | 403 => Self::Authentication(body),
            408 => Self::Timeout(body),
            429 => Self::RateLimited {
                message: body,
                retry_after_ms: None,
            },
            500..=599 => Self::ServerFault(status, body),
            _ => Self::MalformedRequest(status, body),
        }
    }

    /// Attach a `Retry-After` hint to a rate-limit error.
    pub fn with_retry_after(self, retry_after_ms: Option<u64>) -> Self {
        match self {
            Self::RateLimited { message, .. } => Self::RateLimited {
                message,
                retry_after_ms,
            },
            other => other,
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BackendError::RateLimited { .. }
                | BackendError::ServerFault(..)
                | BackendError::Network(_)
                | BackendError::Timeout(_)
        )
    }

    /// Server-provided delay before the next attempt, if any.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            BackendError::RateLimited { retry_after_ms, .. } => *retry_after_ms,
            _ => None,
        }
    }

    /// HTTP status associated with this error, if known.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            BackendError::RateLimited { .. } => Some(429),
            BackendError::ServerFault(status, _) => Some(*status),
            BackendError::MalformedRequest(status, _) => Some(*status),
            BackendError::Authentication(_) => Some(401),
            _ => None,
        }
    }

    /// Position in the shared error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BackendError::Authentication(_) => ErrorKind::AuthenticationError,
            BackendError::RateLimited { .. } => ErrorKind::RateLimited,
            BackendError::ServerFault(..) => ErrorKind::ServerFault,
            BackendError::Network(_) => ErrorKind::NetworkError,
            BackendError::Timeout(_) => ErrorKind::Timeout,
            BackendError::MalformedRequest(..) => ErrorKind::MalformedRequest,
            BackendError::MalformedResponse(_) => ErrorKind::ParseError,
            BackendError::Configuration(_) => ErrorKind::ConfigurationError,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout(e.to_string())
        } else if e.is_decode() {
            BackendError::MalformedResponse(e.to_string())
        } else if e.is_builder() {
            // Unusable request URL or headers; retrying cannot help.
            BackendError::Configuration(e.to_string())
        } else {
            BackendError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        BackendError::MalformedResponse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_http_status_429() {
        let err = BackendError::from_http_status(429, "quota");
        assert!(matches!(err, BackendError::RateLimited { .. }));
        assert!(err.is_retryable());
        assert_eq!(err.kind(), ErrorKind::RateLimited);
    }

    #[test]
    fn test_error_from_http_status_5xx() {
        for status in [500, 502, 503, 504] {
            let err = BackendError::from_http_status(status, "boom");
            assert!(matches!(err, BackendError::ServerFault(s, _) if s == status));
            assert!(err.is_retryable(), "{} should be retryable", status);
        }
    }

    #[test]
    fn test_error_from_http_status_auth() {
        for status in [401, 403] {
            let err = BackendError::from_http_status(status, "denied");
            assert!(matches!(err, BackendError::Authentication(_)));
            assert!(!err.is_retryable());
            assert_eq!(err.kind(), ErrorKind::AuthenticationError);
        }
    }

    #[test]
    fn test_error_from_http_status_400() {
        let err = BackendError::from_http_status(400, "bad request");
        assert!(matches!(err, BackendError::MalformedRequest(400, _)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_from_http_status_408() {
        let err = BackendError::from_http_status(408, "slow");
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_retry_after_only_on_rate_limit() {
        let err = BackendError::from_http_status(429, "slow down").with_retry_after(Some(2000));
        assert_eq!(err.retry_after_ms(), Some(2000));

        let err = BackendError::from_http_status(500, "oops").with_retry_after(Some(2000));
        assert_eq!(err.retry_after_ms(), None);
    }

    #[test]
    fn test_malformed_response_maps_to_parse_kind() {
        let err = BackendError::malformed_response("no candidates");
        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_http_status_getter() {
        assert_eq!(
            BackendError::from_http_status(429, "").http_status(),
            Some(429)
        );
        assert_eq!(
            BackendError::ServerFault(502, "bad gateway".into()).http_status(),
            Some(502)
        );
        assert_eq!(BackendError::Network("reset".into()).http_status(), None);
    }
}

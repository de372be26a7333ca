//! Error types for REST API calls

use bitstamp_auth::AuthError;
use bitstamp_types::FailureKind;
use std::time::Duration;

use crate::transport::TransportError;

/// Errors that can occur during a REST call
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// Local call budget exhausted; nothing was sent
    #[error("Rate limit exceeded: {limit} calls per {window:?}")]
    RateLimitExceeded {
        /// Configured calls per window
        limit: u32,
        /// Window length
        window: Duration,
    },

    /// Transport failed before a response arrived
    #[error("Network error: {0}")]
    Network(#[from] TransportError),

    /// Non-2xx HTTP status
    #[error("HTTP {status}: {body}")]
    Http {
        /// Status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Response body was not valid JSON
    #[error("Parse error: {message}")]
    Parse {
        /// Decoder message
        message: String,
        /// Raw response body
        raw: String,
    },

    /// Exchange reported an application-level failure
    #[error("API error: {reason}")]
    Api {
        /// Reason reported by the exchange
        reason: String,
    },

    /// Private endpoint called on a gateway without credentials
    #[error("Authentication required for this endpoint")]
    AuthRequired,

    /// Request body could not be signed or encoded
    #[error("Signing failed: {0}")]
    Signing(#[from] AuthError),

    /// Gateway could not be set up
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CallError {
    /// Failure category for errors produced by a call attempt
    ///
    /// Usage errors (missing credentials, signing, setup) have no category.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::RateLimitExceeded { .. } => Some(FailureKind::RateLimitExceeded),
            Self::Network(_) => Some(FailureKind::NetworkError),
            Self::Http { .. } => Some(FailureKind::HttpError),
            Self::Parse { .. } => Some(FailureKind::ParseError),
            Self::Api { .. } => Some(FailureKind::ApiError),
            Self::AuthRequired | Self::Signing(_) | Self::Config(_) => None,
        }
    }

    /// Whether retrying the same call later could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimitExceeded { .. } | Self::Network(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// HTTP status, when one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for REST calls
pub type CallResult<T> = Result<T, CallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let limited = CallError::RateLimitExceeded {
            limit: 60,
            window: Duration::from_secs(60),
        };
        assert_eq!(limited.kind(), Some(FailureKind::RateLimitExceeded));
        assert!(limited.is_retryable());

        let http = CallError::Http {
            status: 401,
            body: String::new(),
        };
        assert_eq!(http.kind(), Some(FailureKind::HttpError));
        assert_eq!(http.status(), Some(401));
        assert!(!http.is_retryable());

        assert!(CallError::Http {
            status: 503,
            body: String::new()
        }
        .is_retryable());

        assert_eq!(CallError::AuthRequired.kind(), None);
    }

    #[test]
    fn test_display() {
        let err = CallError::Api {
            reason: "Invalid nonce".to_string(),
        };
        assert_eq!(err.to_string(), "API error: Invalid nonce");
    }
}

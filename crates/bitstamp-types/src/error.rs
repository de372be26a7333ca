//! Error taxonomy shared by the REST and streaming clients

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Coarse failure category, the same across REST calls and streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Local call budget exhausted; the request was never sent
    RateLimitExceeded,
    /// Transport failed to complete (connect, reset, timeout)
    NetworkError,
    /// Non-2xx HTTP status
    HttpError,
    /// Response body was not valid JSON
    ParseError,
    /// Well-formed response signalling an application-level failure
    ApiError,
    /// Malformed streaming frame
    SubscriptionError,
}

impl FailureKind {
    /// Returns the kind name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimitExceeded => "RateLimitExceeded",
            Self::NetworkError => "NetworkError",
            Self::HttpError => "HttpError",
            Self::ParseError => "ParseError",
            Self::ApiError => "ApiError",
            Self::SubscriptionError => "SubscriptionError",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the streaming client
#[derive(Error, Debug, Clone)]
pub enum StreamError {
    // === Connection Errors ===
    /// Failed to establish the WebSocket connection
    #[error("Failed to connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    /// Connection attempt timed out
    #[error("Connection timeout after {timeout:?} to {url}")]
    ConnectionTimeout { url: String, timeout: Duration },

    /// WebSocket protocol error on an established connection
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Transport-level reconnection gave up
    #[error("Reconnection attempts exhausted after {attempts} tries")]
    ReconnectExhausted { attempts: u32 },

    // === Protocol Errors ===
    /// Inbound frame could not be parsed
    #[error("Malformed frame: {message}")]
    MalformedFrame { message: String, raw: String },

    /// Outbound control message could not be encoded
    #[error("Failed to encode control message: {0}")]
    Encode(String),

    // === Internal Errors ===
    /// The multiplexer has been closed
    #[error("Stream closed")]
    Closed,
}

impl StreamError {
    /// Failure category of this error
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MalformedFrame { .. } | Self::Encode(_) => FailureKind::SubscriptionError,
            Self::ConnectionFailed { .. }
            | Self::ConnectionTimeout { .. }
            | Self::WebSocket(_)
            | Self::ReconnectExhausted { .. }
            | Self::Closed => FailureKind::NetworkError,
        }
    }

    /// Returns true if the underlying transport may recover by reconnecting
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::ConnectionTimeout { .. } | Self::WebSocket(_)
        )
    }

    /// Create a malformed frame error
    pub fn malformed(message: impl fmt::Display, raw: impl Into<String>) -> Self {
        Self::MalformedFrame {
            message: message.to_string(),
            raw: raw.into(),
        }
    }
}

/// Result type for streaming operations
pub type StreamResult<T> = Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_frame_kind() {
        let err = StreamError::malformed("expected value", "{oops");
        assert_eq!(err.kind(), FailureKind::SubscriptionError);
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("expected value"));
    }

    #[test]
    fn test_connection_errors_are_retryable() {
        let err = StreamError::ConnectionTimeout {
            url: "wss://ws.bitstamp.net".to_string(),
            timeout: Duration::from_millis(1000),
        };
        assert!(err.is_retryable());
        assert_eq!(err.kind(), FailureKind::NetworkError);
        assert!(!StreamError::Closed.is_retryable());
    }
}

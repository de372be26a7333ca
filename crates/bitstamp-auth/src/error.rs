//! Error types for authentication operations

/// Errors that can occur while building signed requests
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Invalid API credentials
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Environment variable not set
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    /// Request parameters were not a flat key/value mapping
    #[error("Request body must be a key/value object, got {0}")]
    NotAMapping(String),

    /// Failed to URL-encode the request body
    #[error("Failed to encode request body: {0}")]
    Encode(String),
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

//! Authentication credentials for Bitstamp API
//!
//! # Security
//!
//! The API secret is stored using the `secrecy` crate which:
//! - Zeroizes memory on drop (prevents memory scanning)
//! - Prevents accidental logging via Debug impl
//! - Provides explicit access via `expose_secret()`

use secrecy::{ExposeSecret, SecretString};

use crate::error::{AuthError, AuthResult};

/// API credentials for authenticated requests
///
/// Immutable once constructed. The secret never leaves this struct except
/// as the key of the request signature.
pub struct Credentials {
    /// API key (public)
    api_key: String,
    /// API secret (zeroized on drop)
    api_secret: SecretString,
    /// Customer ID of the account owning the key
    client_id: String,
}

impl Credentials {
    /// Create new credentials
    ///
    /// # Arguments
    /// * `api_key` - Your Bitstamp API key
    /// * `api_secret` - The secret generated together with the key
    /// * `client_id` - Your Bitstamp customer ID
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        client_id: impl Into<String>,
    ) -> AuthResult<Self> {
        let api_key = api_key.into();
        let api_secret = api_secret.into();
        let client_id = client_id.into();

        if api_key.is_empty() {
            return Err(AuthError::InvalidCredentials("API key is empty".to_string()));
        }
        if api_secret.is_empty() {
            return Err(AuthError::InvalidCredentials("API secret is empty".to_string()));
        }
        if client_id.is_empty() {
            return Err(AuthError::InvalidCredentials("client ID is empty".to_string()));
        }

        Ok(Self {
            api_key,
            api_secret: SecretString::from(api_secret),
            client_id,
        })
    }

    /// Create credentials from environment variables
    ///
    /// Reads `BITSTAMP_API_KEY`, `BITSTAMP_API_SECRET` and `BITSTAMP_CLIENT_ID`.
    pub fn from_env() -> AuthResult<Self> {
        let api_key = read_env("BITSTAMP_API_KEY")?;
        let api_secret = read_env("BITSTAMP_API_SECRET")?;
        let client_id = read_env("BITSTAMP_CLIENT_ID")?;

        Self::new(api_key, api_secret, client_id)
    }

    /// Get the API key
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the customer ID
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Controlled access to the secret for signing
    pub(crate) fn secret_bytes(&self) -> &[u8] {
        self.api_secret.expose_secret().as_bytes()
    }
}

fn read_env(name: &str) -> AuthResult<String> {
    std::env::var(name).map_err(|_| AuthError::EnvVarNotSet(name.to_string()))
}

impl Clone for Credentials {
    /// Clone credentials (creates a new secret container with the same content)
    fn clone(&self) -> Self {
        Self {
            api_key: self.api_key.clone(),
            api_secret: SecretString::from(self.api_secret.expose_secret().to_owned()),
            client_id: self.client_id.clone(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field(
                "api_key",
                &format!("{}...", self.api_key.chars().take(8).collect::<String>()),
            )
            .field("api_secret", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = Credentials::new("abcdefghijkl", "very_secret_value", "123456").unwrap();
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("very_secret_value"));
        assert!(!debug.contains("ijkl"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_debug_truncates_non_ascii_key_on_char_boundary() {
        let creds = Credentials::new("kéykéykéykéy", "secret", "1").unwrap();
        let debug = format!("{:?}", creds);
        assert!(debug.contains("\"kéykéyké...\""));
    }

    #[test]
    fn test_empty_fields_rejected() {
        assert!(Credentials::new("", "secret", "1").is_err());
        assert!(Credentials::new("key", "", "1").is_err());
        assert!(Credentials::new("key", "secret", "").is_err());
    }

    #[test]
    fn test_clone_keeps_secret() {
        let creds = Credentials::new("key", "secret", "42").unwrap();
        let cloned = creds.clone();
        assert_eq!(cloned.api_key(), "key");
        assert_eq!(cloned.client_id(), "42");
        assert_eq!(cloned.secret_bytes(), b"secret");
    }
}

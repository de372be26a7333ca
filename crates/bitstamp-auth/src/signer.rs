//! Signed request bodies

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use tracing::debug;

use crate::credentials::Credentials;
use crate::error::{AuthError, AuthResult};
use crate::nonce::{Clock, Nonce, NonceGenerator};
use crate::params::Params;

type HmacSha256 = Hmac<Sha256>;

/// Produces transport-ready, authenticated POST bodies
///
/// Each body is the caller's parameters plus `key`, `signature` and `nonce`,
/// with absent values dropped, URL-encoded.
#[derive(Debug)]
pub struct RequestSigner {
    credentials: Credentials,
    nonces: NonceGenerator,
}

impl RequestSigner {
    /// Create a signer using the system clock for nonces
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            nonces: NonceGenerator::new(),
        }
    }

    /// Create a signer whose nonces read a custom clock
    pub fn with_clock(credentials: Credentials, clock: Arc<dyn Clock>) -> Self {
        Self {
            credentials,
            nonces: NonceGenerator::with_clock(clock),
        }
    }

    /// Get the API key
    pub fn api_key(&self) -> &str {
        self.credentials.api_key()
    }

    /// Sign parameters with a fresh nonce
    pub fn sign(&self, params: &Params) -> AuthResult<String> {
        let nonce = self.nonces.next();
        self.sign_with_nonce(params, &nonce)
    }

    /// Sign parameters with the given nonce
    ///
    /// Deterministic: the same nonce and parameters always give the same body.
    pub fn sign_with_nonce(&self, params: &Params, nonce: &Nonce) -> AuthResult<String> {
        let signature = self.signature(nonce)?;

        let mut signed = params.clone();
        signed.set("key", Some(self.credentials.api_key().to_string()));
        signed.set("signature", Some(signature));
        signed.set("nonce", Some(nonce.to_string()));

        debug!(nonce = %nonce, fields = signed.len(), "signed request body");
        signed.to_urlencoded()
    }

    /// Compute the request signature for a nonce
    ///
    /// Bitstamp signature algorithm:
    /// 1. message = nonce + client_id + api_key
    /// 2. HMAC-SHA256(api_secret, message)
    /// 3. Uppercase hex encode result
    pub fn signature(&self, nonce: &Nonce) -> AuthResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.credentials.secret_bytes())
            .map_err(|e| AuthError::InvalidCredentials(e.to_string()))?;
        mac.update(nonce.as_str().as_bytes());
        mac.update(self.credentials.client_id().as_bytes());
        mac.update(self.credentials.api_key().as_bytes());

        Ok(hex::encode_upper(mac.finalize().into_bytes()))
    }
}

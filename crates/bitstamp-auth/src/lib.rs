//! Request authentication for the Bitstamp API
//!
//! Private Bitstamp endpoints expect three extra form fields on every POST:
//! the API key, a strictly increasing nonce and an HMAC-SHA256 signature
//! over `nonce + client_id + api_key`. This crate produces all three.
//!
//! # Example
//!
//! ```no_run
//! use bitstamp_auth::{Credentials, Params, RequestSigner};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load credentials from environment
//!     let creds = Credentials::from_env()?;
//!     let signer = RequestSigner::new(creds);
//!
//!     let body = signer.sign(&Params::new().with("amount", "0.5"))?;
//!     println!("POST body: {}", body);
//!
//!     Ok(())
//! }
//! ```

mod credentials;
mod error;
mod nonce;
mod params;
mod signer;

pub use credentials::Credentials;
pub use error::{AuthError, AuthResult};
pub use nonce::{Clock, FixedClock, Nonce, NonceGenerator, SystemClock, NONCE_SEQUENCE_WIDTH};
pub use params::Params;
pub use signer::RequestSigner;

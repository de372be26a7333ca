//! REST API gateway for the Bitstamp exchange
//!
//! Every request goes through one [`CallGateway`], which:
//!
//! - counts calls against a per-window budget and refuses to send once the
//!   budget is spent (Bitstamp defaults: 60 calls per minute)
//! - signs private requests with HMAC-SHA256 via `bitstamp-auth`
//! - classifies each response as success, HTTP error, parse error or API
//!   error
//!
//! The operations themselves are rows in a declarative catalog
//! ([`Operation`]); typed constructors on [`OperationRequest`] build the
//! request body for each of them.
//!
//! # Example
//!
//! ```no_run
//! use bitstamp_rest::{CallGateway, OperationRequest};
//! use bitstamp_auth::Credentials;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Public endpoints (no auth required)
//!     let public = CallGateway::new()?;
//!     let book = public.execute(&OperationRequest::order_book(Some("btcusd"))).await?;
//!     println!("{:?}", book.json());
//!
//!     // Private endpoints (auth required)
//!     let creds = Credentials::from_env()?;
//!     let private = CallGateway::with_credentials(creds)?;
//!     let balance = private.execute(&OperationRequest::balance(None)).await?;
//!     println!("{:?}", balance.json());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod endpoints;
pub mod error;
pub mod gateway;
pub mod response;
pub mod transport;

pub use config::{GatewayConfig, ParseFailurePolicy, API_BASE_URL, LEGACY_API_BASE_URL};
pub use endpoints::account::{SortOrder, TransactionsQuery};
pub use endpoints::market::TransactionsWindow;
pub use endpoints::trading::LimitOrderOptions;
pub use endpoints::{resolve_path, EndpointSpec, Operation, OperationRequest};
pub use error::{CallError, CallResult};
pub use gateway::CallGateway;
pub use response::{CallResponse, ResponseBody};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};

#[cfg(any(test, feature = "test-utils"))]
pub use transport::MockHttpTransport;

// Re-export commonly used types
pub use bitstamp_auth::{Credentials, Params};
pub use bitstamp_types::{CallBudget, FailureKind, RateLimitConfig};

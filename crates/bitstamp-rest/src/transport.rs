//! HTTP transport abstraction
//!
//! The gateway only needs "send this request, give me status, headers and
//! body". Keeping that behind a trait lets the gateway be tested without
//! network calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
}

impl HttpMethod {
    /// Method name as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound HTTP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Method
    pub method: HttpMethod,
    /// Fully resolved URL
    pub url: String,
    /// Request headers
    pub headers: Vec<(String, String)>,
    /// Form body (None = no body)
    pub body: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

/// Raw HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Response headers (lowercase names)
    pub headers: HashMap<String, String>,
    /// Raw body text
    pub body: String,
}

impl HttpResponse {
    /// Response with the given status and body and no headers
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport layer errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// Could not reach the server
    #[error("connection failed: {0}")]
    Connect(String),

    /// Request exceeded its timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Request failed mid-flight
    #[error("request failed: {0}")]
    Request(String),

    /// Client could not be built
    #[error("invalid client configuration: {0}")]
    Config(String),
}

/// Trait for HTTP transport abstraction
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send one request and return the raw response
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Real HTTP transport using reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with the given user agent
    pub fn new(user_agent: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::Config(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wrap an existing reqwest client
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let timeout = request.timeout;
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        }
        .timeout(timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        debug!(status, len = body.len(), "HTTP response received");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}

/// Mock transport for testing
///
/// Returns queued responses in order and records every request it sees.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct MockHttpTransport {
    responses: parking_lot::Mutex<std::collections::VecDeque<Result<HttpResponse, TransportError>>>,
    requests: parking_lot::Mutex<Vec<HttpRequest>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockHttpTransport {
    /// Create a mock with no queued responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response
    pub fn push_response(&self, response: HttpResponse) {
        self.responses.lock().push_back(Ok(response));
    }

    /// Queue a response with the given status and body
    pub fn push(&self, status: u16, body: impl Into<String>) {
        self.push_response(HttpResponse::new(status, body));
    }

    /// Queue a transport failure
    pub fn push_error(&self, error: TransportError) {
        self.responses.lock().push_back(Err(error));
    }

    /// Requests seen so far
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests seen so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connect("no mock response queued".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: "https://mock.test/ticker/".to_string(),
            headers: Vec::new(),
            body: None,
            timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_mock_transport_returns_queued_responses() {
        let transport = MockHttpTransport::new();
        transport.push(200, r#"{"last":"1"}"#);
        transport.push(500, "");

        let first = transport.send(request()).await.unwrap();
        assert_eq!(first.status, 200);
        assert!(first.is_success());

        let second = transport.send(request()).await.unwrap();
        assert!(!second.is_success());
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_transport_empty_queue_fails() {
        let transport = MockHttpTransport::new();
        assert!(matches!(
            transport.send(request()).await,
            Err(TransportError::Connect(_))
        ));
    }

    #[test]
    fn test_method_names() {
        assert_eq!(HttpMethod::Get.to_string(), "GET");
        assert_eq!(HttpMethod::Post.as_str(), "POST");
    }
}

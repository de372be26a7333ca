//! WebSocket transport abstraction
//!
//! The multiplexer drives a [`Transport`] rather than a socket directly, so
//! its routing and reconnect logic can be exercised without a network.
//!
//! # Example
//!
//! ```no_run
//! use bitstamp_ws::transport::{Transport, WsTransport, TransportError};
//!
//! async fn example() -> Result<(), TransportError> {
//!     let mut transport = WsTransport::new("wss://ws.bitstamp.net");
//!     transport.connect().await?;
//!     transport
//!         .send(r#"{"event":"bts:subscribe","data":{"channel":"live_trades_btcusd"}}"#)
//!         .await?;
//!     if let Some(frame) = transport.recv().await? {
//!         println!("Received: {}", frame);
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, instrument};

/// Transport layer errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Connection timeout
    #[error("connection timeout after {0:?}")]
    Timeout(Duration),

    /// Not connected
    #[error("not connected")]
    NotConnected,

    /// Protocol error
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Trait for WebSocket transport abstraction
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to the WebSocket endpoint
    async fn connect(&mut self) -> Result<(), TransportError>;

    /// Send a text message
    async fn send(&mut self, message: &str) -> Result<(), TransportError>;

    /// Receive a text message
    ///
    /// Returns `None` if the connection was closed gracefully.
    async fn recv(&mut self) -> Result<Option<String>, TransportError>;

    /// Close the connection gracefully
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Check if currently connected
    fn is_connected(&self) -> bool;

    /// Get the endpoint URL
    fn endpoint(&self) -> &str;
}

/// Real WebSocket transport using tokio-tungstenite
pub struct WsTransport {
    url: String,
    stream: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
    connect_timeout: Duration,
}

impl WsTransport {
    /// Create a new WebSocket transport
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            stream: None,
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Set connection timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[async_trait]
impl Transport for WsTransport {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn connect(&mut self) -> Result<(), TransportError> {
        debug!("Connecting to WebSocket");

        let (ws_stream, _response) = timeout(self.connect_timeout, connect_async(&self.url))
            .await
            .map_err(|_| TransportError::Timeout(self.connect_timeout))?
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        self.stream = Some(ws_stream);
        debug!("WebSocket connected");
        Ok(())
    }

    #[instrument(skip(self, message), fields(len = message.len()))]
    async fn send(&mut self, message: &str) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;

        stream
            .send(Message::Text(message.to_string()))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;

        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;

            match stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Binary(data))) => {
                    return String::from_utf8(data)
                        .map(Some)
                        .map_err(|e| TransportError::Protocol(e.to_string()));
                }
                Some(Ok(Message::Close(_))) => {
                    self.stream = None;
                    return Ok(None);
                }
                // tungstenite answers pings itself; raw frames never surface on reads
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Err(e)) => return Err(TransportError::ReceiveFailed(e.to_string())),
                None => {
                    self.stream = None;
                    return Err(TransportError::ConnectionClosed);
                }
            }
        }
    }

    #[instrument(skip(self))]
    async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(mut stream) = self.stream.take() {
            stream
                .close(None)
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
struct MockState {
    connected: bool,
    responses: std::collections::VecDeque<Result<Option<String>, TransportError>>,
    sent_messages: Vec<String>,
    connects: u32,
    fail_connects: u32,
    fail_send: bool,
}

/// Mock transport for testing
///
/// Clones share state, so a test can keep one handle while the multiplexer
/// drives another. `recv` waits until a response is pushed.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone)]
pub struct MockTransport {
    url: String,
    state: std::sync::Arc<parking_lot::Mutex<MockState>>,
    notify: std::sync::Arc<tokio::sync::Notify>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockTransport {
    /// Create a new mock transport
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: Default::default(),
            notify: Default::default(),
        }
    }

    fn push(&self, item: Result<Option<String>, TransportError>) {
        self.state.lock().responses.push_back(item);
        self.notify.notify_one();
    }

    /// Add a response to be returned on recv()
    pub fn push_response(&self, msg: impl Into<String>) {
        self.push(Ok(Some(msg.into())));
    }

    /// Add multiple responses
    pub fn push_responses(&self, msgs: impl IntoIterator<Item = impl Into<String>>) {
        for msg in msgs {
            self.push_response(msg);
        }
    }

    /// Simulate a close
    pub fn push_close(&self) {
        self.push(Ok(None));
    }

    /// Simulate a receive error
    pub fn push_error(&self, error: TransportError) {
        self.push(Err(error));
    }

    /// Fail the next `count` connection attempts
    pub fn fail_connects(&self, count: u32) {
        self.state.lock().fail_connects = count;
    }

    /// Simulate send failure
    pub fn set_fail_send(&self, fail: bool) {
        self.state.lock().fail_send = fail;
    }

    /// Messages sent so far
    pub fn sent_messages(&self) -> Vec<String> {
        self.state.lock().sent_messages.clone()
    }

    /// Take sent messages
    pub fn take_sent(&self) -> Vec<String> {
        std::mem::take(&mut self.state.lock().sent_messages)
    }

    /// Number of connection attempts so far
    pub fn connect_count(&self) -> u32 {
        self.state.lock().connects
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl Transport for MockTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.connects += 1;
        if state.fail_connects > 0 {
            state.fail_connects -= 1;
            return Err(TransportError::ConnectionFailed("mock connection failure".into()));
        }
        state.connected = true;
        Ok(())
    }

    async fn send(&mut self, message: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if !state.connected {
            return Err(TransportError::NotConnected);
        }
        if state.fail_send {
            return Err(TransportError::SendFailed("mock send failure".into()));
        }
        state.sent_messages.push(message.to_string());
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            {
                let mut state = self.state.lock();
                if !state.connected {
                    return Err(TransportError::NotConnected);
                }
                if let Some(item) = state.responses.pop_front() {
                    if matches!(item, Ok(None)) {
                        state.connected = false;
                    }
                    return item;
                }
            }
            self.notify.notified().await;
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.state.lock().connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

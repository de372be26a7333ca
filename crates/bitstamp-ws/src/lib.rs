//! Native WebSocket client for the Bitstamp WebSocket API v2
//!
//! A single [`ChannelMultiplexer`] carries every subscription over one
//! connection to `wss://ws.bitstamp.net`.
//!
//! # Features
//!
//! - Topic routing: listeners registered per `{channel}_{instrument}` topic
//! - Derived `cost = amount * price` on trade and order channels
//! - Pending/active subscription tracking from server acknowledgments
//! - Bounded reconnection for dropped transports, plus the server's explicit
//!   reconnect request
//!
//! # Example
//!
//! ```no_run
//! use bitstamp_ws::{ChannelMultiplexer, StreamConfig};
//! use bitstamp_types::{ChannelKind, Pair};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stream = ChannelMultiplexer::new(StreamConfig::default());
//!     stream.on_connected(|info| println!("connected to {}", info.url));
//!     stream.on_error(|e| eprintln!("stream error: {}", e));
//!
//!     let topic = stream.subscribe(ChannelKind::OrderBook, Pair::BTC_EUR)?;
//!     stream.on_topic(topic, |event| println!("{}", event.data()));
//!
//!     stream.start()?;
//!     tokio::signal::ctrl_c().await?;
//!     stream.close();
//!     stream.closed().await;
//!     Ok(())
//! }
//! ```

pub mod events;
pub mod listeners;
pub mod multiplexer;
pub mod reconnect;
pub mod subscription;
pub mod transport;

// Re-export main types
pub use events::{ConnectInfo, ConnectionState, DisconnectReason, ResubscribePolicy};
pub use listeners::{ListenerId, Listeners};
pub use multiplexer::{ChannelMultiplexer, StreamConfig, TransportFactory, STREAM_URL};
pub use reconnect::ReconnectConfig;
pub use subscription::{SubscriptionSet, SubscriptionState};
pub use transport::{Transport, TransportError, WsTransport};

#[cfg(any(test, feature = "test-utils"))]
pub use transport::MockTransport;

pub use bitstamp_types::{ChannelKind, StreamError, StreamResult, TopicEvent};

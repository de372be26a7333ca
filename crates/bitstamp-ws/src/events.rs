//! Connection lifecycle types

use std::fmt;

/// Multiplexer connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Created, driver not started
    Idle,
    /// First connection in progress
    Connecting,
    /// Connected and routing frames
    Connected,
    /// Re-establishing the connection
    Reconnecting,
    /// Closed by the caller or after reconnection gave up
    Closed,
}

/// Information about a successful connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectInfo {
    /// Endpoint URL
    pub url: String,
    /// Whether this is a reconnection
    pub is_reconnection: bool,
}

/// Reason for disconnection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Server closed the connection
    ServerClosed,
    /// Network error occurred
    NetworkError(String),
    /// Server asked the client to reconnect
    ReconnectRequested,
    /// Client requested shutdown
    Shutdown,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServerClosed => f.write_str("server closed the connection"),
            Self::NetworkError(e) => write!(f, "network error: {}", e),
            Self::ReconnectRequested => f.write_str("server requested reconnect"),
            Self::Shutdown => f.write_str("shutdown"),
        }
    }
}

/// What to do with tracked topics after a server-requested reconnect
///
/// Topics lost to a dropped transport are always subscribed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResubscribePolicy {
    /// Leave resubscription to the caller; the request clears the tracked
    /// topics
    #[default]
    Manual,
    /// Send subscribe again for every cleared topic once reconnected
    Automatic,
}

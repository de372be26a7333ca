//! Live data channel kinds

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// WebSocket channel categories
///
/// A channel kind combined with an instrument forms a topic such as
/// `live_trades_btcusd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ChannelKind {
    /// Executed trades
    LiveTrades,
    /// Order created/changed/deleted events
    LiveOrders,
    /// Top 100 bids and asks snapshot
    OrderBook,
    /// Order book snapshot with order ids
    DetailOrderBook,
    /// Incremental order book changes
    DiffOrderBook,
}

impl ChannelKind {
    /// Every known channel kind
    pub const ALL: [ChannelKind; 5] = [
        Self::LiveTrades,
        Self::LiveOrders,
        Self::OrderBook,
        Self::DetailOrderBook,
        Self::DiffOrderBook,
    ];

    /// Returns the channel name as used in API messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LiveTrades => "live_trades",
            Self::LiveOrders => "live_orders",
            Self::OrderBook => "order_book",
            Self::DetailOrderBook => "detail_order_book",
            Self::DiffOrderBook => "diff_order_book",
        }
    }

    /// Returns true if payloads on this channel carry `amount` and `price`
    /// and get a derived `cost` field
    pub fn derives_cost(&self) -> bool {
        matches!(self, Self::LiveTrades | Self::LiveOrders)
    }

    /// Build the topic identifier for an instrument
    pub fn topic(&self, instrument: &str) -> String {
        format!("{}_{}", self.as_str(), instrument)
    }

    /// Recover the channel kind from a topic identifier
    pub fn from_topic(topic: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| {
            let name = kind.as_str();
            topic == name
                || topic
                    .strip_prefix(name)
                    .is_some_and(|rest| rest.starts_with('_'))
        })
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownChannel(s.to_string()))
    }
}

/// Error returned when parsing an unrecognized channel name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown channel: {0}")]
pub struct UnknownChannel(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_format() {
        assert_eq!(ChannelKind::LiveTrades.topic("ethusd"), "live_trades_ethusd");
        assert_eq!(
            ChannelKind::DiffOrderBook.topic("btceur"),
            "diff_order_book_btceur"
        );
    }

    #[test]
    fn test_from_topic() {
        assert_eq!(
            ChannelKind::from_topic("live_orders_btcusd"),
            Some(ChannelKind::LiveOrders)
        );
        assert_eq!(
            ChannelKind::from_topic("detail_order_book_btcusd"),
            Some(ChannelKind::DetailOrderBook)
        );
        assert_eq!(
            ChannelKind::from_topic("order_book_btcusd"),
            Some(ChannelKind::OrderBook)
        );
        assert_eq!(ChannelKind::from_topic("live_trades"), Some(ChannelKind::LiveTrades));
        assert_eq!(ChannelKind::from_topic("live_tradesx_btcusd"), None);
        assert_eq!(ChannelKind::from_topic(""), None);
    }

    #[test]
    fn test_derives_cost() {
        assert!(ChannelKind::LiveTrades.derives_cost());
        assert!(ChannelKind::LiveOrders.derives_cost());
        assert!(!ChannelKind::OrderBook.derives_cost());
        assert!(!ChannelKind::DiffOrderBook.derives_cost());
    }

    #[test]
    fn test_parse_channel() {
        assert_eq!("order_book".parse::<ChannelKind>(), Ok(ChannelKind::OrderBook));
        assert!("ticker".parse::<ChannelKind>().is_err());
    }
}

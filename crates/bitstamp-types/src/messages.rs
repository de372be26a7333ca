//! Control and data envelopes for the Bitstamp WebSocket API v2

use crate::ChannelKind;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::str::FromStr;

/// Outbound subscribe control event
pub const EVENT_SUBSCRIBE: &str = "bts:subscribe";
/// Outbound unsubscribe control event
pub const EVENT_UNSUBSCRIBE: &str = "bts:unsubscribe";
/// Server acknowledgment of a subscribe request
pub const EVENT_SUBSCRIPTION_SUCCEEDED: &str = "bts:subscription_succeeded";
/// Server acknowledgment of an unsubscribe request
pub const EVENT_UNSUBSCRIPTION_SUCCEEDED: &str = "bts:unsubscription_succeeded";
/// Server asks the client to drop and re-establish the connection
pub const EVENT_REQUEST_RECONNECT: &str = "bts:request_reconnect";

// ============================================================================
// Request Types
// ============================================================================

/// Control message sent to the server
#[derive(Debug, Clone, Serialize)]
pub struct ControlRequest {
    /// Control event name (`bts:subscribe` / `bts:unsubscribe`)
    pub event: &'static str,
    /// Target channel
    pub data: ChannelRef,
}

/// Channel reference carried by control messages
#[derive(Debug, Clone, Serialize)]
pub struct ChannelRef {
    /// Topic identifier, e.g. `live_trades_btcusd`
    pub channel: String,
}

impl ControlRequest {
    /// Create a subscribe request for a topic
    pub fn subscribe(topic: impl Into<String>) -> Self {
        Self {
            event: EVENT_SUBSCRIBE,
            data: ChannelRef {
                channel: topic.into(),
            },
        }
    }

    /// Create an unsubscribe request for a topic
    pub fn unsubscribe(topic: impl Into<String>) -> Self {
        Self {
            event: EVENT_UNSUBSCRIBE,
            data: ChannelRef {
                channel: topic.into(),
            },
        }
    }

    /// Serialize to the JSON wire form
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ============================================================================
// Inbound Types
// ============================================================================

/// Every inbound frame: `{event, channel, data}`
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    /// Event name (`trade`, `data`, `order_created`, `bts:...`)
    pub event: String,
    /// Topic the frame belongs to (empty for connection-level events)
    #[serde(default)]
    pub channel: String,
    /// Event payload
    #[serde(default)]
    pub data: Value,
}

/// Classification of an inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Subscribe acknowledgment
    SubscriptionSucceeded,
    /// Unsubscribe acknowledgment
    UnsubscriptionSucceeded,
    /// Server-initiated reconnect request
    RequestReconnect,
    /// Anything else: payload for topic listeners
    Data,
}

impl InboundFrame {
    /// Parse a raw text frame
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Classify this frame by its event name
    pub fn kind(&self) -> FrameKind {
        match self.event.as_str() {
            EVENT_SUBSCRIPTION_SUCCEEDED => FrameKind::SubscriptionSucceeded,
            EVENT_UNSUBSCRIPTION_SUCCEEDED => FrameKind::UnsubscriptionSucceeded,
            EVENT_REQUEST_RECONNECT => FrameKind::RequestReconnect,
            _ => FrameKind::Data,
        }
    }

    /// Channel kind of the frame's topic, if recognized
    pub fn channel_kind(&self) -> Option<ChannelKind> {
        ChannelKind::from_topic(&self.channel)
    }

    /// Convert a data frame into the event delivered to listeners,
    /// deriving `cost` for trade and order channels
    pub fn into_topic_event(self) -> TopicEvent {
        let derives_cost = self.channel_kind().is_some_and(|kind| kind.derives_cost());
        let mut data = self.data;
        if derives_cost {
            derive_cost(&mut data);
        }

        TopicEvent {
            event: self.event,
            channel: self.channel,
            data,
        }
    }
}

/// Data event delivered to topic listeners
#[derive(Debug, Clone, PartialEq)]
pub struct TopicEvent {
    /// Event name, e.g. `trade` or `order_created`
    pub event: String,
    /// Topic identifier
    pub channel: String,
    /// Payload (with derived fields applied)
    pub data: Value,
}

impl TopicEvent {
    /// Bare payload, for consumers that only care about the data
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Consume the event and return the bare payload
    pub fn into_data(self) -> Value {
        self.data
    }

    /// Exact `amount * price` of the payload, if both are present
    pub fn cost(&self) -> Option<Decimal> {
        let amount = decimal_field(&self.data, "amount")?;
        let price = decimal_field(&self.data, "price")?;
        amount.checked_mul(price)
    }
}

/// Add `cost = amount * price` to a trade/order payload
///
/// Returns the computed cost. Payloads missing either operand are left as-is.
pub fn derive_cost(data: &mut Value) -> Option<Decimal> {
    let amount = decimal_field(data, "amount")?;
    let price = decimal_field(data, "price")?;
    let cost = amount.checked_mul(price)?;

    let number = decimal_to_number(cost)?;
    if let Value::Object(map) = data {
        map.insert("cost".to_string(), Value::Number(number));
    }
    Some(cost)
}

/// Read a numeric field that may be encoded as a JSON number or a string
fn decimal_field(data: &Value, key: &str) -> Option<Decimal> {
    let map: &Map<String, Value> = data.as_object()?;
    match map.get(key)? {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else {
                n.as_f64().and_then(Decimal::from_f64)
            }
        }
        Value::String(s) => Decimal::from_str(s)
            .or_else(|_| Decimal::from_scientific(s))
            .ok(),
        _ => None,
    }
}

fn decimal_to_number(value: Decimal) -> Option<Number> {
    let normalized = value.normalize();
    if normalized.scale() == 0 {
        if let Some(i) = normalized.to_i64() {
            return Some(Number::from(i));
        }
    }
    normalized.to_f64().and_then(Number::from_f64)
}

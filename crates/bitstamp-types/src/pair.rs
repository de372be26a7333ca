//! Trading pair identifiers (btcusd format)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trading pair identifier as used in Bitstamp URLs and channel names
///
/// Pairs are lowercase with no separator: `btcusd`, `ethbtc`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pair(String);

impl Pair {
    /// BTC/EUR trading pair
    pub const BTC_EUR: &'static str = "btceur";
    /// BTC/USD trading pair
    pub const BTC_USD: &'static str = "btcusd";
    /// EUR/USD trading pair
    pub const EUR_USD: &'static str = "eurusd";
    /// XRP/USD trading pair
    pub const XRP_USD: &'static str = "xrpusd";
    /// XRP/EUR trading pair
    pub const XRP_EUR: &'static str = "xrpeur";
    /// XRP/BTC trading pair
    pub const XRP_BTC: &'static str = "xrpbtc";
    /// LTC/USD trading pair
    pub const LTC_USD: &'static str = "ltcusd";
    /// LTC/EUR trading pair
    pub const LTC_EUR: &'static str = "ltceur";
    /// LTC/BTC trading pair
    pub const LTC_BTC: &'static str = "ltcbtc";
    /// ETH/USD trading pair
    pub const ETH_USD: &'static str = "ethusd";
    /// ETH/EUR trading pair
    pub const ETH_EUR: &'static str = "etheur";
    /// ETH/BTC trading pair
    pub const ETH_BTC: &'static str = "ethbtc";

    /// Create a new pair from a string
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the pair as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Pair {
    type Err = PairParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PairParseError::Empty);
        }

        if !s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
            return Err(PairParseError::InvalidFormat(s.to_string()));
        }

        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Pair {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Pair {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Pair {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Error parsing a pair
#[derive(Debug, Clone, thiserror::Error)]
pub enum PairParseError {
    #[error("Pair must not be empty")]
    Empty,

    #[error("Pair must be lowercase alphanumeric: {0}")]
    InvalidFormat(String),
}

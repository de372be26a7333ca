//! Public market data requests
//!
//! These endpoints don't require authentication.

use std::fmt;

use super::{Operation, OperationRequest};

/// Lookback window for recent transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionsWindow {
    /// Last minute
    Minute,
    /// Last hour
    #[default]
    Hour,
    /// Last day
    Day,
}

impl TransactionsWindow {
    /// Query string value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }
}

impl fmt::Display for TransactionsWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl OperationRequest {
    /// Last 24h ticker
    pub fn ticker(pair: Option<&str>) -> Self {
        Self::new(Operation::Ticker).pair_opt(pair)
    }

    /// Hourly ticker
    pub fn ticker_hour(pair: Option<&str>) -> Self {
        Self::new(Operation::TickerHour).pair_opt(pair)
    }

    /// Full order book
    pub fn order_book(pair: Option<&str>) -> Self {
        Self::new(Operation::OrderBook).pair_opt(pair)
    }

    /// Recent transactions within a window
    pub fn transactions(pair: Option<&str>, window: TransactionsWindow) -> Self {
        Self::new(Operation::Transactions)
            .pair_opt(pair)
            .query("time", window)
    }

    /// EUR/USD conversion rate
    pub fn conversion_rate() -> Self {
        Self::new(Operation::ConversionRate)
    }
}

//! Endpoint catalog
//!
//! Every Bitstamp operation is one row in [`Operation::spec`]: its path
//! segment, HTTP method, whether it is signed, and which base URL it lives
//! under. Requests for any row go through [`CallGateway::execute`].
//!
//! [`CallGateway::execute`]: crate::CallGateway::execute

pub mod account;
pub mod funding;
pub mod market;
pub mod trading;

use bitstamp_auth::Params;
use std::fmt;

use crate::transport::HttpMethod;

/// One catalog row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointSpec {
    /// Path segment under the base URL, without slashes at either end
    pub segment: &'static str,
    /// HTTP method
    pub method: HttpMethod,
    /// Whether the request body must be signed
    pub requires_auth: bool,
    /// Whether the endpoint lives under the legacy base URL
    pub legacy: bool,
}

const fn public(segment: &'static str) -> EndpointSpec {
    EndpointSpec {
        segment,
        method: HttpMethod::Get,
        requires_auth: false,
        legacy: false,
    }
}

const fn private(segment: &'static str) -> EndpointSpec {
    EndpointSpec {
        segment,
        method: HttpMethod::Post,
        requires_auth: true,
        legacy: false,
    }
}

const fn private_legacy(segment: &'static str) -> EndpointSpec {
    EndpointSpec {
        legacy: true,
        ..private(segment)
    }
}

/// Bitstamp REST operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    // === Market data ===
    Ticker,
    TickerHour,
    OrderBook,
    Transactions,
    ConversionRate,

    // === Account ===
    Balance,
    UserTransactions,
    OpenOrders,
    OrderStatus,

    // === Trading ===
    CancelOrder,
    CancelAllOrders,
    BuyLimitOrder,
    BuyMarketOrder,
    SellLimitOrder,
    SellMarketOrder,

    // === Funding ===
    WithdrawalRequests,
    BitcoinWithdrawal,
    LitecoinWithdrawal,
    EthereumWithdrawal,
    RippleWithdrawal,
    XrpWithdrawal,
    EthereumDepositAddress,
    XrpDepositAddress,
    LitecoinDepositAddress,
    BitcoinDepositAddress,
    RippleDepositAddress,
    UnconfirmedBitcoinDeposits,
    TransferSubToMain,
    TransferMainToSub,
    OpenBankWithdrawal,
    BankWithdrawalStatus,
    CancelBankWithdrawal,
    NewLiquidationAddress,
    LiquidationAddressInfo,
}

impl Operation {
    /// Every operation in the catalog
    pub const ALL: &'static [Operation] = &[
        Self::Ticker,
        Self::TickerHour,
        Self::OrderBook,
        Self::Transactions,
        Self::ConversionRate,
        Self::Balance,
        Self::UserTransactions,
        Self::OpenOrders,
        Self::OrderStatus,
        Self::CancelOrder,
        Self::CancelAllOrders,
        Self::BuyLimitOrder,
        Self::BuyMarketOrder,
        Self::SellLimitOrder,
        Self::SellMarketOrder,
        Self::WithdrawalRequests,
        Self::BitcoinWithdrawal,
        Self::LitecoinWithdrawal,
        Self::EthereumWithdrawal,
        Self::RippleWithdrawal,
        Self::XrpWithdrawal,
        Self::EthereumDepositAddress,
        Self::XrpDepositAddress,
        Self::LitecoinDepositAddress,
        Self::BitcoinDepositAddress,
        Self::RippleDepositAddress,
        Self::UnconfirmedBitcoinDeposits,
        Self::TransferSubToMain,
        Self::TransferMainToSub,
        Self::OpenBankWithdrawal,
        Self::BankWithdrawalStatus,
        Self::CancelBankWithdrawal,
        Self::NewLiquidationAddress,
        Self::LiquidationAddressInfo,
    ];

    /// Catalog row for this operation
    pub const fn spec(&self) -> EndpointSpec {
        match self {
            Self::Ticker => public("ticker"),
            Self::TickerHour => public("ticker_hour"),
            Self::OrderBook => public("order_book"),
            Self::Transactions => public("transactions"),
            Self::ConversionRate => public("eur_usd"),

            Self::Balance => private("balance"),
            Self::UserTransactions => private("user_transactions"),
            Self::OpenOrders => private("open_orders"),
            Self::OrderStatus => private("order_status"),

            Self::CancelOrder => private("cancel_order"),
            Self::CancelAllOrders => private("cancel_all_orders"),
            Self::BuyLimitOrder => private("buy"),
            Self::BuyMarketOrder => private("buy/market"),
            Self::SellLimitOrder => private("sell"),
            Self::SellMarketOrder => private("sell/market"),

            Self::WithdrawalRequests => private_legacy("withdrawal_requests"),
            Self::BitcoinWithdrawal => private_legacy("bitcoin_withdrawal"),
            Self::LitecoinWithdrawal => private("ltc_withdrawal"),
            Self::EthereumWithdrawal => private("eth_withdrawal"),
            Self::RippleWithdrawal => private_legacy("ripple_withdrawal"),
            Self::XrpWithdrawal => private("xrp_withdrawal"),
            Self::EthereumDepositAddress => private("eth_address"),
            Self::XrpDepositAddress => private("xrp_address"),
            Self::LitecoinDepositAddress => private("ltc_address"),
            Self::BitcoinDepositAddress => private_legacy("bitcoin_deposit_address"),
            Self::RippleDepositAddress => private_legacy("ripple_address"),
            Self::UnconfirmedBitcoinDeposits => private_legacy("unconfirmed_btc"),
            Self::TransferSubToMain => private("transfer-to-main"),
            Self::TransferMainToSub => private("transfer-from-main"),
            Self::OpenBankWithdrawal => private("withdrawal/open"),
            Self::BankWithdrawalStatus => private("withdrawal/status"),
            Self::CancelBankWithdrawal => private("withdrawal/cancel"),
            Self::NewLiquidationAddress => private("liquidation_address/new"),
            Self::LiquidationAddressInfo => private("liquidation_address/info"),
        }
    }

    /// Whether the request body must be signed
    pub const fn requires_auth(&self) -> bool {
        self.spec().requires_auth
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spec().segment)
    }
}

/// Resolve an endpoint path: `segment/` or `segment/pair/`
pub fn resolve_path(segment: &str, pair: Option<&str>) -> String {
    let segment = segment.trim_matches('/');
    match pair.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        Some(pair) => format!("{}/{}/", segment, pair),
        None => format!("{}/", segment),
    }
}

/// A request for one catalog operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRequest {
    operation: Operation,
    pair: Option<String>,
    params: Params,
    query: Vec<(String, String)>,
}

impl OperationRequest {
    /// Create a request with no pair and no parameters
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            pair: None,
            params: Params::new(),
            query: Vec::new(),
        }
    }

    /// Scope the request to a currency pair
    pub fn pair(mut self, pair: impl Into<String>) -> Self {
        self.pair = Some(pair.into());
        self
    }

    /// Scope the request to a pair if one is given
    pub fn pair_opt(mut self, pair: Option<&str>) -> Self {
        self.pair = pair.map(str::to_string);
        self
    }

    /// Add a body parameter
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.set(key, Some(value.to_string()));
        self
    }

    /// Add a body parameter that may be absent
    pub fn param_opt<V: ToString>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.params.set(key, value.map(|v| v.to_string()));
        self
    }

    /// Replace all body parameters
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Add a query string parameter
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Target operation
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Body parameters
    pub fn body(&self) -> &Params {
        &self.params
    }

    /// Path relative to the base URL, including any query string
    pub fn path(&self) -> String {
        let mut path = resolve_path(self.operation.spec().segment, self.pair.as_deref());
        if !self.query.is_empty() {
            let query = self
                .query
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&");
            path.push('?');
            path.push_str(&query);
        }
        path
    }
}

impl From<Operation> for OperationRequest {
    fn from(operation: Operation) -> Self {
        Self::new(operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path() {
        assert_eq!(resolve_path("ticker", None), "ticker/");
        assert_eq!(resolve_path("ticker", Some("btcusd")), "ticker/btcusd/");
        assert_eq!(resolve_path("withdrawal/open/", None), "withdrawal/open/");
        assert_eq!(resolve_path("open_orders", Some("all/")), "open_orders/all/");
        assert_eq!(resolve_path("balance", Some("")), "balance/");
    }

    #[test]
    fn test_catalog_shape() {
        for op in Operation::ALL {
            let spec = op.spec();
            assert!(!spec.segment.starts_with('/') && !spec.segment.ends_with('/'));
            // Only public market data is read over GET
            assert_eq!(spec.method == HttpMethod::Get, !spec.requires_auth, "{}", op);
        }

        assert!(Operation::BitcoinWithdrawal.spec().legacy);
        assert!(Operation::UnconfirmedBitcoinDeposits.spec().legacy);
        assert!(!Operation::XrpWithdrawal.spec().legacy);
        assert_eq!(
            Operation::LiquidationAddressInfo.spec().segment,
            "liquidation_address/info"
        );
    }

    #[test]
    fn test_request_path_with_query() {
        let request = OperationRequest::new(Operation::Transactions)
            .pair("btcusd")
            .query("time", "hour");
        assert_eq!(request.path(), "transactions/btcusd/?time=hour");
    }

    #[test]
    fn test_request_params() {
        let request = OperationRequest::new(Operation::OrderStatus)
            .param("id", 42)
            .param_opt::<String>("client_order_id", None);
        assert_eq!(request.body().get("id"), Some("42"));
        assert_eq!(request.body().present().count(), 1);
    }
}

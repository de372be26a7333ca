//! Order placement and cancellation requests

use super::{Operation, OperationRequest};

/// Optional fields for limit orders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LimitOrderOptions {
    /// Price at which a take-profit sell is placed once the buy fills
    pub limit_price: Option<String>,
    /// Keep the order open until the end of the day only
    pub daily_order: Option<bool>,
}

impl OperationRequest {
    /// Cancel one order
    pub fn cancel_order(id: impl ToString) -> Self {
        Self::new(Operation::CancelOrder).param("id", id)
    }

    /// Cancel every open order
    pub fn cancel_all_orders() -> Self {
        Self::new(Operation::CancelAllOrders)
    }

    /// Buy limit order
    pub fn buy_limit_order(
        pair: Option<&str>,
        amount: impl ToString,
        price: impl ToString,
        options: LimitOrderOptions,
    ) -> Self {
        Self::limit_order(Operation::BuyLimitOrder, pair, amount, price, options)
    }

    /// Sell limit order
    pub fn sell_limit_order(
        pair: Option<&str>,
        amount: impl ToString,
        price: impl ToString,
        options: LimitOrderOptions,
    ) -> Self {
        Self::limit_order(Operation::SellLimitOrder, pair, amount, price, options)
    }

    /// Buy market order
    pub fn buy_market_order(pair: Option<&str>, amount: impl ToString) -> Self {
        Self::new(Operation::BuyMarketOrder)
            .pair_opt(pair)
            .param("amount", amount)
    }

    /// Sell market order
    pub fn sell_market_order(pair: Option<&str>, amount: impl ToString) -> Self {
        Self::new(Operation::SellMarketOrder)
            .pair_opt(pair)
            .param("amount", amount)
    }

    fn limit_order(
        operation: Operation,
        pair: Option<&str>,
        amount: impl ToString,
        price: impl ToString,
        options: LimitOrderOptions,
    ) -> Self {
        Self::new(operation)
            .pair_opt(pair)
            .param("amount", amount)
            .param("price", price)
            .param_opt("limit_price", options.limit_price)
            .param_opt("daily_order", options.daily_order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_buy_limit_order() {
        let request = OperationRequest::buy_limit_order(
            Some("btcusd"),
            dec!(0.5),
            dec!(30000.10),
            LimitOrderOptions::default(),
        );
        assert_eq!(request.path(), "buy/btcusd/");
        assert_eq!(
            request.body().to_urlencoded().unwrap(),
            "amount=0.5&price=30000.10"
        );
    }

    #[test]
    fn test_sell_limit_order_with_options() {
        let request = OperationRequest::sell_limit_order(
            None,
            "1",
            "2",
            LimitOrderOptions {
                limit_price: Some("3".to_string()),
                daily_order: Some(true),
            },
        );
        assert_eq!(request.path(), "sell/");
        assert_eq!(
            request.body().to_urlencoded().unwrap(),
            "amount=1&price=2&limit_price=3&daily_order=true"
        );
    }

    #[test]
    fn test_market_orders() {
        assert_eq!(
            OperationRequest::sell_market_order(Some("ethusd"), "2").path(),
            "sell/market/ethusd/"
        );
        assert_eq!(OperationRequest::cancel_order(7).body().get("id"), Some("7"));
    }
}

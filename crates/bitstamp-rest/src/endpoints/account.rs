//! Private account requests

use std::fmt;

use super::{Operation, OperationRequest};

/// Sort direction for user transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first
    Asc,
    /// Newest first
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

/// Paging options for user transactions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionsQuery {
    /// Skip this many transactions
    pub offset: Option<u32>,
    /// Return at most this many transactions
    pub limit: Option<u32>,
    /// Sort direction
    pub sort: Option<SortOrder>,
}

impl OperationRequest {
    /// Account balances, optionally for one pair
    pub fn balance(pair: Option<&str>) -> Self {
        Self::new(Operation::Balance).pair_opt(pair)
    }

    /// User transaction history
    pub fn user_transactions(pair: Option<&str>, query: TransactionsQuery) -> Self {
        Self::new(Operation::UserTransactions)
            .pair_opt(pair)
            .param_opt("offset", query.offset)
            .param_opt("limit", query.limit)
            .param_opt("sort", query.sort)
    }

    /// Open orders for one pair
    pub fn open_orders(pair: Option<&str>) -> Self {
        Self::new(Operation::OpenOrders).pair_opt(pair)
    }

    /// Open orders across all pairs
    pub fn open_orders_all() -> Self {
        Self::new(Operation::OpenOrders).pair("all")
    }

    /// Status of one order
    pub fn order_status(id: impl ToString) -> Self {
        Self::new(Operation::OrderStatus).param("id", id)
    }
}

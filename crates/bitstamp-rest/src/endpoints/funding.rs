//! Deposit, withdrawal and transfer requests

use bitstamp_auth::Params;

use super::{Operation, OperationRequest};

impl OperationRequest {
    /// Pending withdrawal requests within the last `timedelta` seconds
    pub fn withdrawal_requests(timedelta: Option<u64>) -> Self {
        Self::new(Operation::WithdrawalRequests).param_opt("timedelta", timedelta)
    }

    /// Withdraw bitcoin
    pub fn bitcoin_withdrawal(amount: impl ToString, address: impl ToString, instant: bool) -> Self {
        Self::new(Operation::BitcoinWithdrawal)
            .param("amount", amount)
            .param("address", address)
            .param("instant", instant)
    }

    /// Withdraw litecoin
    pub fn litecoin_withdrawal(amount: impl ToString, address: impl ToString) -> Self {
        Self::new(Operation::LitecoinWithdrawal)
            .param("amount", amount)
            .param("address", address)
    }

    /// Withdraw ether
    pub fn ethereum_withdrawal(amount: impl ToString, address: impl ToString) -> Self {
        Self::new(Operation::EthereumWithdrawal)
            .param("amount", amount)
            .param("address", address)
    }

    /// Withdraw over the ripple gateway
    pub fn ripple_withdrawal(
        amount: impl ToString,
        address: impl ToString,
        currency: impl ToString,
    ) -> Self {
        Self::new(Operation::RippleWithdrawal)
            .param("amount", amount)
            .param("address", address)
            .param("currency", currency)
    }

    /// Withdraw XRP
    pub fn xrp_withdrawal(
        amount: impl ToString,
        address: impl ToString,
        destination_tag: Option<String>,
    ) -> Self {
        Self::new(Operation::XrpWithdrawal)
            .param("amount", amount)
            .param("address", address)
            .param_opt("destination_tag", destination_tag)
    }

    /// Move funds from a sub account to the main account
    pub fn transfer_sub_to_main(
        amount: impl ToString,
        currency: impl ToString,
        sub_account: Option<String>,
    ) -> Self {
        Self::new(Operation::TransferSubToMain)
            .param("amount", amount)
            .param("currency", currency)
            .param_opt("subAccount", sub_account)
    }

    /// Move funds from the main account to a sub account
    pub fn transfer_main_to_sub(
        amount: impl ToString,
        currency: impl ToString,
        sub_account: Option<String>,
    ) -> Self {
        Self::new(Operation::TransferMainToSub)
            .param("amount", amount)
            .param("currency", currency)
            .param_opt("subAccount", sub_account)
    }

    /// Open a bank withdrawal; the field set depends on the withdrawal type
    pub fn open_bank_withdrawal(params: Params) -> Self {
        Self::new(Operation::OpenBankWithdrawal).params(params)
    }

    /// Status of a bank withdrawal
    pub fn bank_withdrawal_status(id: impl ToString) -> Self {
        Self::new(Operation::BankWithdrawalStatus).param("id", id)
    }

    /// Cancel a bank withdrawal
    pub fn cancel_bank_withdrawal(id: impl ToString) -> Self {
        Self::new(Operation::CancelBankWithdrawal).param("id", id)
    }

    /// Create a liquidation address
    pub fn new_liquidation_address(liquidation_currency: impl ToString) -> Self {
        Self::new(Operation::NewLiquidationAddress)
            .param("liquidation_currency", liquidation_currency)
    }

    /// Deposits received on a liquidation address
    pub fn liquidation_address_info(address: Option<String>) -> Self {
        Self::new(Operation::LiquidationAddressInfo).param_opt("address", address)
    }
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
    Wallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "CARD",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::Wallet => "WALLET",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChargeError {
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },
    #[error("charge declined: {0}")]
    Declined(String),
    #[error("unknown account: {0}")]
    UnknownAccount(Uuid),
    #[error("payment provider unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RefundError {
    #[error("unknown transaction: {0}")]
    UnknownTransaction(String),
    #[error("transaction already refunded: {0}")]
    AlreadyRefunded(String),
    #[error("payment provider unavailable: {0}")]
    Unavailable(String),
}

/// External payment processor. Purely reactive: the engine drives every
/// call and the processor never initiates reservation transitions.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Spendable balance for the account, in minor currency units
    async fn balance(&self, user_id: Uuid) -> Result<i64, ChargeError>;

    /// Charge the account; returns the provider transaction id
    async fn charge(
        &self,
        user_id: Uuid,
        amount: i64,
        method: PaymentMethod,
    ) -> Result<String, ChargeError>;

    /// Return funds for a previously successful charge
    async fn refund(&self, transaction_id: &str, reason: &str) -> Result<(), RefundError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names_match_wire_format() {
        assert_eq!(PaymentMethod::Card.as_str(), "CARD");
        assert_eq!(PaymentMethod::BankTransfer.as_str(), "BANK_TRANSFER");
        assert_eq!(PaymentMethod::Wallet.as_str(), "WALLET");
    }
}

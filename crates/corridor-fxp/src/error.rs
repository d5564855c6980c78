use corridor_core::{CoreError, PaymentId};
use corridor_ledger::LedgerError;
use corridor_store::StoreError;

use crate::relay::RelayError;

/// Liquidity provider errors.
#[derive(Debug, thiserror::Error)]
pub enum FxpError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// On-chain state disagrees with the claimed instruction. A trust
    /// violation, not a retryable condition.
    #[error("lock mismatch on {field}: expected {expected}, found {actual}")]
    LockMismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("unknown payment: {0}")]
    UnknownPayment(PaymentId),

    #[error("secret does not hash to the recorded hashlock for payment {0}")]
    SecretMismatch(PaymentId),

    /// A record for this payment/lock already exists; replays must not
    /// create duplicates or re-trigger relays.
    #[error("duplicate record: {0}")]
    Duplicate(StoreError),

    #[error("insufficient funds: balance {balance} < required {required}")]
    InsufficientFunds { balance: u128, required: u128 },

    #[error("ledger transaction failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("record store failure: {0}")]
    Store(StoreError),

    #[error("relay delivery failed: {0}")]
    Relay(#[from] RelayError),
}

impl From<StoreError> for FxpError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateLock(_) | StoreError::DuplicatePayment(_) => Self::Duplicate(e),
            other => Self::Store(other),
        }
    }
}

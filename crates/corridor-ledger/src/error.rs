use corridor_core::LockId;

/// Ledger-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("lock not found: {0}")]
    LockNotFound(LockId),

    #[error("preimage does not match hashlock of {0}")]
    PreimageMismatch(LockId),

    #[error("lock already withdrawn: {0}")]
    AlreadyWithdrawn(LockId),

    #[error("lock already refunded: {0}")]
    AlreadyRefunded(LockId),

    #[error("timelock of {0} has not expired yet")]
    TimelockNotExpired(LockId),

    #[error("timelock of {0} has expired")]
    TimelockExpired(LockId),

    #[error("insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: u128, required: u128 },

    #[error("insufficient allowance: available {available}, required {required}")]
    InsufficientAllowance { available: u128, required: u128 },

    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("ledger transport error: {0}")]
    Transport(String),
}

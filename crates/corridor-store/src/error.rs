use corridor_core::{LockId, PaymentId};

/// Record store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists for lock {0}")]
    DuplicateLock(LockId),

    #[error("record already exists for payment {0}")]
    DuplicatePayment(PaymentId),

    #[error("no record for lock {0}")]
    LockNotFound(LockId),

    #[error("record codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

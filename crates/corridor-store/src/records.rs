use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use corridor_core::{
    Currency, HashLock, LockId, PaymentId, PaymentInstruction, Secret, WalletAddress,
};

/// Lifecycle status of a persisted payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordStatus {
    /// Lock observed or created; awaiting settlement.
    Open,
    /// The matching lock was withdrawn and the secret captured.
    Withdrawn,
    /// The matching lock expired and was refunded.
    Refunded,
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Withdrawn => write!(f, "WITHDRAWN"),
            Self::Refunded => write!(f, "REFUNDED"),
        }
    }
}

/// One persisted settlement record, one per on-chain lock this party is a
/// party to.
///
/// `secret` is populated only after it has been verified to hash to
/// `hash`; the store layer does not enforce this, the handlers do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub hash: HashLock,
    pub payment_id: PaymentId,
    /// Amount in integer token units.
    pub amount: u128,
    /// The wallet on the other side of the lock.
    pub counterparty: WalletAddress,
    /// Primary key: lock ids are never reused across payments.
    pub lock_id: LockId,
    pub instruction: PaymentInstruction,
    pub status: RecordStatus,
    pub secret: Option<Secret>,
}

impl PaymentRecord {
    /// A fresh open record with no secret yet.
    pub fn open(
        hash: HashLock,
        payment_id: PaymentId,
        amount: u128,
        counterparty: WalletAddress,
        lock_id: LockId,
        instruction: PaymentInstruction,
    ) -> Self {
        Self {
            hash,
            payment_id,
            amount,
            counterparty,
            lock_id,
            instruction,
            status: RecordStatus::Open,
            secret: None,
        }
    }
}

/// A secret issued by the originating service at discovery time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretRecord {
    pub recipient: WalletAddress,
    pub sender: WalletAddress,
    pub source_currency: Currency,
    /// Amount in integer token units.
    pub amount: u128,
    pub hash: HashLock,
    pub secret: Secret,
    pub payment_id: PaymentId,
    pub created_at: DateTime<Utc>,
    /// Attached once the matching lock is observed on-chain.
    pub lock_id: Option<LockId>,
}

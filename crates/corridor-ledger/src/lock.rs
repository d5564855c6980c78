use serde::{Deserialize, Serialize};

use corridor_core::{HashLock, LockId, Secret, TokenId, WalletAddress};

/// One hop's on-ledger commitment, as read back from the lock contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lock {
    pub sender: WalletAddress,
    pub receiver: WalletAddress,
    pub token: TokenId,
    /// Amount in integer token units.
    pub amount: u128,
    pub hashlock: HashLock,
    /// Absolute expiry, epoch seconds. Immutable ground truth once
    /// observed on-chain.
    pub timelock: i64,
    pub withdrawn: bool,
    pub refunded: bool,
    /// The revealed preimage, present once the lock has been withdrawn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preimage: Option<Secret>,
}

impl Lock {
    /// Withdrawn and refunded are terminal and mutually exclusive.
    pub fn is_terminal(&self) -> bool {
        self.withdrawn || self.refunded
    }
}

/// Parameters for creating a lock from the connected wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLock {
    pub receiver: WalletAddress,
    pub hashlock: HashLock,
    /// Absolute expiry, epoch seconds.
    pub timelock: i64,
    pub token: TokenId,
    /// Amount in integer token units.
    pub amount: u128,
}

/// Events emitted by the ledger's lock contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LedgerEvent {
    #[serde(rename_all = "camelCase")]
    LockCreated {
        lock_id: LockId,
        sender: WalletAddress,
        receiver: WalletAddress,
        token: TokenId,
        amount: u128,
        hashlock: HashLock,
    },
    #[serde(rename_all = "camelCase")]
    LockWithdrawn { lock_id: LockId, preimage: Secret },
}

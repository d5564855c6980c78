use async_trait::async_trait;
use tokio::sync::broadcast;

use corridor_core::{LockId, Secret, WalletAddress};

use crate::error::LedgerError;
use crate::lock::{LedgerEvent, Lock, NewLock};

/// A ledger client bound to one wallet signer.
///
/// All write operations are transactional from the caller's perspective:
/// the future resolves only once the ledger has confirmed the state
/// change. An unconfirmed lock must never be advertised as settled, so
/// callers await these futures before responding or relaying.
#[async_trait]
pub trait LockLedger: Send + Sync {
    /// The wallet this client signs with.
    fn wallet(&self) -> &WalletAddress;

    /// Create a lock from the connected wallet, awaiting confirmation.
    async fn create_lock(&self, new_lock: NewLock) -> Result<LockId, LedgerError>;

    /// Read a lock. `None` when the id is unknown to the contract.
    async fn get_lock(&self, id: &LockId) -> Result<Option<Lock>, LedgerError>;

    /// Withdraw a lock by revealing its preimage, awaiting confirmation.
    async fn withdraw(&self, id: &LockId, preimage: &Secret) -> Result<(), LedgerError>;

    /// Refund an expired lock back to its sender, awaiting confirmation.
    async fn refund(&self, id: &LockId) -> Result<(), LedgerError>;

    /// Token balance of the connected wallet.
    async fn balance(&self) -> Result<u128, LedgerError>;

    /// Remaining allowance granted by the connected wallet to the lock
    /// contract.
    async fn allowance(&self) -> Result<u128, LedgerError>;

    /// Increase the lock contract's spending allowance.
    async fn increase_allowance(&self, amount: u128) -> Result<(), LedgerError>;

    /// Subscribe to the ledger's event feed.
    fn subscribe(&self) -> broadcast::Receiver<LedgerEvent>;
}

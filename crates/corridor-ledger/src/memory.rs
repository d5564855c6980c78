//! In-memory ledger with full HTLC semantics.
//!
//! Backs unit and integration tests and local single-process wiring. The
//! shared chain state lives behind an `Arc`; each participant connects its
//! own wallet-bound handle, mirroring how the real services each hold one
//! signer over the same chain.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tokio::sync::broadcast;

use corridor_core::{LockId, Secret, WalletAddress};

use crate::error::LedgerError;
use crate::lock::{LedgerEvent, Lock, NewLock};
use crate::traits::LockLedger;

const EVENT_CHANNEL_CAPACITY: usize = 256;

struct ChainState {
    locks: DashMap<LockId, Lock>,
    balances: DashMap<WalletAddress, u128>,
    allowances: DashMap<WalletAddress, u128>,
    events: broadcast::Sender<LedgerEvent>,
    nonce: AtomicU64,
}

/// The shared in-memory chain.
#[derive(Clone)]
pub struct InMemoryLedger {
    state: Arc<ChainState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(ChainState {
                locks: DashMap::new(),
                balances: DashMap::new(),
                allowances: DashMap::new(),
                events,
                nonce: AtomicU64::new(0),
            }),
        }
    }

    /// Connect a wallet-bound client handle.
    pub fn connect(&self, wallet: impl Into<WalletAddress>) -> MemoryLedgerHandle {
        MemoryLedgerHandle {
            wallet: wallet.into(),
            state: Arc::clone(&self.state),
        }
    }

    /// Mint balance to a wallet (test setup).
    pub fn credit(&self, wallet: impl Into<WalletAddress>, amount: u128) {
        self.state
            .balances
            .entry(wallet.into())
            .and_modify(|b| *b += amount)
            .or_insert(amount);
    }

    /// Subscribe to the chain's event feed without a wallet handle.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.state.events.subscribe()
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// A wallet-bound view of the in-memory chain.
pub struct MemoryLedgerHandle {
    wallet: WalletAddress,
    state: Arc<ChainState>,
}

impl MemoryLedgerHandle {
    fn next_lock_id(&self, new_lock: &NewLock) -> LockId {
        let nonce = self.state.nonce.fetch_add(1, Ordering::SeqCst);
        let mut hasher = Sha256::new();
        hasher.update(self.wallet.as_str().as_bytes());
        hasher.update(new_lock.receiver.as_str().as_bytes());
        hasher.update(new_lock.hashlock.as_bytes());
        hasher.update(new_lock.timelock.to_be_bytes());
        hasher.update(nonce.to_be_bytes());
        LockId(hasher.finalize().into())
    }
}

#[async_trait]
impl LockLedger for MemoryLedgerHandle {
    fn wallet(&self) -> &WalletAddress {
        &self.wallet
    }

    async fn create_lock(&self, new_lock: NewLock) -> Result<LockId, LedgerError> {
        let allowance = self
            .state
            .allowances
            .get(&self.wallet)
            .map(|a| *a)
            .unwrap_or(0);
        if allowance < new_lock.amount {
            return Err(LedgerError::InsufficientAllowance {
                available: allowance,
                required: new_lock.amount,
            });
        }
        let balance = self
            .state
            .balances
            .get(&self.wallet)
            .map(|b| *b)
            .unwrap_or(0);
        if balance < new_lock.amount {
            return Err(LedgerError::InsufficientBalance {
                available: balance,
                required: new_lock.amount,
            });
        }

        self.state
            .allowances
            .entry(self.wallet.clone())
            .and_modify(|a| *a -= new_lock.amount);
        self.state
            .balances
            .entry(self.wallet.clone())
            .and_modify(|b| *b -= new_lock.amount);

        let lock_id = self.next_lock_id(&new_lock);
        let lock = Lock {
            sender: self.wallet.clone(),
            receiver: new_lock.receiver.clone(),
            token: new_lock.token.clone(),
            amount: new_lock.amount,
            hashlock: new_lock.hashlock,
            timelock: new_lock.timelock,
            withdrawn: false,
            refunded: false,
            preimage: None,
        };
        self.state.locks.insert(lock_id, lock);

        let _ = self.state.events.send(LedgerEvent::LockCreated {
            lock_id,
            sender: self.wallet.clone(),
            receiver: new_lock.receiver,
            token: new_lock.token,
            amount: new_lock.amount,
            hashlock: new_lock.hashlock,
        });
        tracing::debug!(%lock_id, "lock created");
        Ok(lock_id)
    }

    async fn get_lock(&self, id: &LockId) -> Result<Option<Lock>, LedgerError> {
        Ok(self.state.locks.get(id).map(|entry| entry.clone()))
    }

    async fn withdraw(&self, id: &LockId, preimage: &Secret) -> Result<(), LedgerError> {
        let (receiver, amount) = {
            let mut entry = self
                .state
                .locks
                .get_mut(id)
                .ok_or(LedgerError::LockNotFound(*id))?;
            let lock = entry.value_mut();

            if lock.withdrawn {
                return Err(LedgerError::AlreadyWithdrawn(*id));
            }
            if lock.refunded {
                return Err(LedgerError::AlreadyRefunded(*id));
            }
            if lock.receiver != self.wallet {
                return Err(LedgerError::Rejected(format!(
                    "only the receiver may withdraw lock {id}"
                )));
            }
            if Utc::now().timestamp() >= lock.timelock {
                return Err(LedgerError::TimelockExpired(*id));
            }
            if !lock.hashlock.matches(preimage) {
                return Err(LedgerError::PreimageMismatch(*id));
            }

            lock.withdrawn = true;
            lock.preimage = Some(preimage.clone());
            (lock.receiver.clone(), lock.amount)
        };

        self.state
            .balances
            .entry(receiver)
            .and_modify(|b| *b += amount)
            .or_insert(amount);

        let _ = self.state.events.send(LedgerEvent::LockWithdrawn {
            lock_id: *id,
            preimage: preimage.clone(),
        });
        tracing::debug!(lock_id = %id, "lock withdrawn");
        Ok(())
    }

    async fn refund(&self, id: &LockId) -> Result<(), LedgerError> {
        let (sender, amount) = {
            let mut entry = self
                .state
                .locks
                .get_mut(id)
                .ok_or(LedgerError::LockNotFound(*id))?;
            let lock = entry.value_mut();

            if lock.withdrawn {
                return Err(LedgerError::AlreadyWithdrawn(*id));
            }
            if lock.refunded {
                return Err(LedgerError::AlreadyRefunded(*id));
            }
            if lock.sender != self.wallet {
                return Err(LedgerError::Rejected(format!(
                    "only the sender may refund lock {id}"
                )));
            }
            if Utc::now().timestamp() < lock.timelock {
                return Err(LedgerError::TimelockNotExpired(*id));
            }

            lock.refunded = true;
            (lock.sender.clone(), lock.amount)
        };

        self.state
            .balances
            .entry(sender)
            .and_modify(|b| *b += amount)
            .or_insert(amount);
        tracing::debug!(lock_id = %id, "lock refunded");
        Ok(())
    }

    async fn balance(&self) -> Result<u128, LedgerError> {
        Ok(self
            .state
            .balances
            .get(&self.wallet)
            .map(|b| *b)
            .unwrap_or(0))
    }

    async fn allowance(&self) -> Result<u128, LedgerError> {
        Ok(self
            .state
            .allowances
            .get(&self.wallet)
            .map(|a| *a)
            .unwrap_or(0))
    }

    async fn increase_allowance(&self, amount: u128) -> Result<(), LedgerError> {
        self.state
            .allowances
            .entry(self.wallet.clone())
            .and_modify(|a| *a += amount)
            .or_insert(amount);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.state.events.subscribe()
    }
}

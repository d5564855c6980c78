//! Refund fail-safe timers.
//!
//! Every lock this provider creates gets a cancellable scheduled task
//! keyed by lock id. At `timelock + grace` the task re-reads the lock and
//! refunds it unless a terminal state was reached first; a ledger failure
//! retries on the next tick, so liveness does not depend on any single
//! call succeeding. The event listener cancels the timer once it observes
//! a withdrawal, and the re-check makes a lost race a no-op either way.

use std::cmp;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::task::JoinHandle;

use corridor_core::LockId;
use corridor_ledger::{LedgerError, LockLedger};
use corridor_store::PaymentStore;

const MIN_RETRY_INTERVAL: Duration = Duration::from_millis(250);

pub struct RefundScheduler {
    ledger: Arc<dyn LockLedger>,
    outbound: Arc<dyn PaymentStore>,
    grace: Duration,
    tasks: Arc<DashMap<LockId, JoinHandle<()>>>,
}

impl RefundScheduler {
    pub fn new(
        ledger: Arc<dyn LockLedger>,
        outbound: Arc<dyn PaymentStore>,
        grace: Duration,
    ) -> Self {
        Self {
            ledger,
            outbound,
            grace,
            tasks: Arc::new(DashMap::new()),
        }
    }

    /// Arm the fail-safe for a freshly created lock.
    pub fn arm(&self, lock_id: LockId, timelock: i64) {
        let fire_in = {
            let until_expiry = timelock - Utc::now().timestamp();
            let base = if until_expiry > 0 {
                Duration::from_secs(until_expiry as u64)
            } else {
                Duration::ZERO
            };
            base + self.grace
        };

        let ledger = Arc::clone(&self.ledger);
        let outbound = Arc::clone(&self.outbound);
        let tasks = Arc::clone(&self.tasks);
        let retry = cmp::max(self.grace, MIN_RETRY_INTERVAL);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(fire_in).await;
            Self::run(ledger, outbound, lock_id, retry).await;
            tasks.remove(&lock_id);
        });

        if let Some(previous) = self.tasks.insert(lock_id, handle) {
            previous.abort();
        }
        tracing::debug!(%lock_id, fire_in_secs = fire_in.as_secs(), "refund fail-safe armed");
    }

    /// Cancel the fail-safe after the lock reached a terminal state.
    pub fn cancel(&self, lock_id: &LockId) {
        if let Some((_, handle)) = self.tasks.remove(lock_id) {
            handle.abort();
            tracing::debug!(%lock_id, "refund fail-safe cancelled");
        }
    }

    /// Number of currently armed timers.
    pub fn armed(&self) -> usize {
        self.tasks.len()
    }

    async fn run(
        ledger: Arc<dyn LockLedger>,
        outbound: Arc<dyn PaymentStore>,
        lock_id: LockId,
        retry: Duration,
    ) {
        loop {
            match ledger.get_lock(&lock_id).await {
                Ok(Some(lock)) if lock.withdrawn => {
                    tracing::debug!(%lock_id, "lock already withdrawn, refund not needed");
                    return;
                }
                Ok(Some(lock)) if lock.refunded => {
                    tracing::debug!(%lock_id, "lock already refunded");
                    return;
                }
                Ok(Some(_)) => match ledger.refund(&lock_id).await {
                    Ok(()) => {
                        tracing::info!(%lock_id, "expired lock refunded");
                        if let Err(e) = outbound.mark_refunded(&lock_id) {
                            tracing::warn!(%lock_id, error = %e, "failed to record refund");
                        }
                        return;
                    }
                    // Lost the race against a concurrent terminal transition.
                    Err(LedgerError::AlreadyWithdrawn(_)) | Err(LedgerError::AlreadyRefunded(_)) => {
                        tracing::debug!(%lock_id, "lock reached terminal state concurrently");
                        return;
                    }
                    Err(e) => {
                        tracing::warn!(%lock_id, error = %e, "refund attempt failed, will retry");
                    }
                },
                Ok(None) => {
                    tracing::warn!(%lock_id, "armed refund for a lock unknown to the ledger");
                    return;
                }
                Err(e) => {
                    tracing::warn!(%lock_id, error = %e, "failed to read lock state, will retry");
                }
            }
            tokio::time::sleep(retry).await;
        }
    }
}

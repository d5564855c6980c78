//! Withdrawal-event listener: backward secret propagation.
//!
//! A dedicated task drains decoded ledger events from the subscription
//! channel and drives the state machine one event at a time; each stage
//! returns an explicit result consumed by the next, no nested callbacks.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use corridor_core::messages::CompletionRequest;
use corridor_core::{completion_forward, LockId, Secret};
use corridor_ledger::LedgerEvent;
use corridor_store::{PaymentStore, RecordStatus};

use crate::error::FxpError;
use crate::service::FxProvider;

/// Spawn the listener task over the provider's ledger subscription.
pub fn spawn_withdrawal_listener(provider: Arc<FxProvider>) -> JoinHandle<()> {
    let mut events = provider.ledger().subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(LedgerEvent::LockWithdrawn { lock_id, preimage }) => {
                    if let Err(e) = provider.on_lock_withdrawn(lock_id, preimage).await {
                        tracing::warn!(%lock_id, error = %e, "withdrawal event handling failed");
                    }
                }
                Ok(LedgerEvent::LockCreated { .. }) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "withdrawal listener lagged behind the event feed");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("ledger event feed closed, listener exiting");
                    break;
                }
            }
        }
    })
}

impl FxProvider {
    /// React to a withdrawal observed on-chain.
    ///
    /// Only locks this provider created are of interest: the revealed
    /// secret settles the outbound record, disarms the fail-safe, and is
    /// pushed upstream so that party can claim without polling the ledger.
    pub async fn on_lock_withdrawn(
        &self,
        lock_id: LockId,
        preimage: Secret,
    ) -> Result<(), FxpError> {
        let _guard = self.lock_gates.acquire(lock_id).await;

        let Some(record) = self.outbound().get(&lock_id)? else {
            tracing::debug!(%lock_id, "withdrawal event for a lock we did not create");
            return Ok(());
        };
        if record.status != RecordStatus::Open {
            // Duplicate event, or the fail-safe already refunded: the
            // record is terminal either way.
            tracing::debug!(%lock_id, status = %record.status, "withdrawal event for terminal record");
            return Ok(());
        }

        if !record.hash.matches(&preimage) {
            tracing::warn!(%lock_id, "revealed preimage does not hash to the recorded hashlock");
            return Err(FxpError::SecretMismatch(record.payment_id));
        }

        self.outbound().mark_withdrawn(&lock_id, &preimage)?;
        self.refunds().cancel(&lock_id);
        tracing::info!(
            payment_id = %record.payment_id,
            %lock_id,
            "outbound lock withdrawn, secret captured"
        );

        let forward_host = completion_forward(&record.instruction, self.wallet())?;
        let completion = CompletionRequest {
            payment_instruction: record.instruction.clone(),
            secret: preimage,
        };
        // Best effort: the upstream party can always fall back to
        // observing the ledger directly.
        if let Err(e) = self.relay().relay_completion(&forward_host, &completion).await {
            tracing::warn!(
                payment_id = %record.payment_id,
                %forward_host,
                error = %e,
                "completion delivery failed, upstream must observe the ledger"
            );
        }
        Ok(())
    }
}

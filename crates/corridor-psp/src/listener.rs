//! Lock-created listener.
//!
//! The sender's own lock creation happens outside this service, so the
//! issued secret records start without a lock id; this task watches the
//! ledger feed and attaches lock ids to the matching records (same hash,
//! same receiving wallet) as they appear on-chain.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use corridor_ledger::LedgerEvent;
use corridor_store::SecretStore;

use crate::service::Psp;

pub fn spawn_lock_created_listener(
    psp: Arc<Psp>,
    mut events: broadcast::Receiver<LedgerEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(LedgerEvent::LockCreated {
                    lock_id,
                    receiver,
                    hashlock,
                    ..
                }) => match psp.secrets().attach_lock(&hashlock, &receiver, &lock_id) {
                    Ok(0) => {
                        tracing::debug!(%lock_id, "lock creation matches no issued secret");
                    }
                    Ok(updated) => {
                        tracing::info!(%lock_id, updated, "lock attached to issued secret");
                    }
                    Err(e) => {
                        tracing::warn!(%lock_id, error = %e, "failed to attach lock to secret");
                    }
                },
                Ok(LedgerEvent::LockWithdrawn { .. }) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "lock-created listener lagged behind the event feed");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("ledger event feed closed, listener exiting");
                    break;
                }
            }
        }
    })
}

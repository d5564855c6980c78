//! Locked-notification handler: inbound lock verification.
//!
//! Never creates a lock. Runs the verification gate against the ledger,
//! persists the inbound record, and relays Setup onward through the hub
//! to trigger the next party's lock creation: the strict alternation
//! Setup, Locked, Setup, Locked that terminates at the recipient side.

use corridor_core::inbound_plan;
use corridor_core::messages::{LockedRequest, SetupRequest};
use corridor_store::{PaymentRecord, PaymentStore};

use crate::error::FxpError;
use crate::service::FxProvider;
use crate::verify::{verify_lock, ExpectedLock};

impl FxProvider {
    pub async fn handle_locked(&self, request: LockedRequest) -> Result<(), FxpError> {
        let ix = &request.payment_instruction;
        let payment_id = ix.payment_id;
        let plan = inbound_plan(ix, self.wallet())?;
        tracing::info!(%payment_id, role = %plan.role, lock_id = %request.lock_id, "locked notification received");

        let _guard = self.lock_gates.acquire(request.lock_id).await;

        let expected = ExpectedLock {
            sender: plan.lock_sender.clone(),
            receiver: plan.lock_receiver.clone(),
            amount: plan
                .amount
                .to_minor_units(self.settings().token_decimals)?,
            hashlock: request.hash_of_secret,
            timelock: request.sender_system_lock_timeout.timestamp(),
        };

        let fetched = self.ledger().get_lock(&request.lock_id).await?;
        let lock = verify_lock(request.lock_id, fetched, &expected).inspect_err(|e| {
            tracing::warn!(
                %payment_id,
                lock_id = %request.lock_id,
                error = %e,
                "lock verification failed, rejecting announcement"
            );
        })?;

        // Duplicate announcements stop here: the unique keys reject the
        // insert and no second Setup relay is triggered.
        self.inbound().insert(PaymentRecord::open(
            request.hash_of_secret,
            payment_id,
            lock.amount,
            lock.sender.clone(),
            request.lock_id,
            ix.clone(),
        ))?;
        tracing::info!(%payment_id, "inbound lock verified and recorded");

        let setup = SetupRequest {
            payment_instruction: ix.clone(),
            hash_of_secret: request.hash_of_secret,
            sender_system_lock_timeout: Some(request.sender_system_lock_timeout),
        };
        self.relay()
            .relay_setup(&plan.forward_host, &setup)
            .await
            .map_err(|e| {
                // The record is already committed; the relay failure is
                // surfaced, not rolled back.
                tracing::error!(
                    %payment_id,
                    forward_host = %plan.forward_host,
                    error = %e,
                    "setup relay failed after inbound record was persisted"
                );
                FxpError::Relay(e)
            })?;

        Ok(())
    }
}

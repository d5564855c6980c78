//! Completion handler: claim the inbound lock with the revealed secret.

use corridor_core::messages::{CompletionRequest, CompletionResponse};
use corridor_ledger::LedgerError;
use corridor_store::{PaymentStore, RecordStatus};

use crate::error::FxpError;
use crate::service::FxProvider;

impl FxProvider {
    pub async fn handle_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, FxpError> {
        let payment_id = request.payment_instruction.payment_id;
        let record = self
            .inbound()
            .get_by_payment(&payment_id)?
            .ok_or(FxpError::UnknownPayment(payment_id))?;

        let _guard = self.lock_gates.acquire(record.lock_id).await;

        // Re-read under the gate; a concurrent delivery may have settled
        // this lock already.
        let record = self
            .inbound()
            .get(&record.lock_id)?
            .ok_or(FxpError::UnknownPayment(payment_id))?;
        if record.status == RecordStatus::Withdrawn {
            tracing::info!(%payment_id, "completion replayed for settled lock");
            return Ok(CompletionResponse { payment_id });
        }

        // The secret is only trusted, and only persisted, once it hashes
        // to the recorded hashlock.
        if !record.hash.matches(&request.secret) {
            tracing::warn!(%payment_id, "completion secret does not match recorded hash");
            return Err(FxpError::SecretMismatch(payment_id));
        }

        match self.ledger().withdraw(&record.lock_id, &request.secret).await {
            Ok(()) => {
                tracing::info!(%payment_id, lock_id = %record.lock_id, "inbound lock claimed");
            }
            // Both settlement paths race toward the same terminal state;
            // losing the race is success.
            Err(LedgerError::AlreadyWithdrawn(_)) => {
                tracing::debug!(%payment_id, "lock was already withdrawn");
            }
            Err(e) => return Err(e.into()),
        }

        self.inbound()
            .mark_withdrawn(&record.lock_id, &request.secret)?;
        Ok(CompletionResponse { payment_id })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use corridor_core::messages::{CompletionRequest, LockedRequest};
    use corridor_core::{Secret, SecretHashPair, TokenId};
    use corridor_ledger::{InMemoryLedger, LockLedger, NewLock};
    use corridor_store::RecordStatus;

    use crate::error::FxpError;
    use crate::testing::{direct_instruction, provider, RecordingRelay};

    /// Set up a provider holding a verified inbound lock, returning the
    /// secret that unlocks it.
    async fn provider_with_inbound_lock() -> (
        InMemoryLedger,
        std::sync::Arc<crate::service::FxProvider>,
        corridor_core::PaymentInstruction,
        SecretHashPair,
    ) {
        let chain = InMemoryLedger::new();
        let relay = RecordingRelay::new();
        let fxp = provider(&chain, "0xfxp1", relay);

        chain.credit("0xsender", 10_000_000);
        let sender = chain.connect("0xsender");
        sender.increase_allowance(10_000_000).await.unwrap();

        let ix = direct_instruction();
        let pair = SecretHashPair::generate();
        let timelock = Utc::now().timestamp() + 3665;
        let lock_id = sender
            .create_lock(NewLock {
                receiver: "0xfxp1".into(),
                hashlock: pair.hash,
                timelock,
                token: TokenId::new("0x6749374b18a571193138251eb52f7a9b4fc5524e"),
                amount: 1_000_000,
            })
            .await
            .unwrap();

        fxp.handle_locked(LockedRequest {
            payment_instruction: ix.clone(),
            hash_of_secret: pair.hash,
            sender_system_lock_timeout: DateTime::from_timestamp(timelock, 0).unwrap(),
            lock_id,
        })
        .await
        .unwrap();

        (chain, fxp, ix, pair)
    }

    #[tokio::test]
    async fn test_completion_claims_the_inbound_lock() {
        let (_chain, fxp, ix, pair) = provider_with_inbound_lock().await;
        let payment_id = ix.payment_id;

        let response = fxp
            .handle_completion(CompletionRequest {
                payment_instruction: ix,
                secret: pair.secret.clone(),
            })
            .await
            .unwrap();
        assert_eq!(response.payment_id, payment_id);

        let record = fxp
            .inbound_record_by_payment(&payment_id)
            .unwrap()
            .unwrap();
        assert_eq!(record.status, RecordStatus::Withdrawn);
        assert_eq!(record.secret, Some(pair.secret));

        let lock = fxp
            .ledger()
            .get_lock(&record.lock_id)
            .await
            .unwrap()
            .unwrap();
        assert!(lock.withdrawn);
    }

    #[tokio::test]
    async fn test_completion_is_idempotent() {
        let (_chain, fxp, ix, pair) = provider_with_inbound_lock().await;

        let request = CompletionRequest {
            payment_instruction: ix,
            secret: pair.secret,
        };
        fxp.handle_completion(request.clone()).await.unwrap();
        // The replay settles quietly on the already-terminal record.
        fxp.handle_completion(request).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_payment_is_rejected() {
        let chain = InMemoryLedger::new();
        let relay = RecordingRelay::new();
        let fxp = provider(&chain, "0xfxp1", relay);

        let result = fxp
            .handle_completion(CompletionRequest {
                payment_instruction: direct_instruction(),
                secret: Secret::generate(),
            })
            .await;
        assert!(matches!(result, Err(FxpError::UnknownPayment(_))));
    }

    #[tokio::test]
    async fn test_wrong_secret_is_rejected_and_not_stored() {
        let (_chain, fxp, ix, _pair) = provider_with_inbound_lock().await;
        let payment_id = ix.payment_id;

        let result = fxp
            .handle_completion(CompletionRequest {
                payment_instruction: ix,
                secret: Secret::generate(),
            })
            .await;
        assert!(matches!(result, Err(FxpError::SecretMismatch(_))));

        let record = fxp
            .inbound_record_by_payment(&payment_id)
            .unwrap()
            .unwrap();
        assert_eq!(record.status, RecordStatus::Open);
        assert!(record.secret.is_none());
    }
}

//! Setup handler: outbound lock creation.
//!
//! The only handler that moves this provider's funds. It classifies the
//! instruction, checks funding, creates the lock with the cascaded
//! timelock, persists the outbound record, arms the refund fail-safe
//! and, on an intermediate hop, synchronously notifies the next hop.
//! The caller gets the payment id only after the on-chain creation is
//! confirmed; an unconfirmed lock is never reported as settled.

use chrono::DateTime;
use std::time::Duration;

use corridor_core::messages::{LockedRequest, SetupRequest, SetupResponse};
use corridor_core::{outbound_plan, HopRole};
use corridor_ledger::NewLock;
use corridor_store::{PaymentRecord, PaymentStore};

use crate::error::FxpError;
use crate::service::FxProvider;

/// Attempts for the forward Locked delivery. This relay is the only path
/// that advances the protocol, so it is retried rather than dropped.
const LOCKED_DELIVERY_ATTEMPTS: u32 = 3;
const LOCKED_DELIVERY_BACKOFF: Duration = Duration::from_millis(250);

impl FxProvider {
    pub async fn handle_setup(&self, request: SetupRequest) -> Result<SetupResponse, FxpError> {
        let ix = &request.payment_instruction;
        let payment_id = ix.payment_id;
        let plan = outbound_plan(ix, self.wallet())?;
        tracing::info!(%payment_id, role = %plan.role, "setup received");

        let _guard = self.payment_gates.acquire(payment_id).await;

        // Fail a replay before touching the chain: a second lock for the
        // same payment would not be recoverable.
        if self.outbound().get_by_payment(&payment_id)?.is_some() {
            return Err(FxpError::Duplicate(
                corridor_store::StoreError::DuplicatePayment(payment_id),
            ));
        }

        let settings = self.settings();
        let amount = plan.amount.to_minor_units(settings.token_decimals)?;

        let balance = self.ledger().balance().await?;
        if balance < amount {
            tracing::error!(%payment_id, balance, amount, "insufficient funds for setup");
            return Err(FxpError::InsufficientFunds {
                balance,
                required: amount,
            });
        }

        let allowance = self.ledger().allowance().await?;
        if allowance < amount {
            self.ledger()
                .increase_allowance(settings.target_allowance)
                .await?;
            tracing::info!(
                %payment_id,
                target = settings.target_allowance,
                "allowance increased before lock creation"
            );
        }

        let base = settings.lock_duration.max_duration();
        let timelock = settings.timelocks.expiry(base, plan.hops_upstream);
        if plan.role == HopRole::Intermediate {
            tracing::debug!(
                %payment_id,
                margin_secs = settings.timelocks.hop_margin.as_secs(),
                "intermediate hop, timelock extended by one margin"
            );
        }

        let lock_id = self
            .ledger()
            .create_lock(NewLock {
                receiver: plan.receiver.clone(),
                hashlock: request.hash_of_secret,
                timelock,
                token: settings.token.clone(),
                amount,
            })
            .await?;
        tracing::info!(%payment_id, %lock_id, timelock, "lock created");

        self.outbound().insert(PaymentRecord::open(
            request.hash_of_secret,
            payment_id,
            amount,
            plan.receiver.clone(),
            lock_id,
            ix.clone(),
        ))?;

        self.refunds().arm(lock_id, timelock);

        if let Some(next_hop) = plan.notify {
            let locked = LockedRequest {
                payment_instruction: ix.clone(),
                hash_of_secret: request.hash_of_secret,
                sender_system_lock_timeout: DateTime::from_timestamp(timelock, 0)
                    .unwrap_or(DateTime::UNIX_EPOCH),
                lock_id,
            };
            self.deliver_locked(&next_hop.host, &locked).await?;
        }

        Ok(SetupResponse { payment_id })
    }

    /// Deliver the Locked notification with bounded retries. The lock
    /// already exists on-chain, so a delivery failure is surfaced to the
    /// caller but never rolls local state back.
    async fn deliver_locked(
        &self,
        peer: &corridor_core::HostName,
        request: &LockedRequest,
    ) -> Result<(), FxpError> {
        let mut last_error = None;
        for attempt in 1..=LOCKED_DELIVERY_ATTEMPTS {
            match self.relay().send_locked(peer, request).await {
                Ok(()) => {
                    tracing::info!(
                        payment_id = %request.payment_instruction.payment_id,
                        %peer,
                        "locked notification delivered"
                    );
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        payment_id = %request.payment_instruction.payment_id,
                        %peer,
                        attempt,
                        error = %e,
                        "locked notification delivery failed"
                    );
                    last_error = Some(e);
                    if attempt < LOCKED_DELIVERY_ATTEMPTS {
                        tokio::time::sleep(LOCKED_DELIVERY_BACKOFF * attempt).await;
                    }
                }
            }
        }
        Err(last_error
            .map(FxpError::Relay)
            .unwrap_or_else(|| FxpError::Relay(crate::relay::RelayError::Transport(
                "no delivery attempt made".into(),
            ))))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use corridor_core::messages::SetupRequest;
    use corridor_core::SecretHashPair;
    use corridor_ledger::{InMemoryLedger, LockLedger};
    use corridor_store::PaymentStore;

    use crate::error::FxpError;
    use crate::testing::{direct_instruction, intermediated_instruction, provider, RecordingRelay};

    fn setup_request(ix: corridor_core::PaymentInstruction) -> (SetupRequest, SecretHashPair) {
        let pair = SecretHashPair::generate();
        (
            SetupRequest {
                payment_instruction: ix,
                hash_of_secret: pair.hash,
                sender_system_lock_timeout: None,
            },
            pair,
        )
    }

    #[tokio::test]
    async fn test_direct_setup_creates_recipient_lock() {
        let chain = InMemoryLedger::new();
        let relay = RecordingRelay::new();
        let fxp = provider(&chain, "0xfxp1", relay.clone());

        let (request, pair) = setup_request(direct_instruction());
        let payment_id = request.payment_instruction.payment_id;
        let response = fxp.handle_setup(request).await.unwrap();
        assert_eq!(response.payment_id, payment_id);

        let record = fxp.inbound_record_by_payment(&payment_id).unwrap();
        assert!(record.is_none(), "setup must not write the inbound set");
        let record = fxp
            .outbound()
            .get_by_payment(&payment_id)
            .unwrap()
            .expect("outbound record persisted");
        assert_eq!(record.amount, 1_044_800); // 104.48 at 4 decimals
        assert_eq!(record.hash, pair.hash);

        let lock = fxp
            .ledger()
            .get_lock(&record.lock_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(lock.receiver, "0xrecipient".into());
        assert_eq!(lock.amount, 1_044_800);
        // Recipient-side hop: base duration, no margin.
        let expected = Utc::now().timestamp() + 3600;
        assert!((lock.timelock - expected).abs() <= 5);

        // Direct route terminates here: nobody to notify.
        assert!(relay.locked.lock().unwrap().is_empty());
        assert_eq!(fxp.refunds().armed(), 1);
    }

    #[tokio::test]
    async fn test_intermediate_setup_notifies_next_hop() {
        let chain = InMemoryLedger::new();
        let relay = RecordingRelay::new();
        let fxp = provider(&chain, "0xfxp1", relay.clone());

        let (request, _) = setup_request(intermediated_instruction());
        fxp.handle_setup(request).await.unwrap();

        let (peer, locked) = {
            let deliveries = relay.locked.lock().unwrap();
            deliveries.first().cloned().expect("locked notification sent")
        };
        assert_eq!(peer.as_str(), "no:fxp2");

        // The notification names the freshly created lock and its exact
        // expiry; intermediate hops carry one extra margin.
        let lock = fxp
            .ledger()
            .get_lock(&locked.lock_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(lock.timelock, locked.sender_system_lock_timeout.timestamp());
        let expected = Utc::now().timestamp() + 3600 + 65;
        assert!((lock.timelock - expected).abs() <= 5);
    }

    #[tokio::test]
    async fn test_duplicate_setup_rejected_before_chain_write() {
        let chain = InMemoryLedger::new();
        let relay = RecordingRelay::new();
        let fxp = provider(&chain, "0xfxp1", relay.clone());

        let (request, _) = setup_request(direct_instruction());
        let balance_before = fxp.ledger().balance().await.unwrap();
        fxp.handle_setup(request.clone()).await.unwrap();
        let balance_after_first = fxp.ledger().balance().await.unwrap();
        assert!(balance_after_first < balance_before);

        let result = fxp.handle_setup(request).await;
        assert!(matches!(result, Err(FxpError::Duplicate(_))));
        // The replay must not have locked funds a second time.
        assert_eq!(fxp.ledger().balance().await.unwrap(), balance_after_first);
    }

    #[tokio::test]
    async fn test_insufficient_funds_is_surfaced() {
        let chain = InMemoryLedger::new();
        let relay = RecordingRelay::new();
        // No credit for this wallet.
        let fxp = std::sync::Arc::new(crate::service::FxProvider::new(
            crate::service::FxProviderDeps {
                ledger: std::sync::Arc::new(chain.connect("0xpoor")),
                outbound: std::sync::Arc::new(corridor_store::MemoryPaymentStore::new()),
                inbound: std::sync::Arc::new(corridor_store::MemoryPaymentStore::new()),
                relay,
            },
            crate::service::FxProviderSettings::default(),
        ));

        let mut ix = direct_instruction();
        ix.recipient_system_fx.wallet = "0xpoor".into();
        ix.sender_system_fx.wallet = "0xpoor".into();
        let (request, _) = setup_request(ix);
        let result = fxp.handle_setup(request).await;
        assert!(matches!(result, Err(FxpError::InsufficientFunds { .. })));
    }

    #[tokio::test]
    async fn test_setup_tops_up_allowance_when_low() {
        let chain = InMemoryLedger::new();
        let relay = RecordingRelay::new();
        let fxp = provider(&chain, "0xfxp1", relay);

        assert_eq!(fxp.ledger().allowance().await.unwrap(), 0);
        let (request, _) = setup_request(direct_instruction());
        fxp.handle_setup(request).await.unwrap();

        let target = fxp.settings().target_allowance;
        assert_eq!(
            fxp.ledger().allowance().await.unwrap(),
            target - 1_044_800
        );
    }
}

//! The liquidity provider service and its dependency wiring.

use std::sync::Arc;
use std::time::Duration;

use corridor_core::{
    LockDurationConfig, LockId, PaymentId, TimelockPolicy, TokenId, WalletAddress,
};
use corridor_ledger::LockLedger;
use corridor_store::PaymentStore;

use crate::refund::RefundScheduler;
use crate::relay::ProtocolRelay;
use crate::sync::KeyedMutex;

/// External collaborators, constructed once and passed in explicitly so
/// tests can substitute a fake ledger, in-memory stores, and a loopback
/// relay.
pub struct FxProviderDeps {
    pub ledger: Arc<dyn LockLedger>,
    pub outbound: Arc<dyn PaymentStore>,
    pub inbound: Arc<dyn PaymentStore>,
    pub relay: Arc<dyn ProtocolRelay>,
}

/// Tunables for one provider instance.
#[derive(Debug, Clone)]
pub struct FxProviderSettings {
    /// Token contract settled through the lock contract.
    pub token: TokenId,
    /// Decimal places of the token's integer unit.
    pub token_decimals: u32,
    /// Allowance level restored when the current allowance runs low.
    pub target_allowance: u128,
    /// Delay past a lock's expiry before the fail-safe fires.
    pub refund_grace: Duration,
    pub lock_duration: LockDurationConfig,
    pub timelocks: TimelockPolicy,
}

impl Default for FxProviderSettings {
    fn default() -> Self {
        Self {
            token: TokenId::new("0x6749374b18a571193138251eb52f7a9b4fc5524e"),
            token_decimals: 4,
            target_allowance: 100_000 * 10u128.pow(4),
            refund_grace: Duration::from_secs(1),
            lock_duration: LockDurationConfig::default(),
            timelocks: TimelockPolicy::default(),
        }
    }
}

/// One liquidity provider instance: a single wallet bridging one leg of
/// each payment route it participates in.
pub struct FxProvider {
    wallet: WalletAddress,
    settings: FxProviderSettings,
    ledger: Arc<dyn LockLedger>,
    outbound: Arc<dyn PaymentStore>,
    inbound: Arc<dyn PaymentStore>,
    relay: Arc<dyn ProtocolRelay>,
    refunds: RefundScheduler,
    /// Serializes work per lock id (event handling, completion, replays).
    pub(crate) lock_gates: KeyedMutex<LockId>,
    /// Serializes work per payment id (setup duplicates).
    pub(crate) payment_gates: KeyedMutex<PaymentId>,
}

impl FxProvider {
    pub fn new(deps: FxProviderDeps, settings: FxProviderSettings) -> Self {
        let wallet = deps.ledger.wallet().clone();
        let refunds = RefundScheduler::new(
            Arc::clone(&deps.ledger),
            Arc::clone(&deps.outbound),
            settings.refund_grace,
        );
        tracing::info!(%wallet, "liquidity provider initialized");
        Self {
            wallet,
            settings,
            ledger: deps.ledger,
            outbound: deps.outbound,
            inbound: deps.inbound,
            relay: deps.relay,
            refunds,
            lock_gates: KeyedMutex::new(),
            payment_gates: KeyedMutex::new(),
        }
    }

    pub fn wallet(&self) -> &WalletAddress {
        &self.wallet
    }

    pub fn settings(&self) -> &FxProviderSettings {
        &self.settings
    }

    pub fn ledger(&self) -> &Arc<dyn LockLedger> {
        &self.ledger
    }

    pub(crate) fn outbound(&self) -> &Arc<dyn PaymentStore> {
        &self.outbound
    }

    pub(crate) fn inbound(&self) -> &Arc<dyn PaymentStore> {
        &self.inbound
    }

    pub(crate) fn relay(&self) -> &Arc<dyn ProtocolRelay> {
        &self.relay
    }

    pub(crate) fn refunds(&self) -> &RefundScheduler {
        &self.refunds
    }

    /// Outbound record for a lock this provider created (read-only view
    /// for callers outside the handlers).
    pub fn outbound_record(
        &self,
        lock_id: &LockId,
    ) -> Result<Option<corridor_store::PaymentRecord>, corridor_store::StoreError> {
        self.outbound.get(lock_id)
    }

    /// Inbound record looked up by payment id.
    pub fn inbound_record_by_payment(
        &self,
        payment_id: &PaymentId,
    ) -> Result<Option<corridor_store::PaymentRecord>, corridor_store::StoreError> {
        self.inbound.get_by_payment(payment_id)
    }

    /// Outbound record looked up by payment id.
    pub fn outbound_record_by_payment(
        &self,
        payment_id: &PaymentId,
    ) -> Result<Option<corridor_store::PaymentRecord>, corridor_store::StoreError> {
        self.outbound.get_by_payment(payment_id)
    }
}

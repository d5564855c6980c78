//! Shared fixtures for corridor end-to-end tests.
//!
//! Providers run against one in-memory chain and reach each other through
//! a loopback relay that dispatches messages in-process, so a whole
//! corridor (sender → provider(s) → recipient) fits in a single test.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use corridor_core::messages::{
    CompletionRequest, CompletionResponse, LockedRequest, SetupRequest, SetupResponse,
};
use corridor_core::{
    Amount, Currency, Endpoint, HostName, LockDurationConfig, Party, PaymentId,
    PaymentInstruction, TokenId,
};
use corridor_fxp::{FxProvider, FxProviderDeps, FxProviderSettings, ProtocolRelay, RelayError};
use corridor_ledger::{InMemoryLedger, LockLedger};
use corridor_store::MemoryPaymentStore;

pub const TOKEN: &str = "0x6749374b18a571193138251eb52f7a9b4fc5524e";
pub const TOKEN_DECIMALS: u32 = 4;

/// In-process relay: resolves host names to provider instances directly.
#[derive(Default)]
pub struct LoopbackRelay {
    providers: RwLock<HashMap<String, Arc<FxProvider>>>,
}

impl LoopbackRelay {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn register(&self, host: &str, provider: Arc<FxProvider>) {
        self.providers
            .write()
            .unwrap()
            .insert(host.to_lowercase(), provider);
    }

    fn resolve(&self, host: &HostName) -> Result<Arc<FxProvider>, RelayError> {
        self.providers
            .read()
            .unwrap()
            .get(host.as_str())
            .cloned()
            .ok_or_else(|| RelayError::Transport(format!("unknown host {host}")))
    }
}

#[async_trait]
impl ProtocolRelay for LoopbackRelay {
    async fn relay_setup(
        &self,
        forward_to: &HostName,
        request: &SetupRequest,
    ) -> Result<SetupResponse, RelayError> {
        let provider = self.resolve(forward_to)?;
        provider
            .handle_setup(request.clone())
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))
    }

    async fn relay_completion(
        &self,
        forward_to: &HostName,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, RelayError> {
        let provider = self.resolve(forward_to)?;
        provider
            .handle_completion(request.clone())
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))
    }

    async fn send_locked(
        &self,
        peer: &HostName,
        request: &LockedRequest,
    ) -> Result<(), RelayError> {
        let provider = self.resolve(peer)?;
        provider
            .handle_locked(request.clone())
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))
    }
}

/// Build a funded provider on the shared chain and register its hosts
/// with the loopback relay.
pub fn spawn_provider(
    chain: &InMemoryLedger,
    relay: &Arc<LoopbackRelay>,
    wallet: &str,
    hosts: &[&str],
    base_lock_duration: Duration,
    refund_grace: Duration,
) -> Arc<FxProvider> {
    chain.credit(wallet, 1_000_000_000);
    let provider = Arc::new(FxProvider::new(
        FxProviderDeps {
            ledger: Arc::new(chain.connect(wallet)),
            outbound: Arc::new(MemoryPaymentStore::new()),
            inbound: Arc::new(MemoryPaymentStore::new()),
            relay: relay.clone() as Arc<dyn ProtocolRelay>,
        },
        FxProviderSettings {
            token: TokenId::new(TOKEN),
            token_decimals: TOKEN_DECIMALS,
            target_allowance: 1_000_000_000,
            refund_grace,
            lock_duration: LockDurationConfig::fixed(base_lock_duration),
            timelocks: Default::default(),
        },
    ));
    for host in hosts {
        relay.register(host, provider.clone());
    }
    corridor_fxp::spawn_withdrawal_listener(provider.clone());
    provider
}

/// Direct NOK→SEK instruction bridged by one provider wallet.
pub fn direct_instruction() -> PaymentInstruction {
    PaymentInstruction {
        payment_id: PaymentId::new(),
        sender: Party::new("0xab01"),
        recipient: Party::new("0xcd02"),
        sender_system_fx: Endpoint::new("0xfxp1", "no:fxp1"),
        recipient_system_fx: Endpoint::new("0xfxp1", "se:fxp1"),
        source_currency: Currency::NOK,
        target_currency: Currency::SEK,
        source_amount: Amount(100.0),
        target_amount: Amount(104.48),
        intermediate_currency: None,
        intermediate_amount: None,
        intermediate_sender_fx: None,
        intermediate_recipient_fx: None,
    }
}

/// Two-hop NOK→NOK instruction bridged FXP1 → FXP2.
pub fn intermediated_instruction() -> PaymentInstruction {
    PaymentInstruction {
        payment_id: PaymentId::new(),
        sender: Party::new("0xab01"),
        recipient: Party::new("0xcd02"),
        sender_system_fx: Endpoint::new("0xfxp1", "no:fxp1"),
        recipient_system_fx: Endpoint::new("0xfxp2", "no:fxp2"),
        source_currency: Currency::NOK,
        target_currency: Currency::NOK,
        source_amount: Amount(100.0),
        target_amount: Amount(100.0),
        intermediate_currency: Some(Currency::NOK),
        intermediate_amount: Some(Amount(100.0)),
        intermediate_sender_fx: Some(Endpoint::new("0xfxp1", "no:fxp1")),
        intermediate_recipient_fx: Some(Endpoint::new("0xfxp2", "no:fxp2")),
    }
}

/// Fund a sender wallet and return its chain handle with allowance set.
pub async fn funded_sender(chain: &InMemoryLedger, wallet: &str) -> impl LockLedger {
    chain.credit(wallet, 1_000_000_000);
    let handle = chain.connect(wallet);
    handle.increase_allowance(1_000_000_000).await.unwrap();
    handle
}

/// Poll until `condition` holds or the timeout elapses.
pub async fn wait_until<F>(mut condition: F, timeout: Duration) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

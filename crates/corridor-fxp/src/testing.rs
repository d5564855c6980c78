//! Shared fixtures for handler tests: an in-memory chain, in-memory
//! stores, and a recording relay.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use corridor_core::messages::{
    CompletionRequest, CompletionResponse, LockedRequest, SetupRequest, SetupResponse,
};
use corridor_core::{Amount, Currency, Endpoint, HostName, Party, PaymentId, PaymentInstruction};
use corridor_ledger::InMemoryLedger;
use corridor_store::MemoryPaymentStore;

use crate::relay::{ProtocolRelay, RelayError};
use crate::service::{FxProvider, FxProviderDeps, FxProviderSettings};

/// Relay double that records every delivery and can be told to fail.
#[derive(Default)]
pub struct RecordingRelay {
    pub setups: Mutex<Vec<(HostName, SetupRequest)>>,
    pub completions: Mutex<Vec<(HostName, CompletionRequest)>>,
    pub locked: Mutex<Vec<(HostName, LockedRequest)>>,
    pub fail_all: AtomicBool,
}

impl RecordingRelay {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_deliveries(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RelayError> {
        if self.fail_all.load(Ordering::SeqCst) {
            Err(RelayError::Rejected { status: 500 })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ProtocolRelay for RecordingRelay {
    async fn relay_setup(
        &self,
        forward_to: &HostName,
        request: &SetupRequest,
    ) -> Result<SetupResponse, RelayError> {
        self.check()?;
        self.setups
            .lock()
            .unwrap()
            .push((forward_to.clone(), request.clone()));
        Ok(SetupResponse {
            payment_id: request.payment_instruction.payment_id,
        })
    }

    async fn relay_completion(
        &self,
        forward_to: &HostName,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, RelayError> {
        self.check()?;
        self.completions
            .lock()
            .unwrap()
            .push((forward_to.clone(), request.clone()));
        Ok(CompletionResponse {
            payment_id: request.payment_instruction.payment_id,
        })
    }

    async fn send_locked(
        &self,
        peer: &HostName,
        request: &LockedRequest,
    ) -> Result<(), RelayError> {
        self.check()?;
        self.locked
            .lock()
            .unwrap()
            .push((peer.clone(), request.clone()));
        Ok(())
    }
}

/// A funded provider over the shared chain, with in-memory stores.
pub fn provider(
    chain: &InMemoryLedger,
    wallet: &str,
    relay: Arc<dyn ProtocolRelay>,
) -> Arc<FxProvider> {
    chain.credit(wallet, 10_000_000_000);
    Arc::new(FxProvider::new(
        FxProviderDeps {
            ledger: Arc::new(chain.connect(wallet)),
            outbound: Arc::new(MemoryPaymentStore::new()),
            inbound: Arc::new(MemoryPaymentStore::new()),
            relay,
        },
        FxProviderSettings::default(),
    ))
}

/// Direct NOK→SEK instruction bridged by the single wallet `0xfxp1`.
pub fn direct_instruction() -> PaymentInstruction {
    PaymentInstruction {
        payment_id: PaymentId::new(),
        sender: Party::new("0xsender"),
        recipient: Party::new("0xrecipient"),
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

/// Two-hop NOK→NOK instruction bridged `0xfxp1` → `0xfxp2`.
pub fn intermediated_instruction() -> PaymentInstruction {
    PaymentInstruction {
        payment_id: PaymentId::new(),
        sender: Party::new("0xsender"),
        recipient: Party::new("0xrecipient"),
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

//! Discovery handling and sender-visible settlement queries.

use std::sync::Arc;

use chrono::Utc;

use corridor_core::messages::{DiscoveryRequest, DiscoveryResponse};
use corridor_core::{LockDurationConfig, SecretHashPair, WalletAddress};
use corridor_store::{SecretRecord, SecretStore, StoreError};

use crate::error::PspError;

#[derive(Debug, Clone)]
pub struct PspSettings {
    /// Decimal places of the settlement token's integer unit.
    pub token_decimals: u32,
    pub lock_duration: LockDurationConfig,
}

impl Default for PspSettings {
    fn default() -> Self {
        Self {
            token_decimals: 4,
            lock_duration: LockDurationConfig::default(),
        }
    }
}

pub struct Psp {
    secrets: Arc<dyn SecretStore>,
    settings: PspSettings,
}

fn looks_like_address(wallet: &WalletAddress) -> bool {
    let raw = wallet.as_str();
    raw.len() > 2
        && raw.starts_with("0x")
        && raw[2..].chars().all(|c| c.is_ascii_hexdigit())
}

impl Psp {
    pub fn new(secrets: Arc<dyn SecretStore>, settings: PspSettings) -> Self {
        Self { secrets, settings }
    }

    /// The underlying secret store.
    pub fn secrets(&self) -> &Arc<dyn SecretStore> {
        &self.secrets
    }

    /// Generate (or return) the secret/hash pair for a payment.
    ///
    /// Idempotent per payment id: a replayed discovery returns the
    /// originally issued hash instead of tripping the unique index, so a
    /// retried request can never split one payment across two secrets.
    pub fn handle_discovery(
        &self,
        request: DiscoveryRequest,
    ) -> Result<DiscoveryResponse, PspError> {
        let ix = &request.payment_instruction;
        let payment_id = ix.payment_id;

        if !looks_like_address(&ix.recipient.wallet) {
            return Err(PspError::Validation(format!(
                "recipient wallet is not an address: {}",
                ix.recipient.wallet
            )));
        }

        let lock_max_duration = self.settings.lock_duration.max_duration();

        if let Some(existing) = self.secrets.get_by_payment(&payment_id)? {
            tracing::info!(%payment_id, "discovery replayed, returning issued hash");
            return Ok(DiscoveryResponse {
                hash_of_secret: existing.hash,
                lock_max_duration: lock_max_duration.as_millis() as u64,
                payment_id,
            });
        }

        let amount = ix
            .target_amount
            .to_minor_units(self.settings.token_decimals)?;
        let pair = SecretHashPair::generate();

        match self.secrets.insert(SecretRecord {
            recipient: ix.recipient.wallet.clone(),
            sender: ix.sender.wallet.clone(),
            source_currency: ix.source_currency,
            amount,
            hash: pair.hash,
            secret: pair.secret,
            payment_id,
            created_at: Utc::now(),
            lock_id: None,
        }) {
            Ok(()) => {}
            // Lost an insert race to a concurrent replay; serve its hash.
            Err(StoreError::DuplicatePayment(_)) => {
                if let Some(existing) = self.secrets.get_by_payment(&payment_id)? {
                    return Ok(DiscoveryResponse {
                        hash_of_secret: existing.hash,
                        lock_max_duration: lock_max_duration.as_millis() as u64,
                        payment_id,
                    });
                }
                return Err(PspError::Store(StoreError::DuplicatePayment(payment_id)));
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(%payment_id, hash = %pair.hash, "secret issued for payment");

        Ok(DiscoveryResponse {
            hash_of_secret: pair.hash,
            lock_max_duration: lock_max_duration.as_millis() as u64,
            payment_id,
        })
    }

    /// Settlement records addressed to the given wallet, newest first.
    pub fn secrets_by_address(
        &self,
        address: &WalletAddress,
    ) -> Result<Vec<SecretRecord>, PspError> {
        if !looks_like_address(address) {
            return Err(PspError::Validation(format!(
                "not a wallet address: {address}"
            )));
        }
        Ok(self.secrets.list_by_recipient(address)?)
    }
}

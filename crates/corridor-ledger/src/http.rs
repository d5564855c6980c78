//! HTTP client for a ledger gateway.
//!
//! The gateway fronts the ledger's lock contract with a small REST
//! surface; this client signs nothing itself, the gateway holds the
//! wallet binding established at connection time. Events are pulled with
//! a long-poll cursor and republished on a local broadcast channel so the
//! rest of the process consumes them exactly like the in-memory feed.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use corridor_core::{LockId, Secret, WalletAddress};

use crate::error::LedgerError;
use crate::lock::{LedgerEvent, Lock, NewLock};
use crate::traits::LockLedger;

const EVENT_CHANNEL_CAPACITY: usize = 256;
const EVENT_POLL_RETRY_SECS: u64 = 1;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateLockBody<'a> {
    sender: &'a WalletAddress,
    new_lock: &'a NewLock,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateLockReply {
    lock_id: LockId,
}

#[derive(Debug, Serialize)]
struct WithdrawBody<'a> {
    preimage: &'a Secret,
}

#[derive(Debug, Deserialize)]
struct BalanceReply {
    balance: u128,
}

#[derive(Debug, Deserialize)]
struct AllowanceReply {
    allowance: u128,
}

#[derive(Debug, Serialize)]
struct IncreaseAllowanceBody {
    amount: u128,
}

#[derive(Debug, Deserialize)]
struct EventsReply {
    events: Vec<SequencedEvent>,
}

#[derive(Debug, Deserialize)]
struct SequencedEvent {
    seq: u64,
    event: LedgerEvent,
}

/// Ledger gateway client bound to one wallet.
pub struct HttpLedger {
    base_url: String,
    wallet: WalletAddress,
    client: reqwest::Client,
    events: broadcast::Sender<LedgerEvent>,
}

impl HttpLedger {
    pub fn new(base_url: impl Into<String>, wallet: impl Into<WalletAddress>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            wallet: wallet.into(),
            client: reqwest::Client::new(),
            events,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, LedgerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(LedgerError::Rejected(format!(
            "gateway returned {status}: {body}"
        )))
    }

    /// Spawn the event pump: long-polls the gateway feed and republishes
    /// decoded events on the local broadcast channel.
    pub fn spawn_event_pump(self: &Arc<Self>) -> JoinHandle<()> {
        let ledger = Arc::clone(self);
        tokio::spawn(async move {
            let mut cursor = 0u64;
            loop {
                let url = ledger.url(&format!("/events?after={cursor}"));
                match ledger.client.get(&url).send().await {
                    Ok(response) if response.status().is_success() => {
                        match response.json::<EventsReply>().await {
                            Ok(reply) => {
                                for sequenced in reply.events {
                                    cursor = cursor.max(sequenced.seq);
                                    let _ = ledger.events.send(sequenced.event);
                                }
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "failed to decode ledger event batch");
                            }
                        }
                    }
                    Ok(response) => {
                        tracing::warn!(status = %response.status(), "ledger event poll rejected");
                        tokio::time::sleep(std::time::Duration::from_secs(EVENT_POLL_RETRY_SECS))
                            .await;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "ledger event poll failed");
                        tokio::time::sleep(std::time::Duration::from_secs(EVENT_POLL_RETRY_SECS))
                            .await;
                    }
                }
            }
        })
    }
}

#[async_trait]
impl LockLedger for HttpLedger {
    fn wallet(&self) -> &WalletAddress {
        &self.wallet
    }

    async fn create_lock(&self, new_lock: NewLock) -> Result<LockId, LedgerError> {
        let body = CreateLockBody {
            sender: &self.wallet,
            new_lock: &new_lock,
        };
        let response = self
            .client
            .post(self.url("/locks"))
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        let reply: CreateLockReply = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Ok(reply.lock_id)
    }

    async fn get_lock(&self, id: &LockId) -> Result<Option<Lock>, LedgerError> {
        let response = self
            .client
            .get(self.url(&format!("/locks/{id}")))
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let lock: Lock = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Ok(Some(lock))
    }

    async fn withdraw(&self, id: &LockId, preimage: &Secret) -> Result<(), LedgerError> {
        let response = self
            .client
            .post(self.url(&format!("/locks/{id}/withdraw")))
            .json(&WithdrawBody { preimage })
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Self::check(response).await?;
        Ok(())
    }

    async fn refund(&self, id: &LockId) -> Result<(), LedgerError> {
        let response = self
            .client
            .post(self.url(&format!("/locks/{id}/refund")))
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Self::check(response).await?;
        Ok(())
    }

    async fn balance(&self) -> Result<u128, LedgerError> {
        let response = self
            .client
            .get(self.url(&format!("/balances/{}", self.wallet)))
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        let reply: BalanceReply = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Ok(reply.balance)
    }

    async fn allowance(&self) -> Result<u128, LedgerError> {
        let response = self
            .client
            .get(self.url(&format!("/allowances/{}", self.wallet)))
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        let reply: AllowanceReply = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Ok(reply.allowance)
    }

    async fn increase_allowance(&self, amount: u128) -> Result<(), LedgerError> {
        let response = self
            .client
            .post(self.url(&format!("/allowances/{}", self.wallet)))
            .json(&IncreaseAllowanceBody { amount })
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Self::check(response).await?;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }
}

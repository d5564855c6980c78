//! Wire messages exchanged between corridor services.
//!
//! All bodies are JSON with camelCase field names. Schema validation and
//! origin authentication happen at the transport boundary; handlers may
//! assume structurally well-formed input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::instruction::{PaymentId, PaymentInstruction};
use crate::secret::{HashLock, Secret};
use crate::types::{Amount, Currency, Endpoint, LockId};

/// Shared-secret transport header checked by the hub on every request.
pub const CORRIDOR_HEADER: &str = "x-corridor";

/// Names the directory entry a hub-relayed message is forwarded to.
pub const FORWARD_TO_HOST_HEADER: &str = "x-corridor-forward-to-host";

/// How a quoted FX rate is to be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateType {
    Bid,
    Ask,
    /// Combined rate across an intermediated route.
    Effective,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub source_currency: Currency,
    pub target_currency: Currency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_amount: Option<Amount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub source_currency: Currency,
    pub target_currency: Currency,
    pub source_amount: Amount,
    pub target_amount: Amount,
    pub quote_id: uuid::Uuid,
    pub rate: f64,
    pub rate_type: RateType,
    pub fx_name: String,
    pub sender_system_fx: Endpoint,
    pub recipient_system_fx: Endpoint,
    pub expiry_timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intermediate_currency: Option<Currency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intermediate_amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intermediate_sender_fx: Option<Endpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intermediate_recipient_fx: Option<Endpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryRequest {
    pub payment_instruction: PaymentInstruction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResponse {
    pub hash_of_secret: HashLock,
    /// Maximum lock duration, milliseconds.
    pub lock_max_duration: u64,
    pub payment_id: PaymentId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRequest {
    pub payment_instruction: PaymentInstruction,
    pub hash_of_secret: HashLock,
    /// Expiry of the upstream lock, carried through the relay chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_system_lock_timeout: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupResponse {
    pub payment_id: PaymentId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedRequest {
    pub payment_instruction: PaymentInstruction,
    pub hash_of_secret: HashLock,
    /// Absolute expiry of the announced lock; the verification gate checks
    /// the on-chain timelock against this timestamp exactly.
    pub sender_system_lock_timeout: DateTime<Utc>,
    pub lock_id: LockId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub payment_instruction: PaymentInstruction,
    pub secret: Secret,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    pub payment_id: PaymentId,
}

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Amount, Currency, Endpoint, Party};

/// Unique identifier of one end-to-end payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(pub Uuid);

impl PaymentId {
    /// Create a new random payment ID (UUID v7 — time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for PaymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable cross-border payment instruction.
///
/// The route kind is never an explicit flag: an instruction is
/// intermediated if and only if all four intermediate fields are present.
/// Use [`PaymentInstruction::route`] to obtain the parsed variant instead
/// of probing individual optionals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInstruction {
    pub payment_id: PaymentId,
    pub sender: Party,
    pub recipient: Party,
    pub sender_system_fx: Endpoint,
    pub recipient_system_fx: Endpoint,
    pub source_currency: Currency,
    pub target_currency: Currency,
    pub source_amount: Amount,
    pub target_amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intermediate_currency: Option<Currency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intermediate_amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intermediate_sender_fx: Option<Endpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intermediate_recipient_fx: Option<Endpoint>,
}

/// The structurally derived route of an instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Route<'a> {
    /// One liquidity provider bridges sender and recipient (PVP).
    Direct,
    /// Two liquidity providers bridge through an intermediate leg (PVPVP).
    Intermediated {
        currency: Currency,
        amount: Amount,
        sender_fx: &'a Endpoint,
        recipient_fx: &'a Endpoint,
    },
}

impl PaymentInstruction {
    /// Derive the route kind from field presence.
    ///
    /// All four intermediate fields must be present for the instruction to
    /// classify as intermediated; anything less is a direct route, never a
    /// partial one.
    pub fn route(&self) -> Route<'_> {
        match (
            self.intermediate_currency,
            self.intermediate_amount,
            self.intermediate_sender_fx.as_ref(),
            self.intermediate_recipient_fx.as_ref(),
        ) {
            (Some(currency), Some(amount), Some(sender_fx), Some(recipient_fx)) => {
                Route::Intermediated {
                    currency,
                    amount,
                    sender_fx,
                    recipient_fx,
                }
            }
            _ => Route::Direct,
        }
    }

    pub fn is_intermediated(&self) -> bool {
        matches!(self.route(), Route::Intermediated { .. })
    }
}

//! Role classification for protocol messages.
//!
//! Every handler derives its role by comparing its own wallet address
//! (case-insensitively) against the identity slots valid for the message
//! direction. A wallet matching no expected slot is a hard
//! `UnsupportedRoute` failure: acting on a misclassified role could
//! misroute funds, so there is no best-effort fallback.

use std::fmt;

use crate::error::CoreError;
use crate::instruction::{PaymentInstruction, Route};
use crate::types::{Amount, Endpoint, HostName, WalletAddress};

/// The position of a liquidity provider hop within a payment route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopRole {
    /// Adjacent to the sender; receives the sender's lock.
    SenderSide,
    /// Bridges two providers on an intermediated route.
    Intermediate,
    /// Adjacent to the recipient; creates the final lock.
    RecipientSide,
}

impl fmt::Display for HopRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SenderSide => write!(f, "sender-side"),
            Self::Intermediate => write!(f, "intermediate"),
            Self::RecipientSide => write!(f, "recipient-side"),
        }
    }
}

/// Plan for handling a Setup message: which lock to create, toward whom,
/// and whether the next hop must be notified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundPlan {
    pub role: HopRole,
    /// Wallet the new lock pays out to.
    pub receiver: WalletAddress,
    /// Decimal amount of the new lock.
    pub amount: Amount,
    /// Number of hops between this lock and the route's final lock; feeds
    /// the timelock cascade.
    pub hops_upstream: u32,
    /// The peer to notify with a Locked message, when this hop is not the
    /// route terminus.
    pub notify: Option<Endpoint>,
}

/// Plan for handling a Locked message: the expected on-chain parties and
/// amount of the announced lock, and where to relay Setup next.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundPlan {
    pub role: HopRole,
    /// Expected on-chain sender of the announced lock.
    pub lock_sender: WalletAddress,
    /// Expected on-chain receiver of the announced lock.
    pub lock_receiver: WalletAddress,
    /// Expected decimal amount of the announced lock.
    pub amount: Amount,
    /// Host to relay the Setup message to, through the hub.
    pub forward_host: HostName,
}

fn unsupported(context: &str, ix: &PaymentInstruction, me: &WalletAddress) -> CoreError {
    CoreError::UnsupportedRoute(format!(
        "{context}: wallet {me} matches no identity slot of payment {}",
        ix.payment_id
    ))
}

/// Classify a Setup message (outbound lock creation).
pub fn outbound_plan(
    ix: &PaymentInstruction,
    me: &WalletAddress,
) -> Result<OutboundPlan, CoreError> {
    match ix.route() {
        Route::Intermediated {
            amount,
            sender_fx,
            recipient_fx,
            ..
        } => {
            if sender_fx.wallet == *me {
                Ok(OutboundPlan {
                    role: HopRole::Intermediate,
                    receiver: recipient_fx.wallet.clone(),
                    amount,
                    hops_upstream: 1,
                    notify: Some(recipient_fx.clone()),
                })
            } else if ix.recipient_system_fx.wallet == *me {
                Ok(OutboundPlan {
                    role: HopRole::RecipientSide,
                    receiver: ix.recipient.wallet.clone(),
                    amount: ix.target_amount,
                    hops_upstream: 0,
                    notify: None,
                })
            } else {
                Err(unsupported("setup", ix, me))
            }
        }
        Route::Direct => {
            if ix.recipient_system_fx.wallet == *me {
                Ok(OutboundPlan {
                    role: HopRole::RecipientSide,
                    receiver: ix.recipient.wallet.clone(),
                    amount: ix.target_amount,
                    hops_upstream: 0,
                    notify: None,
                })
            } else {
                Err(unsupported("setup", ix, me))
            }
        }
    }
}

/// Classify a Locked message (inbound lock verification).
pub fn inbound_plan(ix: &PaymentInstruction, me: &WalletAddress) -> Result<InboundPlan, CoreError> {
    match ix.route() {
        Route::Intermediated {
            amount,
            sender_fx,
            recipient_fx,
            ..
        } => {
            if ix.sender_system_fx.wallet == *me {
                Ok(InboundPlan {
                    role: HopRole::SenderSide,
                    lock_sender: ix.sender.wallet.clone(),
                    lock_receiver: ix.sender_system_fx.wallet.clone(),
                    amount: ix.source_amount,
                    forward_host: sender_fx.host.clone(),
                })
            } else if recipient_fx.wallet == *me {
                Ok(InboundPlan {
                    role: HopRole::Intermediate,
                    lock_sender: sender_fx.wallet.clone(),
                    lock_receiver: recipient_fx.wallet.clone(),
                    amount,
                    forward_host: ix.recipient_system_fx.host.clone(),
                })
            } else {
                Err(unsupported("locked", ix, me))
            }
        }
        Route::Direct => {
            if ix.sender_system_fx.wallet == *me {
                Ok(InboundPlan {
                    role: HopRole::SenderSide,
                    lock_sender: ix.sender.wallet.clone(),
                    lock_receiver: ix.sender_system_fx.wallet.clone(),
                    amount: ix.source_amount,
                    forward_host: ix.recipient_system_fx.host.clone(),
                })
            } else {
                Err(unsupported("locked", ix, me))
            }
        }
    }
}

/// Where to deliver the Completion message after this party observed a
/// withdrawal of a lock it created.
pub fn completion_forward(
    ix: &PaymentInstruction,
    me: &WalletAddress,
) -> Result<HostName, CoreError> {
    match ix.route() {
        Route::Intermediated {
            sender_fx,
            recipient_fx,
            ..
        } => {
            if ix.recipient_system_fx.wallet == *me {
                Ok(recipient_fx.host.clone())
            } else if sender_fx.wallet == *me {
                Ok(ix.sender_system_fx.host.clone())
            } else {
                Err(unsupported("completion", ix, me))
            }
        }
        Route::Direct => {
            if ix.recipient_system_fx.wallet == *me {
                Ok(ix.sender_system_fx.host.clone())
            } else {
                Err(unsupported("completion", ix, me))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::test_support::{
        direct_instruction, intermediated_instruction, wallet,
    };
    use crate::types::Amount;

    #[test]
    fn test_direct_setup_classifies_recipient_side() {
        let ix = direct_instruction();
        let plan = outbound_plan(&ix, &wallet("0xFXP1")).unwrap();
        assert_eq!(plan.role, HopRole::RecipientSide);
        assert_eq!(plan.receiver, wallet("0xrecipient"));
        assert_eq!(plan.amount, Amount(104.48));
        assert_eq!(plan.hops_upstream, 0);
        assert!(plan.notify.is_none());
    }

    #[test]
    fn test_direct_setup_unknown_wallet_is_unsupported() {
        let ix = direct_instruction();
        let err = outbound_plan(&ix, &wallet("0xstranger")).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedRoute(_)));
    }

    #[test]
    fn test_intermediated_setup_intermediate_hop() {
        let ix = intermediated_instruction();
        let plan = outbound_plan(&ix, &wallet("0xfxp1")).unwrap();
        assert_eq!(plan.role, HopRole::Intermediate);
        assert_eq!(plan.receiver, wallet("0xfxp2"));
        assert_eq!(plan.hops_upstream, 1);
        assert_eq!(
            plan.notify.unwrap().host,
            ix.intermediate_recipient_fx.unwrap().host
        );
    }

    #[test]
    fn test_intermediated_setup_recipient_hop() {
        let ix = intermediated_instruction();
        let plan = outbound_plan(&ix, &wallet("0xfxp2")).unwrap();
        assert_eq!(plan.role, HopRole::RecipientSide);
        assert_eq!(plan.receiver, wallet("0xrecipient"));
        assert_eq!(plan.hops_upstream, 0);
        assert!(plan.notify.is_none());
    }

    #[test]
    fn test_direct_locked_classifies_sender_side() {
        let ix = direct_instruction();
        let plan = inbound_plan(&ix, &wallet("0xfxp1")).unwrap();
        assert_eq!(plan.role, HopRole::SenderSide);
        assert_eq!(plan.lock_sender, wallet("0xsender"));
        assert_eq!(plan.lock_receiver, wallet("0xfxp1"));
        assert_eq!(plan.amount, Amount(100.0));
        assert_eq!(plan.forward_host.as_str(), "se:fxp1");
    }

    #[test]
    fn test_intermediated_locked_roles() {
        let ix = intermediated_instruction();

        let sender_side = inbound_plan(&ix, &wallet("0xfxp1")).unwrap();
        assert_eq!(sender_side.role, HopRole::SenderSide);
        assert_eq!(sender_side.forward_host.as_str(), "no:fxp1");

        let intermediate = inbound_plan(&ix, &wallet("0xfxp2")).unwrap();
        assert_eq!(intermediate.role, HopRole::Intermediate);
        assert_eq!(intermediate.lock_sender, wallet("0xfxp1"));
        assert_eq!(intermediate.lock_receiver, wallet("0xfxp2"));
        assert_eq!(intermediate.forward_host.as_str(), "no:fxp2");
    }

    #[test]
    fn test_locked_unknown_wallet_is_unsupported() {
        let err = inbound_plan(&intermediated_instruction(), &wallet("0xstranger")).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedRoute(_)));
    }

    #[test]
    fn test_completion_forward_direct() {
        let ix = direct_instruction();
        let host = completion_forward(&ix, &wallet("0xfxp1")).unwrap();
        assert_eq!(host.as_str(), "no:fxp1");
    }

    #[test]
    fn test_completion_forward_intermediated() {
        let ix = intermediated_instruction();

        // Recipient-side provider forwards backward to the intermediate leg.
        let host = completion_forward(&ix, &wallet("0xfxp2")).unwrap();
        assert_eq!(host.as_str(), "no:fxp2");

        // Intermediate provider forwards backward to the sender system.
        let host = completion_forward(&ix, &wallet("0xfxp1")).unwrap();
        assert_eq!(host.as_str(), "no:fxp1");
    }

    #[test]
    fn test_completion_forward_unknown_wallet() {
        let err =
            completion_forward(&intermediated_instruction(), &wallet("0xstranger")).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedRoute(_)));
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        let ix = direct_instruction();
        assert!(outbound_plan(&ix, &wallet("0XFXP1")).is_ok());
        assert!(inbound_plan(&ix, &wallet("0xFxP1")).is_ok());
    }
}

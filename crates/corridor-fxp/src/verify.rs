//! The lock verification gate.
//!
//! Before persisting an inbound record or relaying a message forward, the
//! provider re-derives trust from the ledger: the referenced lock is
//! fetched and every field checked against what the instruction implies.
//! No partial trust is extended: a single mismatch rejects the message.

use corridor_core::{HashLock, LockId, WalletAddress};
use corridor_ledger::Lock;

use crate::error::FxpError;

/// What the on-chain lock must look like for the announcing message to be
/// trusted.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedLock {
    pub sender: WalletAddress,
    pub receiver: WalletAddress,
    /// Integer token units.
    pub amount: u128,
    pub hashlock: HashLock,
    /// Previously agreed absolute expiry, epoch seconds. Checked for
    /// exact equality: the on-chain timelock is immutable ground truth.
    pub timelock: i64,
}

fn mismatch(field: &'static str, expected: String, actual: String) -> FxpError {
    FxpError::LockMismatch {
        field,
        expected,
        actual,
    }
}

/// Check a fetched lock against expectations, in gate order: existence,
/// sender, receiver, amount, hashlock, timelock.
pub fn verify_lock(
    lock_id: LockId,
    fetched: Option<Lock>,
    expected: &ExpectedLock,
) -> Result<Lock, FxpError> {
    let lock = fetched.ok_or_else(|| {
        mismatch("existence", lock_id.to_string(), "no such lock".to_string())
    })?;

    if lock.sender != expected.sender {
        return Err(mismatch(
            "sender",
            expected.sender.to_string(),
            lock.sender.to_string(),
        ));
    }
    if lock.receiver != expected.receiver {
        return Err(mismatch(
            "receiver",
            expected.receiver.to_string(),
            lock.receiver.to_string(),
        ));
    }
    if lock.amount != expected.amount {
        return Err(mismatch(
            "amount",
            expected.amount.to_string(),
            lock.amount.to_string(),
        ));
    }
    if lock.hashlock != expected.hashlock {
        return Err(mismatch(
            "hashlock",
            expected.hashlock.to_string(),
            lock.hashlock.to_string(),
        ));
    }
    if lock.timelock != expected.timelock {
        return Err(mismatch(
            "timelock",
            expected.timelock.to_string(),
            lock.timelock.to_string(),
        ));
    }
    Ok(lock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use corridor_core::SecretHashPair;

    fn expected() -> ExpectedLock {
        ExpectedLock {
            sender: "0xsender".into(),
            receiver: "0xfxp".into(),
            amount: 1_000_000,
            hashlock: SecretHashPair::generate().hash,
            timelock: 1_700_003_900,
        }
    }

    fn matching_lock(expected: &ExpectedLock) -> Lock {
        Lock {
            sender: expected.sender.clone(),
            receiver: expected.receiver.clone(),
            token: "0xtoken".into(),
            amount: expected.amount,
            hashlock: expected.hashlock,
            timelock: expected.timelock,
            withdrawn: false,
            refunded: false,
            preimage: None,
        }
    }

    fn field_of(err: FxpError) -> &'static str {
        match err {
            FxpError::LockMismatch { field, .. } => field,
            other => panic!("expected LockMismatch, got {other}"),
        }
    }

    #[test]
    fn test_exact_match_is_accepted() {
        let expected = expected();
        let lock = matching_lock(&expected);
        let verified = verify_lock(LockId([1u8; 32]), Some(lock.clone()), &expected).unwrap();
        assert_eq!(verified, lock);
    }

    #[test]
    fn test_missing_lock_is_rejected() {
        let err = verify_lock(LockId([1u8; 32]), None, &expected()).unwrap_err();
        assert_eq!(field_of(err), "existence");
    }

    // Any single-field mutation must flip acceptance to rejection.

    #[test]
    fn test_sender_mutation_rejected() {
        let expected = expected();
        let mut lock = matching_lock(&expected);
        lock.sender = "0xintruder".into();
        let err = verify_lock(LockId([1u8; 32]), Some(lock), &expected).unwrap_err();
        assert_eq!(field_of(err), "sender");
    }

    #[test]
    fn test_receiver_mutation_rejected() {
        let expected = expected();
        let mut lock = matching_lock(&expected);
        lock.receiver = "0xintruder".into();
        let err = verify_lock(LockId([1u8; 32]), Some(lock), &expected).unwrap_err();
        assert_eq!(field_of(err), "receiver");
    }

    #[test]
    fn test_amount_mutation_rejected() {
        let expected = expected();
        let mut lock = matching_lock(&expected);
        lock.amount += 1;
        let err = verify_lock(LockId([1u8; 32]), Some(lock), &expected).unwrap_err();
        assert_eq!(field_of(err), "amount");
    }

    #[test]
    fn test_hashlock_mutation_rejected() {
        let expected = expected();
        let mut lock = matching_lock(&expected);
        lock.hashlock = SecretHashPair::generate().hash;
        let err = verify_lock(LockId([1u8; 32]), Some(lock), &expected).unwrap_err();
        assert_eq!(field_of(err), "hashlock");
    }

    #[test]
    fn test_timelock_mutation_rejected() {
        let expected = expected();
        let mut lock = matching_lock(&expected);
        lock.timelock += 1;
        let err = verify_lock(LockId([1u8; 32]), Some(lock), &expected).unwrap_err();
        assert_eq!(field_of(err), "timelock");
    }

    #[test]
    fn test_sender_comparison_is_case_insensitive() {
        let expected = expected();
        let mut lock = matching_lock(&expected);
        lock.sender = "0xSENDER".into();
        assert!(verify_lock(LockId([1u8; 32]), Some(lock), &expected).is_ok());
    }
}

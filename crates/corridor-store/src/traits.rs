use corridor_core::{HashLock, LockId, PaymentId, Secret, WalletAddress};

use crate::error::StoreError;
use crate::records::{PaymentRecord, SecretRecord};

/// One role's record set at a liquidity provider.
///
/// Inserts enforce both unique keys: the lock id (primary) and the
/// payment id (a given payment is processed at most once per role).
/// Records are mutated only toward terminal states and never deleted.
pub trait PaymentStore: Send + Sync {
    fn insert(&self, record: PaymentRecord) -> Result<(), StoreError>;

    fn get(&self, lock_id: &LockId) -> Result<Option<PaymentRecord>, StoreError>;

    fn get_by_payment(&self, payment_id: &PaymentId) -> Result<Option<PaymentRecord>, StoreError>;

    /// Mark the record withdrawn and store the (already verified) secret.
    fn mark_withdrawn(&self, lock_id: &LockId, secret: &Secret)
        -> Result<PaymentRecord, StoreError>;

    /// Mark the record refunded.
    fn mark_refunded(&self, lock_id: &LockId) -> Result<PaymentRecord, StoreError>;
}

/// The originating service's issued-secret records.
pub trait SecretStore: Send + Sync {
    fn insert(&self, record: SecretRecord) -> Result<(), StoreError>;

    fn get_by_payment(&self, payment_id: &PaymentId) -> Result<Option<SecretRecord>, StoreError>;

    /// Attach an observed lock id to the records matching hash and
    /// recipient. Returns how many records were updated.
    fn attach_lock(
        &self,
        hash: &HashLock,
        recipient: &WalletAddress,
        lock_id: &LockId,
    ) -> Result<usize, StoreError>;

    /// All records addressed to the given recipient, most recent first.
    fn list_by_recipient(&self, recipient: &WalletAddress)
        -> Result<Vec<SecretRecord>, StoreError>;
}

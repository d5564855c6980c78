//! In-memory store backends (dashmap), used by tests and local wiring.

use dashmap::DashMap;

use corridor_core::{HashLock, LockId, PaymentId, Secret, WalletAddress};

use crate::error::StoreError;
use crate::records::{PaymentRecord, RecordStatus, SecretRecord};
use crate::traits::{PaymentStore, SecretStore};

/// Thread-safe in-memory payment record set.
pub struct MemoryPaymentStore {
    records: DashMap<LockId, PaymentRecord>,
    by_payment: DashMap<PaymentId, LockId>,
}

impl MemoryPaymentStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            by_payment: DashMap::new(),
        }
    }
}

impl Default for MemoryPaymentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentStore for MemoryPaymentStore {
    fn insert(&self, record: PaymentRecord) -> Result<(), StoreError> {
        if self.records.contains_key(&record.lock_id) {
            return Err(StoreError::DuplicateLock(record.lock_id));
        }
        if self.by_payment.contains_key(&record.payment_id) {
            return Err(StoreError::DuplicatePayment(record.payment_id));
        }
        self.by_payment.insert(record.payment_id, record.lock_id);
        self.records.insert(record.lock_id, record);
        Ok(())
    }

    fn get(&self, lock_id: &LockId) -> Result<Option<PaymentRecord>, StoreError> {
        Ok(self.records.get(lock_id).map(|entry| entry.clone()))
    }

    fn get_by_payment(&self, payment_id: &PaymentId) -> Result<Option<PaymentRecord>, StoreError> {
        match self.by_payment.get(payment_id) {
            Some(lock_id) => self.get(&lock_id),
            None => Ok(None),
        }
    }

    fn mark_withdrawn(
        &self,
        lock_id: &LockId,
        secret: &Secret,
    ) -> Result<PaymentRecord, StoreError> {
        let mut entry = self
            .records
            .get_mut(lock_id)
            .ok_or(StoreError::LockNotFound(*lock_id))?;
        let record = entry.value_mut();
        record.status = RecordStatus::Withdrawn;
        record.secret = Some(secret.clone());
        Ok(record.clone())
    }

    fn mark_refunded(&self, lock_id: &LockId) -> Result<PaymentRecord, StoreError> {
        let mut entry = self
            .records
            .get_mut(lock_id)
            .ok_or(StoreError::LockNotFound(*lock_id))?;
        let record = entry.value_mut();
        record.status = RecordStatus::Refunded;
        Ok(record.clone())
    }
}

/// Thread-safe in-memory secret record set.
pub struct MemorySecretStore {
    records: DashMap<PaymentId, SecretRecord>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }
}

impl Default for MemorySecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore for MemorySecretStore {
    fn insert(&self, record: SecretRecord) -> Result<(), StoreError> {
        if self.records.contains_key(&record.payment_id) {
            return Err(StoreError::DuplicatePayment(record.payment_id));
        }
        self.records.insert(record.payment_id, record);
        Ok(())
    }

    fn get_by_payment(&self, payment_id: &PaymentId) -> Result<Option<SecretRecord>, StoreError> {
        Ok(self.records.get(payment_id).map(|entry| entry.clone()))
    }

    fn attach_lock(
        &self,
        hash: &HashLock,
        recipient: &WalletAddress,
        lock_id: &LockId,
    ) -> Result<usize, StoreError> {
        let mut updated = 0;
        for mut entry in self.records.iter_mut() {
            let record = entry.value_mut();
            if record.hash == *hash && record.recipient == *recipient {
                record.lock_id = Some(*lock_id);
                updated += 1;
            }
        }
        Ok(updated)
    }

    fn list_by_recipient(
        &self,
        recipient: &WalletAddress,
    ) -> Result<Vec<SecretRecord>, StoreError> {
        let mut records: Vec<SecretRecord> = self
            .records
            .iter()
            .filter(|entry| entry.recipient == *recipient)
            .map(|entry| entry.clone())
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

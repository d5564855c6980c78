//! RocksDB storage backend.
//!
//! One database per service instance, with a column family per record set
//! plus a paymentId index per role to enforce the secondary uniqueness
//! constraint.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};

use corridor_core::{HashLock, LockId, PaymentId, Secret, WalletAddress};

use crate::error::StoreError;
use crate::records::{PaymentRecord, RecordStatus, SecretRecord};
use crate::traits::{PaymentStore, SecretStore};

const CF_OUTBOUND: &str = "outbound";
const CF_INBOUND: &str = "inbound";
const CF_OUTBOUND_PAYMENT_IDX: &str = "outbound_payment_idx";
const CF_INBOUND_PAYMENT_IDX: &str = "inbound_payment_idx";
const CF_SECRETS: &str = "secrets";

impl From<rocksdb::Error> for StoreError {
    fn from(e: rocksdb::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// Which record set a payment store handle operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreRole {
    /// Locks this provider created.
    Outbound,
    /// Locks this provider received and verified.
    Inbound,
}

impl StoreRole {
    fn records_cf(&self) -> &'static str {
        match self {
            Self::Outbound => CF_OUTBOUND,
            Self::Inbound => CF_INBOUND,
        }
    }

    fn index_cf(&self) -> &'static str {
        match self {
            Self::Outbound => CF_OUTBOUND_PAYMENT_IDX,
            Self::Inbound => CF_INBOUND_PAYMENT_IDX,
        }
    }
}

/// RocksDB database shared by the stores of one service instance.
pub struct RocksStore {
    db: Arc<DB>,
}

impl RocksStore {
    /// Open or create the database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path).map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_OUTBOUND, Options::default()),
            ColumnFamilyDescriptor::new(CF_INBOUND, Options::default()),
            ColumnFamilyDescriptor::new(CF_OUTBOUND_PAYMENT_IDX, Options::default()),
            ColumnFamilyDescriptor::new(CF_INBOUND_PAYMENT_IDX, Options::default()),
            ColumnFamilyDescriptor::new(CF_SECRETS, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// A payment store handle over one role's record set.
    pub fn payment_store(&self, role: StoreRole) -> RocksPaymentStore {
        RocksPaymentStore {
            db: Arc::clone(&self.db),
            role,
        }
    }

    /// The secret store handle.
    pub fn secret_store(&self) -> RocksSecretStore {
        RocksSecretStore {
            db: Arc::clone(&self.db),
        }
    }
}

fn cf_handle<'a>(db: &'a DB, name: &str) -> Result<&'a rocksdb::ColumnFamily, StoreError> {
    db.cf_handle(name)
        .ok_or_else(|| StoreError::Backend(format!("column family '{name}' not found")))
}

/// RocksDB-backed payment record set for one role.
pub struct RocksPaymentStore {
    db: Arc<DB>,
    role: StoreRole,
}

impl PaymentStore for RocksPaymentStore {
    fn insert(&self, record: PaymentRecord) -> Result<(), StoreError> {
        let records = cf_handle(&self.db, self.role.records_cf())?;
        let index = cf_handle(&self.db, self.role.index_cf())?;

        if self.db.get_cf(records, record.lock_id.as_bytes())?.is_some() {
            return Err(StoreError::DuplicateLock(record.lock_id));
        }
        if self
            .db
            .get_cf(index, record.payment_id.0.as_bytes())?
            .is_some()
        {
            return Err(StoreError::DuplicatePayment(record.payment_id));
        }

        let encoded = serde_json::to_vec(&record)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(records, record.lock_id.as_bytes(), &encoded);
        batch.put_cf(
            index,
            record.payment_id.0.as_bytes(),
            record.lock_id.as_bytes(),
        );
        self.db.write(batch)?;
        Ok(())
    }

    fn get(&self, lock_id: &LockId) -> Result<Option<PaymentRecord>, StoreError> {
        let records = cf_handle(&self.db, self.role.records_cf())?;
        match self.db.get_cf(records, lock_id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn get_by_payment(&self, payment_id: &PaymentId) -> Result<Option<PaymentRecord>, StoreError> {
        let index = cf_handle(&self.db, self.role.index_cf())?;
        let Some(key) = self.db.get_cf(index, payment_id.0.as_bytes())? else {
            return Ok(None);
        };
        let array: [u8; 32] = key
            .try_into()
            .map_err(|_| StoreError::Backend("malformed payment index entry".into()))?;
        self.get(&LockId(array))
    }

    fn mark_withdrawn(
        &self,
        lock_id: &LockId,
        secret: &Secret,
    ) -> Result<PaymentRecord, StoreError> {
        let records = cf_handle(&self.db, self.role.records_cf())?;
        let mut record = self.get(lock_id)?.ok_or(StoreError::LockNotFound(*lock_id))?;
        record.status = RecordStatus::Withdrawn;
        record.secret = Some(secret.clone());
        self.db
            .put_cf(records, lock_id.as_bytes(), serde_json::to_vec(&record)?)?;
        Ok(record)
    }

    fn mark_refunded(&self, lock_id: &LockId) -> Result<PaymentRecord, StoreError> {
        let records = cf_handle(&self.db, self.role.records_cf())?;
        let mut record = self.get(lock_id)?.ok_or(StoreError::LockNotFound(*lock_id))?;
        record.status = RecordStatus::Refunded;
        self.db
            .put_cf(records, lock_id.as_bytes(), serde_json::to_vec(&record)?)?;
        Ok(record)
    }
}

/// RocksDB-backed secret record set.
pub struct RocksSecretStore {
    db: Arc<DB>,
}

impl SecretStore for RocksSecretStore {
    fn insert(&self, record: SecretRecord) -> Result<(), StoreError> {
        let secrets = cf_handle(&self.db, CF_SECRETS)?;
        if self
            .db
            .get_cf(secrets, record.payment_id.0.as_bytes())?
            .is_some()
        {
            return Err(StoreError::DuplicatePayment(record.payment_id));
        }
        self.db.put_cf(
            secrets,
            record.payment_id.0.as_bytes(),
            serde_json::to_vec(&record)?,
        )?;
        Ok(())
    }

    fn get_by_payment(&self, payment_id: &PaymentId) -> Result<Option<SecretRecord>, StoreError> {
        let secrets = cf_handle(&self.db, CF_SECRETS)?;
        match self.db.get_cf(secrets, payment_id.0.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn attach_lock(
        &self,
        hash: &HashLock,
        recipient: &WalletAddress,
        lock_id: &LockId,
    ) -> Result<usize, StoreError> {
        let secrets = cf_handle(&self.db, CF_SECRETS)?;
        let mut updated = 0;
        let mut batch = WriteBatch::default();
        for entry in self.db.iterator_cf(secrets, IteratorMode::Start) {
            let (key, value) = entry?;
            let mut record: SecretRecord = serde_json::from_slice(&value)?;
            if record.hash == *hash && record.recipient == *recipient {
                record.lock_id = Some(*lock_id);
                batch.put_cf(secrets, key, serde_json::to_vec(&record)?);
                updated += 1;
            }
        }
        if updated > 0 {
            self.db.write(batch)?;
        }
        Ok(updated)
    }

    fn list_by_recipient(
        &self,
        recipient: &WalletAddress,
    ) -> Result<Vec<SecretRecord>, StoreError> {
        let secrets = cf_handle(&self.db, CF_SECRETS)?;
        let mut records = Vec::new();
        for entry in self.db.iterator_cf(secrets, IteratorMode::Start) {
            let (_, value) = entry?;
            let record: SecretRecord = serde_json::from_slice(&value)?;
            if record.recipient == *recipient {
                records.push(record);
            }
        }
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

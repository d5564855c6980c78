//! Corridor settlement record stores.
//!
//! Each liquidity provider persists one append-mostly record set per role
//! (outbound = locks it created, inbound = locks it received and
//! verified), keyed by lock id with a uniqueness constraint on payment id.
//! The originating service persists issued secrets. Records are never
//! deleted; they are the settlement audit trail.

pub mod error;
pub mod memory;
pub mod records;
pub mod rocks;
pub mod traits;

pub use error::StoreError;
pub use memory::{MemoryPaymentStore, MemorySecretStore};
pub use records::{PaymentRecord, RecordStatus, SecretRecord};
pub use rocks::{RocksPaymentStore, RocksSecretStore, RocksStore, StoreRole};
pub use traits::{PaymentStore, SecretStore};

//! Corridor ledger layer.
//!
//! The distributed ledger and its lock contract are external to the
//! protocol; this crate models their interface as an async trait plus two
//! implementations: a full in-memory ledger with HTLC semantics (tests and
//! local wiring) and an HTTP client for a ledger gateway.

pub mod error;
pub mod http;
pub mod lock;
pub mod memory;
pub mod traits;

pub use error::LedgerError;
pub use http::HttpLedger;
pub use lock::{LedgerEvent, Lock, NewLock};
pub use memory::{InMemoryLedger, MemoryLedgerHandle};
pub use traits::LockLedger;

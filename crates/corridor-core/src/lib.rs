//! Corridor core protocol library.
//!
//! Shared types and pure protocol logic used by every Corridor role:
//! payment instructions with structural route inference, the role
//! classifier, the timelock cascade, secret/hash primitives, and the
//! wire messages exchanged between services.

pub mod config;
pub mod error;
pub mod instruction;
pub mod messages;
pub mod routing;
pub mod secret;
pub mod timelock;
pub mod types;

pub use config::LockDurationConfig;
pub use error::CoreError;
pub use instruction::{PaymentId, PaymentInstruction, Route};
pub use routing::{completion_forward, inbound_plan, outbound_plan, HopRole};
pub use secret::{HashLock, Secret, SecretHashPair};
pub use timelock::TimelockPolicy;
pub use types::{Amount, Currency, Endpoint, HostName, LockId, Party, TokenId, WalletAddress};

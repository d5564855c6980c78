//! Corridor originating service (PSP).
//!
//! The sender-side custodian: generates the secret/hash pair for each
//! payment at discovery time, keeps sender-visible settlement records,
//! and attaches observed lock ids to them as the ledger reports new
//! locks. It never touches funds.

pub mod api;
pub mod error;
pub mod listener;
pub mod service;

pub use api::PspState;
pub use error::PspError;
pub use listener::spawn_lock_created_listener;
pub use service::{Psp, PspSettings};

//! Corridor hub (router).
//!
//! Classifies currency pairs into routes, issues rate quotes, and relays
//! protocol messages between the originating service and each hop's
//! liquidity provider, enforcing the shared-secret transport header and
//! host-directory lookups. Holds no funds and no payment state.

pub mod api;
pub mod config;
pub mod directory;
pub mod error;
pub mod quote;

pub use api::HubState;
pub use config::HubConfig;
pub use directory::HostDirectory;
pub use error::HubError;
pub use quote::QuoteEngine;

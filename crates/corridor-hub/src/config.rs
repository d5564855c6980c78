use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use corridor_core::Currency;

/// Hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Value every inbound request must carry in the corridor header.
    pub request_token: String,
    /// Value stamped onto every hub response.
    pub response_token: String,
    /// Whether same-currency pairs may be quoted as two-hop routes.
    #[serde(default)]
    pub pvpvp_enabled: bool,
    /// Quote validity window in seconds.
    #[serde(default = "default_quote_expiry_secs")]
    pub quote_expiry_secs: u64,
    /// Configured FX rates per currency pair.
    #[serde(default = "default_rates")]
    pub rates: Vec<RateEntry>,
    /// Liquidity providers and their per-currency instances.
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,
    /// Host directory: logical host name to base URL.
    #[serde(default)]
    pub hosts: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateEntry {
    pub source: Currency,
    pub target: Currency,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub name: String,
    pub instances: Vec<InstanceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceEntry {
    pub currency: Currency,
    pub wallet: String,
    pub host: String,
}

fn default_quote_expiry_secs() -> u64 {
    300
}

fn default_rates() -> Vec<RateEntry> {
    vec![
        RateEntry {
            source: Currency::NOK,
            target: Currency::SEK,
            rate: 1.0448,
        },
        RateEntry {
            source: Currency::NOK,
            target: Currency::ILS,
            rate: 0.3383,
        },
        RateEntry {
            source: Currency::NOK,
            target: Currency::NOK,
            rate: 1.0,
        },
    ]
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            request_token: String::new(),
            response_token: String::new(),
            pvpvp_enabled: false,
            quote_expiry_secs: default_quote_expiry_secs(),
            rates: default_rates(),
            providers: Vec::new(),
            hosts: HashMap::new(),
        }
    }
}

//! Node configuration loading and management.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Which corridor role this node runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Liquidity provider.
    #[default]
    Fxp,
    /// Router / relay.
    Hub,
    /// Originating service.
    Psp,
}

/// Full configuration for a corridor node.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeConfig {
    #[serde(default)]
    pub role: Role,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Liquidity-provider settings (role = "fxp").
    #[serde(default)]
    pub fxp: FxpConfig,

    /// Hub settings (role = "hub").
    #[serde(default)]
    pub hub: corridor_hub::HubConfig,

    /// Originating-service settings (role = "psp").
    #[serde(default)]
    pub psp: PspConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_addr")]
    pub listen_addr: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the data directory.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Base URL of the ledger gateway.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    /// Wallet this node signs ledger transactions with.
    #[serde(default)]
    pub wallet: String,
    /// Settlement token contract.
    #[serde(default = "default_token")]
    pub token: String,
    /// Decimal places of the token's integer unit.
    #[serde(default = "default_token_decimals")]
    pub token_decimals: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FxpConfig {
    /// Base URL of the hub.
    #[serde(default = "default_hub_url")]
    pub hub_url: String,
    /// Base URL under which peer providers are reachable directly.
    #[serde(default = "default_peer_base_url")]
    pub peer_base_url: String,
    /// Shared-secret value sent in the corridor header toward the hub.
    #[serde(default)]
    pub request_token: String,
    /// Allowance level restored by the top-up task, in token units.
    #[serde(default = "default_target_allowance")]
    pub target_allowance: u64,
    /// Seconds past expiry before the refund fail-safe fires.
    #[serde(default = "default_refund_grace_secs")]
    pub refund_grace_secs: u64,
    /// Per-hop timelock safety margin in seconds.
    #[serde(default = "default_hop_margin_secs")]
    pub hop_margin_secs: u64,
    /// Seconds between allowance top-up checks.
    #[serde(default = "default_allowance_check_secs")]
    pub allowance_check_secs: u64,
    /// Optional hot-reloadable lock duration file (minutes).
    #[serde(default)]
    pub lock_duration_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PspConfig {
    /// Shared token guarding the secrets-by-address endpoint.
    #[serde(default)]
    pub secrets_token: String,
    /// Optional hot-reloadable lock duration file (minutes).
    #[serde(default)]
    pub lock_duration_file: Option<PathBuf>,
}

fn default_api_addr() -> String {
    "0.0.0.0".into()
}
fn default_api_port() -> u16 {
    8082
}
fn default_log_level() -> String {
    "info".into()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_gateway_url() -> String {
    "http://localhost:7545".into()
}
fn default_token() -> String {
    "0x6749374b18a571193138251eb52f7a9b4fc5524e".into()
}
fn default_token_decimals() -> u32 {
    4
}
fn default_hub_url() -> String {
    "http://localhost:8080".into()
}
fn default_peer_base_url() -> String {
    "http://localhost:8090".into()
}
fn default_target_allowance() -> u64 {
    100_000 * 10u64.pow(4)
}
fn default_refund_grace_secs() -> u64 {
    1
}
fn default_hop_margin_secs() -> u64 {
    65
}
fn default_allowance_check_secs() -> u64 {
    600
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_api_addr(),
            port: default_api_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            wallet: String::new(),
            token: default_token(),
            token_decimals: default_token_decimals(),
        }
    }
}

impl Default for FxpConfig {
    fn default() -> Self {
        Self {
            hub_url: default_hub_url(),
            peer_base_url: default_peer_base_url(),
            request_token: String::new(),
            target_allowance: default_target_allowance(),
            refund_grace_secs: default_refund_grace_secs(),
            hop_margin_secs: default_hop_margin_secs(),
            allowance_check_secs: default_allowance_check_secs(),
            lock_duration_file: None,
        }
    }
}

impl Default for PspConfig {
    fn default() -> Self {
        Self {
            secrets_token: String::new(),
            lock_duration_file: None,
        }
    }
}

impl NodeConfig {
    /// Load config from a TOML file, falling back to defaults for missing
    /// fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: NodeConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn api_socket_addr(&self) -> String {
        format!("{}:{}", self.api.listen_addr, self.api.port)
    }
}

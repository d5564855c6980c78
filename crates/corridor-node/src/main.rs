//! Corridor node — entry point.
//!
//! Runs one corridor role (liquidity provider, hub, or originating
//! service) with configuration from a TOML file or defaults.

mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use corridor_core::{LockDurationConfig, TimelockPolicy, TokenId};
use corridor_fxp::allowance::spawn_allowance_task;
use corridor_fxp::{FxProvider, FxProviderDeps, FxProviderSettings, HttpRelay};
use corridor_ledger::{HttpLedger, LockLedger};
use corridor_psp::{Psp, PspSettings, PspState};
use corridor_store::{RocksStore, StoreRole};

use config::{NodeConfig, Role};

/// Corridor Node
#[derive(Parser, Debug)]
#[command(name = "corridor-node", version, about = "Corridor settlement node")]
struct Args {
    /// Path to the configuration file (TOML).
    #[arg(short, long, default_value = "corridor.toml")]
    config: PathBuf,

    /// Override the configured role.
    #[arg(long, value_enum)]
    role: Option<Role>,

    /// Override the API port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the data directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Generate a default config file and exit.
    #[arg(long)]
    init: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Handle --init before logging so the file is the only output.
    if args.init {
        let config = NodeConfig::default();
        config.save(&args.config)?;
        println!("wrote default config to {}", args.config.display());
        return Ok(());
    }

    let mut config = NodeConfig::load(&args.config)?;
    if let Some(role) = args.role {
        config.role = role;
    }
    if let Some(port) = args.api_port {
        config.api.port = port;
    }
    if let Some(ref data_dir) = args.data_dir {
        config.storage.data_dir = data_dir.clone();
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        role = ?config.role,
        "corridor node starting"
    );

    let listen_addr: SocketAddr = config.api_socket_addr().parse()?;
    let serve = async {
        match config.role {
            Role::Fxp => run_fxp(listen_addr, &config).await,
            Role::Hub => run_hub(listen_addr, &config).await,
            Role::Psp => run_psp(listen_addr, &config).await,
        }
    };

    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
        tracing::info!("received shutdown signal");
    };

    tokio::select! {
        result = serve => {
            if let Err(e) = result {
                tracing::error!(error = %e, "node exited with error");
                return Err(e);
            }
        }
        _ = shutdown => {}
    }

    tracing::info!("corridor node exited cleanly");
    Ok(())
}

async fn run_fxp(listen_addr: SocketAddr, config: &NodeConfig) -> anyhow::Result<()> {
    let store = RocksStore::open(&config.storage.data_dir.join("fxp"))
        .map_err(|e| anyhow::anyhow!("failed to open record store: {e}"))?;

    let ledger = Arc::new(HttpLedger::new(
        &config.ledger.gateway_url,
        config.ledger.wallet.as_str(),
    ));
    let _event_pump = ledger.spawn_event_pump();

    let relay = Arc::new(HttpRelay::new(
        &config.fxp.hub_url,
        &config.fxp.peer_base_url,
        &config.fxp.request_token,
    ));

    let lock_duration = match &config.fxp.lock_duration_file {
        Some(path) => LockDurationConfig::from_file(path),
        None => LockDurationConfig::default(),
    };
    let settings = FxProviderSettings {
        token: TokenId::new(config.ledger.token.as_str()),
        token_decimals: config.ledger.token_decimals,
        target_allowance: config.fxp.target_allowance as u128,
        refund_grace: Duration::from_secs(config.fxp.refund_grace_secs),
        lock_duration,
        timelocks: TimelockPolicy::new(Duration::from_secs(config.fxp.hop_margin_secs)),
    };

    let provider = Arc::new(FxProvider::new(
        FxProviderDeps {
            ledger: ledger.clone() as Arc<dyn LockLedger>,
            outbound: Arc::new(store.payment_store(StoreRole::Outbound)),
            inbound: Arc::new(store.payment_store(StoreRole::Inbound)),
            relay,
        },
        settings,
    ));

    let _listener = corridor_fxp::spawn_withdrawal_listener(provider.clone());
    let _allowance = spawn_allowance_task(
        provider.clone(),
        Duration::from_secs(config.fxp.allowance_check_secs),
    );

    corridor_fxp::api::start_api_server(listen_addr, provider).await?;
    Ok(())
}

async fn run_hub(listen_addr: SocketAddr, config: &NodeConfig) -> anyhow::Result<()> {
    let state = Arc::new(corridor_hub::HubState::new(config.hub.clone()));
    corridor_hub::api::start_api_server(listen_addr, state).await?;
    Ok(())
}

async fn run_psp(listen_addr: SocketAddr, config: &NodeConfig) -> anyhow::Result<()> {
    let store = RocksStore::open(&config.storage.data_dir.join("psp"))
        .map_err(|e| anyhow::anyhow!("failed to open record store: {e}"))?;

    let ledger = Arc::new(HttpLedger::new(
        &config.ledger.gateway_url,
        config.ledger.wallet.as_str(),
    ));
    let _event_pump = ledger.spawn_event_pump();

    let lock_duration = match &config.psp.lock_duration_file {
        Some(path) => LockDurationConfig::from_file(path),
        None => LockDurationConfig::default(),
    };
    let psp = Arc::new(Psp::new(
        Arc::new(store.secret_store()),
        PspSettings {
            token_decimals: config.ledger.token_decimals,
            lock_duration,
        },
    ));

    let _listener = corridor_psp::spawn_lock_created_listener(psp.clone(), ledger.subscribe());

    let state = Arc::new(PspState {
        psp,
        secrets_token: config.psp.secrets_token.clone(),
    });
    corridor_psp::api::start_api_server(listen_addr, state).await?;
    Ok(())
}

mod api;
mod constants;
mod peers;

use anyhow::Context;
use api::AppState;
use clap::Parser;
use constants::{DEFAULT_DATA_DIR, DEFAULT_LISTEN, DEFAULT_MINE_TIMEOUT_MS};
use ledger_core::{Chain, ChainStore, TracingReporter};
use ledger_storage::SledStore;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tracing::{info, Level};

#[derive(Parser, Debug)]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, default_value = DEFAULT_LISTEN)]
    listen: String,

    /// Data directory for sled
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    data_dir: String,

    /// Base URL of a peer node to sync from and broadcast to (repeatable)
    #[arg(long = "peer")]
    peers: Vec<String>,

    /// Give up on a mining request after this many milliseconds
    #[arg(long, default_value_t = DEFAULT_MINE_TIMEOUT_MS)]
    mine_timeout_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let store = Arc::new(SledStore::open(&args.data_dir)?);
    let chain = Chain::load_or_init(store.as_ref(), Arc::new(TracingReporter))
        .with_context(|| format!("restoring chain from {}", args.data_dir))?;
    info!("chain restored with {} blocks", chain.len());

    let state = AppState {
        chain: Arc::new(RwLock::new(chain)),
        store: store.clone(),
        peers: Arc::new(args.peers),
        http: reqwest::Client::new(),
        mine_timeout: Duration::from_millis(args.mine_timeout_ms),
    };
    peers::sync_from_peers(&state).await;

    let app = api::router(state);
    let addr: SocketAddr = args.listen.parse()?;
    info!("ledger-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.flush()?;
    info!("ledger-node stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
    }
}

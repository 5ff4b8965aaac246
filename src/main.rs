use anyhow::{Context, Result};
use clap::Parser;
use signal_desk::{server, spawn_price_updater, AppState, DeskConfig};
use std::{net::IpAddr, path::PathBuf, sync::Arc, time::Duration};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Interface to bind
    #[arg(long, env = "SIGNAL_DESK_HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to run the web server on
    #[arg(short, long, env = "SIGNAL_DESK_PORT", default_value = "3000")]
    port: u16,

    /// Seconds between simulated price ticks
    #[arg(short, long, env = "SIGNAL_DESK_UPDATE_INTERVAL_SECS", default_value = "5")]
    update_interval_secs: u64,

    /// Seed for the simulated data (random if omitted)
    #[arg(short, long, env = "SIGNAL_DESK_SEED")]
    seed: Option<u64>,

    /// Directory with a built front-end to serve at /
    #[arg(long, env = "SIGNAL_DESK_STATIC_DIR")]
    static_dir: Option<PathBuf>,
}

impl From<Args> for DeskConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            update_interval: Duration::from_secs(args.update_interval_secs.max(1)),
            seed: args.seed,
            static_dir: args.static_dir,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("signal_desk=info".parse().context("Bad log directive")?),
        )
        .init();

    let config = DeskConfig::from(Args::parse());

    info!("Starting signal desk");
    info!("Port: {}", config.port);
    info!("Update interval: {:?}", config.update_interval);
    match config.seed {
        Some(seed) => info!("Seed: {}", seed),
        None => info!("Seed: random"),
    }

    let addr = config.addr();
    let update_interval = config.update_interval;
    let updater_rng = config.rng("updater");
    let state = Arc::new(AppState::new(config));

    let updater = spawn_price_updater(state.clone(), update_interval, updater_rng);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Open http://localhost:{} in your browser", addr.port());

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutting down");
    };
    let result = server::serve(listener, state, shutdown).await;

    updater.cancel().await;
    result
}

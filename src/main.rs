use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tracing_subscriber::EnvFilter;

use bgp_sessiond::config::Config;
use bgp_sessiond::engine::Engine;

/// Command-line surface for the session engine process, SPEC_FULL §6:
/// it is started by the parent with a config file path and its own AS/
/// router-id, already privilege-separated — no YANG path, no daemonize,
/// that bootstrap belongs to the parent process.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Arg {
    #[arg(short, long, help = "Path to the engine's TOML configuration file")]
    config: PathBuf,

    #[arg(long, help = "Local autonomous system number")]
    local_as: u32,

    #[arg(long, help = "Local BGP identifier")]
    router_id: Ipv4Addr,
}

fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let arg = Arg::parse();
    setup_tracing();

    let raw = std::fs::read_to_string(&arg.config)
        .map_err(|e| anyhow::anyhow!("reading {}: {e}", arg.config.display()))?;
    let config = Config::from_toml_str(&raw)
        .map_err(|e| anyhow::anyhow!("parsing {}: {e}", arg.config.display()))?;

    let listeners: Vec<SocketAddr> = config.listeners.iter().map(|l| l.bind_addr).collect();

    let mut engine = Engine::new(arg.local_as, arg.router_id, config);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    engine.set_shutdown_signal(shutdown_rx);

    for bind_addr in listeners {
        engine.add_listener(bind_addr).await?;
    }

    engine.sync_peers_from_config();
    engine.start_peers(std::time::Instant::now());

    tokio::spawn(async move {
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("failed to install SIGINT handler: {e}");
                return;
            }
        };
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                return;
            }
        };
        tokio::select! {
            _ = sigint.recv() => tracing::info!("received SIGINT, shutting down"),
            _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
        }
        let _ = shutdown_tx.send(true);
    });

    engine.run().await;

    Ok(())
}

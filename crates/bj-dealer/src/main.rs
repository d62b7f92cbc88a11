//! Blackjack-over-LAN dealer: entry point.
//!
//! Announces itself on the LAN with UDP Offers and plays blackjack against
//! every player that connects, each in its own independent session.
//!
//! # Usage
//!
//! ```text
//! bj-dealer [OPTIONS]
//!
//! Options:
//!   --config         <PATH>  TOML config file (optional)
//!   --name           <NAME>  Server name advertised in Offers
//!   --bind           <IP>    Address for the TCP listener
//!   --port           <PORT>  TCP port (0 = OS-assigned)
//!   --discovery-port <PORT>  UDP port Offers are sent to
//!   --broadcast-addr <IP>    Destination address for Offers
//!   --seed           <U64>   Fixed shuffle seed
//! ```
//!
//! Values come from the built-in defaults, then the config file, then the
//! command line (or the matching `BJ_DEALER_*` environment variable).
//!
//! # Architecture overview
//!
//! ```text
//! bj-dealer  ← this process
//!   application/     DealerSession state machine
//!   infrastructure/
//!     network/       accept loop, offer broadcaster, PlayerStream
//!     storage/       DealerConfig (TOML)
//!       ↕  TCP (Request, Payload, Decision)     ↑ UDP Offer every 1 s
//! bj-player
//! ```

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bj_dealer::infrastructure::network::server::DealerServer;
use bj_dealer::infrastructure::storage::config::{load_config, DealerConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Blackjack-over-LAN dealer.
#[derive(Debug, Parser)]
#[command(
    name = "bj-dealer",
    about = "Blackjack dealer that advertises itself on the LAN",
    version
)]
struct Cli {
    /// TOML configuration file.  Every key is optional.
    #[arg(long, env = "BJ_DEALER_CONFIG")]
    config: Option<PathBuf>,

    /// Server name advertised in Offers (at most 32 bytes are sent).
    #[arg(long, env = "BJ_DEALER_NAME")]
    name: Option<String>,

    /// IP address to bind the TCP listener to.
    #[arg(long, env = "BJ_DEALER_BIND")]
    bind: Option<IpAddr>,

    /// TCP port to listen on; `0` lets the OS choose.
    #[arg(long, env = "BJ_DEALER_PORT")]
    port: Option<u16>,

    /// UDP port that Offers are sent to.
    #[arg(long, env = "BJ_DISCOVERY_PORT")]
    discovery_port: Option<u16>,

    /// Destination address for Offers, e.g. a subnet broadcast address.
    #[arg(long, env = "BJ_DEALER_BROADCAST_ADDR")]
    broadcast_addr: Option<IpAddr>,

    /// Fixed shuffle seed, for replaying a sequence of deals.
    #[arg(long, env = "BJ_DEALER_SEED")]
    seed: Option<u64>,
}

impl Cli {
    /// Builds the effective [`DealerConfig`]: file (or defaults) with CLI
    /// overrides applied on top.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded or the merged
    /// configuration is invalid.
    fn into_dealer_config(self) -> anyhow::Result<DealerConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => DealerConfig::default(),
        };

        if let Some(name) = self.name {
            config.dealer.server_name = name;
        }
        if let Some(bind) = self.bind {
            config.network.bind_address = bind;
        }
        if let Some(port) = self.port {
            config.network.tcp_port = port;
        }
        if let Some(port) = self.discovery_port {
            config.network.discovery_port = port;
        }
        if let Some(addr) = self.broadcast_addr {
            config.network.broadcast_address = addr;
        }
        if let Some(seed) = self.seed {
            config.dealer.shuffle_seed = Some(seed);
        }

        config.validate()?;
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_dealer_config()?;

    info!(
        "Blackjack dealer starting: name={}, discovery={}",
        config.dealer.server_name,
        config.broadcast_target()
    );

    let server = DealerServer::bind(config).await?;

    // Cleared by Ctrl+C; the accept loop and broadcaster poll it.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; no new players will be accepted");
                running_clone.store(false, Ordering::SeqCst);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    server.run(running).await?;

    info!("Blackjack dealer stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

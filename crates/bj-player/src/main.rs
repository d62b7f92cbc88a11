//! Blackjack-over-LAN player: entry point.
//!
//! Listens for a dealer's UDP Offer, connects, plays the requested number of
//! rounds, reports the win rate, then goes back to listening.
//!
//! # Usage
//!
//! ```text
//! bj-player [OPTIONS]
//!
//! Options:
//!   --rounds         <N>     Rounds per session, 1-255 (asked when absent)
//!   --team-name      <NAME>  Name sent to the dealer [default: Team Joker]
//!   --discovery-port <PORT>  UDP port to listen on [default: 13122]
//!   --auto           <T>     Play automatically: hit while total < T
//!   --once                   Exit after one session
//! ```

use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bj_player::application::{DecisionMaker, PlayerSession, ThresholdStrategy};
use bj_player::domain::config::{PlayerConfig, DEFAULT_TEAM_NAME};
use bj_player::infrastructure::console::ConsoleDecisions;
use bj_player::infrastructure::network::dealer_conn::DealerConnection;
use bj_player::infrastructure::network::discovery::{DiscoveredDealer, OfferListener};
use bj_core::protocol::messages::DISCOVERY_PORT;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Blackjack-over-LAN player.
#[derive(Debug, Parser)]
#[command(
    name = "bj-player",
    about = "Finds a blackjack dealer on the LAN and plays against it",
    version
)]
struct Cli {
    /// Rounds to play per session.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..), env = "BJ_PLAYER_ROUNDS")]
    rounds: Option<u8>,

    /// Team name sent to the dealer.
    #[arg(long, default_value = DEFAULT_TEAM_NAME, env = "BJ_PLAYER_TEAM")]
    team_name: String,

    /// UDP port on which dealers broadcast Offers.
    #[arg(long, default_value_t = DISCOVERY_PORT, env = "BJ_DISCOVERY_PORT")]
    discovery_port: u16,

    /// Seconds to wait for each message from the dealer.
    #[arg(long, default_value_t = 60)]
    read_timeout_secs: u64,

    /// Play without prompting: hit while the hand total is below THRESHOLD.
    #[arg(long, value_name = "THRESHOLD")]
    auto: Option<u32>,

    /// Play a single session and exit.
    #[arg(long)]
    once: bool,
}

impl Cli {
    fn player_config(&self) -> PlayerConfig {
        PlayerConfig {
            discovery_port: self.discovery_port,
            team_name: self.team_name.clone(),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
        }
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

    let cli = Cli::parse();

    tokio::select! {
        result = run(cli) => result,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("received Ctrl+C, leaving the table");
            // A pending stdin read would otherwise keep the runtime alive.
            std::process::exit(0);
        }
    }
}

/// Discover → play → report, once or forever.
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.player_config();
    let listener = OfferListener::bind(config.discovery_port).await?;
    let mut console = ConsoleDecisions::stdio();

    loop {
        let rounds = match cli.rounds {
            Some(rounds) => rounds,
            None => console.ask_rounds().await?,
        };

        info!(
            "client started, listening for offer requests on UDP {}...",
            config.discovery_port
        );
        let dealer = listener.next_offer().await?;

        match cli.auto {
            Some(threshold) => {
                play_session(&config, &dealer, rounds, ThresholdStrategy::new(threshold)).await
            }
            None => play_session(&config, &dealer, rounds, &mut console).await,
        }

        if cli.once {
            return Ok(());
        }
    }
}

/// Connects to `dealer`, plays, and logs the result.  Failures are logged
/// rather than returned so the caller can go back to discovery.
async fn play_session<M: DecisionMaker>(
    config: &PlayerConfig,
    dealer: &DiscoveredDealer,
    rounds: u8,
    decisions: M,
) {
    let mut conn = match DealerConnection::connect(dealer.addr, config.read_timeout).await {
        Ok(conn) => conn,
        Err(e) => {
            warn!("could not connect to {}: {e}", dealer.addr);
            return;
        }
    };
    if let Err(e) = conn.send_request(rounds, &config.team_name).await {
        warn!("could not send request to {}: {e}", dealer.addr);
        return;
    }

    let mut session = PlayerSession::new(conn, decisions);
    let stats = match session.play(rounds).await {
        Ok(stats) => stats,
        Err(e) => {
            warn!("session with {:?} ended early: {e}", dealer.server_name);
            session.stats()
        }
    };

    info!(
        wins = stats.wins,
        losses = stats.losses,
        ties = stats.ties,
        "finished playing {} rounds, win rate: {:.2}",
        stats.rounds_played(),
        stats.win_rate()
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────

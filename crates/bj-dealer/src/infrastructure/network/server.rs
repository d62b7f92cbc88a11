//! TCP accept loop and per-player task management.
//!
//! This module is responsible for:
//!
//! 1. Binding the TCP listener (an OS-chosen port unless configured).
//! 2. Starting the UDP Offer broadcaster with that port.
//! 3. Accepting player connections and giving each one its own Tokio task
//!    running a [`DealerSession`].
//! 4. Stopping new acceptances when the `running` flag is cleared, while
//!    letting sessions already in progress finish.
//!
//! # Isolation
//!
//! A session owns its socket, deck, hands and statistics.  Nothing is
//! shared between tasks except the read-only settings, so a slow, silent, or
//! misbehaving player can only ever stall or end its own session.

use std::io;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::application::{
    DealerSession, DeckSource, SessionError, SessionReport, SessionSettings, ShuffledDecks,
};
use crate::infrastructure::network::broadcaster::OfferBroadcaster;
use crate::infrastructure::network::player_stream::PlayerStream;
use crate::infrastructure::storage::config::DealerConfig;

/// How long one `accept()` may block before the shutdown flag is rechecked.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// Pause after a failed `accept()` so a persistent error (e.g. EMFILE) does
/// not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

// ── Public API ────────────────────────────────────────────────────────────────

/// A bound, not yet running, dealer.
pub struct DealerServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: DealerConfig,
}

impl DealerServer {
    /// Binds the TCP listener described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is in use or cannot be bound.
    pub async fn bind(config: DealerConfig) -> anyhow::Result<Self> {
        let addr = config.listen_addr();
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind dealer listener on {addr}"))?;
        let local_addr = listener
            .local_addr()
            .context("failed to read the listener's bound address")?;

        Ok(Self {
            listener,
            local_addr,
            config,
        })
    }

    /// The address actually bound; the port is the one advertised in Offers.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Broadcasts Offers and serves players until `running` is cleared.
    ///
    /// Returns once the accept loop has stopped and every in-flight session
    /// has ended.
    ///
    /// # Errors
    ///
    /// Returns an error if the broadcast socket cannot be set up.
    pub async fn run(self, running: Arc<AtomicBool>) -> anyhow::Result<()> {
        let broadcaster = OfferBroadcaster::bind(
            self.config.broadcast_target(),
            self.local_addr.port(),
            &self.config.dealer.server_name,
            self.config.broadcast_interval(),
        )
        .await
        .context("failed to start offer broadcaster")?;
        let broadcast_task = broadcaster.spawn(Arc::clone(&running));

        info!(
            name = %self.config.dealer.server_name,
            "server started, listening on {}",
            self.local_addr
        );

        let settings = self.config.session_settings();
        let seed = self.config.dealer.shuffle_seed;
        let mut sessions = JoinSet::new();
        let mut accepted: u64 = 0;

        loop {
            if !running.load(Ordering::SeqCst) {
                info!("shutdown flag set; stopping accept loop");
                break;
            }

            match timeout(ACCEPT_POLL, self.listener.accept()).await {
                Ok(Ok((stream, peer))) => {
                    let decks = match seed {
                        Some(seed) => ShuffledDecks::seeded(seed.wrapping_add(accepted)),
                        None => ShuffledDecks::new(),
                    };
                    accepted += 1;
                    sessions.spawn(handle_player(stream, peer, settings, decks));
                }
                Ok(Err(e)) => back_off_after_accept_error(&e).await,
                Err(_) => {}
            }

            // Reap finished sessions so the set does not grow without bound.
            while sessions.try_join_next().is_some() {}
        }

        // Late connections are refused rather than parked in the backlog.
        drop(self.listener);

        if let Err(e) = broadcast_task.await {
            warn!("offer broadcaster task failed: {e}");
        }

        if !sessions.is_empty() {
            info!("waiting for {} session(s) to finish", sessions.len());
        }
        while sessions.join_next().await.is_some() {}

        info!(accepted, "dealer stopped");
        Ok(())
    }
}

/// Plays a full session over any byte stream.
///
/// This is the whole per-connection pipeline minus logging; the server and
/// the integration tests both call it.
///
/// # Errors
///
/// Returns the [`SessionError`] that ended the session early.
pub async fn serve_player<S, D>(
    stream: S,
    settings: SessionSettings,
    decks: D,
) -> Result<SessionReport, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    D: DeckSource,
{
    let link = PlayerStream::new(stream, settings.read_timeout);
    DealerSession::new(link, decks, settings).run().await
}

/// Logs a failed `accept()` and sleeps for [`ACCEPT_ERROR_BACKOFF`].
async fn back_off_after_accept_error(e: &io::Error) {
    error!("accept error: {e}");
    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
}

// ── Per-connection handler ────────────────────────────────────────────────────

/// Runs one player's session inside its own tracing span and logs how it
/// ended.  The socket is closed when this returns.
async fn handle_player(
    stream: TcpStream,
    peer: SocketAddr,
    settings: SessionSettings,
    decks: ShuffledDecks,
) {
    let session_id = Uuid::new_v4();
    let span = info_span!("session", %session_id, %peer);

    async move {
        info!("player connected");
        if let Err(e) = stream.set_nodelay(true) {
            warn!("could not disable Nagle's algorithm: {e}");
        }

        match serve_player(stream, settings, decks).await {
            Ok(report) => info!(team = %report.team_name, "session finished, closing connection"),
            Err(e) if e.is_protocol_violation() => {
                warn!("{e}; kicking player out")
            }
            Err(e @ SessionError::DeckExhausted) => error!("{e}; closing connection"),
            Err(e) => info!("{e}; closing connection"),
        }
    }
    .instrument(span)
    .await
}

// ── Tests ─────────────────────────────────────────────────────────────────────

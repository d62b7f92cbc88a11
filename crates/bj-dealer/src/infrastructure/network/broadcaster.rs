//! Periodic UDP Offer broadcast.
//!
//! The dealer does not know who is on the LAN, so it shouts: once per
//! interval it sends a 39-byte Offer (magic cookie, type 0x2, TCP port,
//! server name) to the broadcast address on the discovery port.  Any player
//! listening on that port learns where to connect.
//!
//! # Why keep going on errors? (for beginners)
//!
//! A broadcast can fail transiently, for example while a network interface
//! is coming up.  Players only need one Offer to get through, so a failed
//! send is logged and the next tick simply tries again.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use bj_core::protocol::encode_offer;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Error type for the broadcaster.
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// The UDP socket could not be bound or switched to broadcast mode.
    #[error("failed to prepare broadcast socket: {source}")]
    BindFailed {
        #[source]
        source: std::io::Error,
    },
}

/// Sends a fixed Offer datagram to one target at a fixed interval.
pub struct OfferBroadcaster {
    socket: UdpSocket,
    target: SocketAddr,
    packet: Vec<u8>,
    interval: Duration,
}

impl OfferBroadcaster {
    /// Binds an ephemeral UDP socket with `SO_BROADCAST` enabled and
    /// pre-encodes the Offer.
    ///
    /// # Errors
    ///
    /// Returns [`BroadcastError::BindFailed`] if the socket cannot be set up.
    pub async fn bind(
        target: SocketAddr,
        tcp_port: u16,
        server_name: &str,
        interval: Duration,
    ) -> Result<Self, BroadcastError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .await
            .map_err(|source| BroadcastError::BindFailed { source })?;
        socket
            .set_broadcast(true)
            .map_err(|source| BroadcastError::BindFailed { source })?;

        Ok(Self {
            socket,
            target,
            packet: encode_offer(tcp_port, server_name),
            interval,
        })
    }

    /// Runs the broadcast loop on its own task until `running` is cleared.
    pub fn spawn(self, running: Arc<AtomicBool>) -> JoinHandle<()> {
        tokio::spawn(self.run(running))
    }

    async fn run(self, running: Arc<AtomicBool>) {
        info!(dest = %self.target, "broadcasting offers every {:?}", self.interval);
        let mut ticker = tokio::time::interval(self.interval);

        loop {
            ticker.tick().await;
            if !running.load(Ordering::SeqCst) {
                break;
            }
            match self.socket.send_to(&self.packet, self.target).await {
                Ok(_) => debug!(dest = %self.target, "offer sent"),
                Err(e) => warn!(dest = %self.target, "offer broadcast failed: {e}"),
            }
        }

        info!("offer broadcaster stopped");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

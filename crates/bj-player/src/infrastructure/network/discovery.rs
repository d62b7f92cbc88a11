//! Listening for dealer Offers.
//!
//! Dealers broadcast a 39-byte Offer on the discovery port about once a
//! second.  The player binds that port and waits for the first datagram that
//! decodes as a valid Offer.  Everything else arriving on the port (other
//! programs, truncated packets, wrong cookies) is logged at `debug` and
//! ignored.

use std::net::{Ipv4Addr, SocketAddr};

use bj_core::protocol::{decode_offer, messages::HEADER_SIZE};
use thiserror::Error;
use tokio::net::UdpSocket;
use tracing::{debug, info};

/// Smallest datagram worth decoding: header plus the port field.
const MIN_OFFER_LEN: usize = HEADER_SIZE + 2;

/// Error type for discovery operations.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The UDP socket could not be bound.
    #[error("failed to bind discovery socket on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// An I/O error occurred while receiving a datagram.
    #[error("recv error: {0}")]
    Recv(std::io::Error),
}

/// A dealer that answered the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDealer {
    /// Sender IP with the TCP port from the Offer.
    pub addr: SocketAddr,
    pub server_name: String,
}

/// A bound UDP socket waiting for Offers.
pub struct OfferListener {
    socket: UdpSocket,
}

impl OfferListener {
    /// Binds `0.0.0.0:<port>`.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::BindFailed`] if the port is taken.
    pub async fn bind(port: u16) -> Result<Self, DiscoveryError> {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| DiscoveryError::BindFailed { addr, source })?;
        Ok(Self { socket })
    }

    /// The bound address; useful when binding port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Waits for the next valid Offer.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Recv`] if the socket itself fails.
    pub async fn next_offer(&self) -> Result<DiscoveredDealer, DiscoveryError> {
        let mut buf = [0u8; 1024];
        loop {
            let (n, src) = self
                .socket
                .recv_from(&mut buf)
                .await
                .map_err(DiscoveryError::Recv)?;

            if n < MIN_OFFER_LEN {
                debug!("ignoring {n}-byte datagram from {src}");
                continue;
            }
            match decode_offer(&buf[..n]) {
                Ok(offer) => {
                    let dealer = DiscoveredDealer {
                        addr: SocketAddr::new(src.ip(), offer.tcp_port),
                        server_name: offer.server_name,
                    };
                    info!(
                        "received offer from {:?} at {}",
                        dealer.server_name, dealer.addr
                    );
                    return Ok(dealer);
                }
                Err(e) => debug!("ignoring datagram from {src}: {e}"),
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use bj_core::protocol::{encode_offer, encode_request};
    use std::time::Duration;

    async fn listener_and_sender() -> (OfferListener, UdpSocket, SocketAddr) {
        let listener = OfferListener::bind(0).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        (listener, sender, SocketAddr::from((Ipv4Addr::LOCALHOST, port)))
    }

    #[tokio::test]
    async fn test_offer_yields_sender_ip_and_advertised_port() {
        // Arrange
        let (listener, sender, target) = listener_and_sender().await;

        // Act
        sender.send_to(&encode_offer(40123, "Dealer"), target).await.unwrap();
        let dealer = tokio::time::timeout(Duration::from_secs(2), listener.next_offer())
            .await
            .unwrap()
            .unwrap();

        // Assert
        assert_eq!(dealer.addr, "127.0.0.1:40123".parse().unwrap());
        assert_eq!(dealer.server_name, "Dealer");
    }

    #[tokio::test]
    async fn test_garbage_is_skipped_until_a_valid_offer() {
        // Arrange
        let (listener, sender, target) = listener_and_sender().await;
        let mut wrong_cookie = encode_offer(1, "Fake");
        wrong_cookie[0] = 0;

        // Act
        sender.send_to(b"hi", target).await.unwrap();
        sender.send_to(&wrong_cookie, target).await.unwrap();
        sender.send_to(&encode_request(1, "Not an offer"), target).await.unwrap();
        sender.send_to(&encode_offer(5000, "Real"), target).await.unwrap();
        let dealer = tokio::time::timeout(Duration::from_secs(2), listener.next_offer())
            .await
            .unwrap()
            .unwrap();

        // Assert
        assert_eq!(dealer.server_name, "Real");
        assert_eq!(dealer.addr.port(), 5000);
    }

    #[tokio::test]
    async fn test_port_in_use_reports_bind_failure() {
        let first = OfferListener::bind(0).await.unwrap();
        let port = first.local_addr().unwrap().port();

        let err = OfferListener::bind(port).await.err().expect("second bind fails");

        assert!(matches!(err, DiscoveryError::BindFailed { .. }));
    }
}

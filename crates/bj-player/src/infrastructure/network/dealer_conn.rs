//! TCP connection to a dealer.
//!
//! Payloads have two sizes on the wire: a 6-byte header that is either a
//! complete result or announces a card, followed in the card case by 3 more
//! bytes.  Reads therefore happen in two steps, each bounded by the read
//! timeout.

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bj_core::protocol::{
    decode_card_fields, decode_payload_header, encode_decision, encode_request,
    messages::{PayloadHeader, CARD_FIELDS_SIZE, PAYLOAD_HEADER_SIZE},
};
use bj_core::{Decision, ServerPayload};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::application::{DealerLink, PlayerError};

/// A connection to one dealer.
///
/// Generic over the stream so tests can drive it with mock I/O.
pub struct DealerConnection<S> {
    stream: S,
    read_timeout: Duration,
}

impl DealerConnection<TcpStream> {
    /// Opens a TCP connection to the dealer at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::Io`] if the connection cannot be established.
    pub async fn connect(addr: SocketAddr, read_timeout: Duration) -> Result<Self, PlayerError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        debug!("connected to dealer at {addr}");
        Ok(Self::new(stream, read_timeout))
    }
}

impl<S> DealerConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, read_timeout: Duration) -> Self {
        Self {
            stream,
            read_timeout,
        }
    }

    /// Sends the Request that opens the session.
    pub async fn send_request(&mut self, rounds: u8, team_name: &str) -> Result<(), PlayerError> {
        self.write_frame(&encode_request(rounds, team_name)).await
    }

    async fn read_frame(&mut self, buf: &mut [u8]) -> Result<(), PlayerError> {
        match timeout(self.read_timeout, self.stream.read_exact(buf)).await {
            Err(_elapsed) => Err(PlayerError::Timeout(self.read_timeout)),
            Ok(Err(e)) => Err(classify(e)),
            Ok(Ok(_)) => Ok(()),
        }
    }

    async fn write_frame(&mut self, bytes: &[u8]) -> Result<(), PlayerError> {
        self.stream.write_all(bytes).await.map_err(classify)?;
        self.stream.flush().await.map_err(classify)
    }
}

fn classify(e: std::io::Error) -> PlayerError {
    match e.kind() {
        ErrorKind::UnexpectedEof
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::BrokenPipe => PlayerError::Disconnected,
        _ => PlayerError::Io(e),
    }
}

#[async_trait]
impl<S> DealerLink for DealerConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_decision(&mut self, decision: Decision) -> Result<(), PlayerError> {
        self.write_frame(&encode_decision(decision)).await
    }

    async fn recv_payload(&mut self) -> Result<ServerPayload, PlayerError> {
        let mut header = [0u8; PAYLOAD_HEADER_SIZE];
        self.read_frame(&mut header).await?;
        match decode_payload_header(&header)? {
            PayloadHeader::Result(outcome) => Ok(ServerPayload::Result(outcome)),
            PayloadHeader::CardFollows => {
                let mut fields = [0u8; CARD_FIELDS_SIZE];
                self.read_frame(&mut fields).await?;
                Ok(ServerPayload::Card(decode_card_fields(&fields)?))
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

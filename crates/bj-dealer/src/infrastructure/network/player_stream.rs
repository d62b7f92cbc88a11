//! `PlayerLink` over a byte stream.
//!
//! Every message on the TCP session has a fixed size, so reading is always
//! "read the 5-byte header, check it, read the known remainder".  Each read
//! is wrapped in the session's idle timeout.

use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use bj_core::protocol::{
    decode_decision, decode_request, encode_card_payload, encode_result_payload, expect_header,
    messages::{Decision, MessageType, RequestMessage, DECISION_SIZE, HEADER_SIZE, REQUEST_SIZE},
};
use bj_core::{Card, RoundOutcome};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::application::{PlayerLink, SessionError};

/// A player connection seen by the dealer.
///
/// Generic over the stream so tests can substitute in-memory pipes for
/// `TcpStream`.
pub struct PlayerStream<S> {
    stream: S,
    read_timeout: Duration,
}

impl<S> PlayerStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, read_timeout: Duration) -> Self {
        Self {
            stream,
            read_timeout,
        }
    }

    /// Fills `buf` completely or fails.
    async fn read_frame(&mut self, buf: &mut [u8]) -> Result<(), SessionError> {
        match timeout(self.read_timeout, self.stream.read_exact(buf)).await {
            Err(_elapsed) => Err(SessionError::Timeout(self.read_timeout)),
            Ok(Err(e)) => Err(classify(e)),
            Ok(Ok(_)) => Ok(()),
        }
    }

    /// Reads a header, checks it, then reads the rest of a `N`-byte message.
    async fn read_message<const N: usize>(
        &mut self,
        expected: MessageType,
    ) -> Result<[u8; N], SessionError> {
        let mut buf = [0u8; N];
        self.read_frame(&mut buf[..HEADER_SIZE]).await?;
        expect_header(&buf[..HEADER_SIZE], expected)?;
        self.read_frame(&mut buf[HEADER_SIZE..]).await?;
        Ok(buf)
    }

    async fn write_frame(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        self.stream.write_all(bytes).await.map_err(classify)?;
        self.stream.flush().await.map_err(classify)
    }
}

/// Peer-gone errors become `Disconnected`; everything else stays `Io`.
fn classify(e: std::io::Error) -> SessionError {
    match e.kind() {
        ErrorKind::UnexpectedEof
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::BrokenPipe => SessionError::Disconnected,
        _ => SessionError::Io(e),
    }
}

#[async_trait]
impl<S> PlayerLink for PlayerStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn recv_request(&mut self) -> Result<RequestMessage, SessionError> {
        let buf = self.read_message::<REQUEST_SIZE>(MessageType::Request).await?;
        Ok(decode_request(&buf)?)
    }

    async fn recv_decision(&mut self) -> Result<Decision, SessionError> {
        let buf = self.read_message::<DECISION_SIZE>(MessageType::Payload).await?;
        Ok(decode_decision(&buf)?)
    }

    async fn send_card(&mut self, card: Card) -> Result<(), SessionError> {
        self.write_frame(&encode_card_payload(&card)).await
    }

    async fn send_result(&mut self, outcome: RoundOutcome) -> Result<(), SessionError> {
        self.write_frame(&encode_result_payload(outcome)).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

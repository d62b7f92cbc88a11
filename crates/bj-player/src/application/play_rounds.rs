//! Use case: play a number of rounds against a connected dealer.
//!
//! # Round flow (player's side)
//!
//! 1. Receive two cards for our hand, then the dealer's visible card.
//! 2. While our total is 21 or less, ask the [`DecisionMaker`].
//!    - **Hit**: send it, then read one payload.  A card joins our hand.
//!    - **Stand**: send it and stop asking.
//! 3. Read payloads until a result arrives.  Any cards read here are the
//!    dealer's: the hidden card first, then its draws.  After a bust there
//!    are none and the result comes straight away.
//!
//! Any receive failure aborts the remaining rounds; there is no retry.

use std::time::Duration;

use async_trait::async_trait;
use bj_core::{Card, Decision, Hand, ProtocolError, RoundOutcome, ServerPayload, SessionStats};
use thiserror::Error;
use tracing::{debug, info};

/// Default threshold for [`ThresholdStrategy`]: the dealer's own rule.
pub const DEFAULT_HIT_THRESHOLD: u32 = 17;

/// Errors that end a player's session.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// The dealer closed the connection, possibly mid-message.
    #[error("dealer closed the connection")]
    Disconnected,
    /// Any other socket failure.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The dealer sent bytes that do not follow the protocol.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    /// The dealer sent nothing for the whole read timeout.
    #[error("no message from dealer for {0:?}")]
    Timeout(Duration),
    /// A well-formed payload arrived at a point where it makes no sense.
    #[error("unexpected payload: {0}")]
    UnexpectedPayload(String),
    /// The console could not provide a decision or round count.
    #[error("input error: {0}")]
    Input(String),
}

/// The session's view of the dealer connection.
#[async_trait]
pub trait DealerLink: Send {
    async fn send_decision(&mut self, decision: Decision) -> Result<(), PlayerError>;
    async fn recv_payload(&mut self) -> Result<ServerPayload, PlayerError>;
}

/// Everything a decision maker may look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub round: u8,
    pub hand: Hand,
    pub dealer_upcard: Card,
}

/// Chooses Hit or Stand.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DecisionMaker: Send {
    async fn decide(&mut self, view: &TableView) -> Result<Decision, PlayerError>;
}

#[async_trait]
impl<T: DecisionMaker + ?Sized> DecisionMaker for &mut T {
    async fn decide(&mut self, view: &TableView) -> Result<Decision, PlayerError> {
        (**self).decide(view).await
    }
}

/// Hits while the hand total is below a fixed threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdStrategy {
    threshold: u32,
}

impl ThresholdStrategy {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }
}

impl Default for ThresholdStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_HIT_THRESHOLD)
    }
}

#[async_trait]
impl DecisionMaker for ThresholdStrategy {
    async fn decide(&mut self, view: &TableView) -> Result<Decision, PlayerError> {
        Ok(if view.hand.value() < self.threshold {
            Decision::Hit
        } else {
            Decision::Stand
        })
    }
}

/// Plays rounds over one dealer connection.
pub struct PlayerSession<L, M> {
    link: L,
    decisions: M,
    stats: SessionStats,
}

impl<L: DealerLink, M: DecisionMaker> PlayerSession<L, M> {
    pub fn new(link: L, decisions: M) -> Self {
        Self {
            link,
            decisions,
            stats: SessionStats::new(),
        }
    }

    /// Plays `rounds` rounds and returns the tally.
    ///
    /// # Errors
    ///
    /// Returns the first [`PlayerError`]; rounds completed before it are
    /// still available from [`PlayerSession::stats`].
    pub async fn play(&mut self, rounds: u8) -> Result<SessionStats, PlayerError> {
        for round in 1..=rounds {
            let outcome = self.play_round(round).await?;
            self.stats.record(outcome);
            info!("round {round}: {}", describe(outcome));
        }
        Ok(self.stats)
    }

    /// Results recorded so far.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    async fn play_round(&mut self, round: u8) -> Result<RoundOutcome, PlayerError> {
        let mut hand = Hand::new();
        hand.push(self.expect_card().await?);
        hand.push(self.expect_card().await?);
        let upcard = self.expect_card().await?;
        info!(
            "round {round}: you hold {} and {} (total {}), dealer shows {upcard}",
            hand.cards()[0],
            hand.cards()[1],
            hand.value()
        );

        while !hand.is_bust() {
            let view = TableView {
                round,
                hand: hand.clone(),
                dealer_upcard: upcard,
            };
            let decision = self.decisions.decide(&view).await?;
            self.link.send_decision(decision).await?;
            debug!("sent {decision}");

            if decision == Decision::Stand {
                break;
            }
            match self.link.recv_payload().await? {
                ServerPayload::Card(card) => {
                    hand.push(card);
                    info!("you drew {card} (total {})", hand.value());
                }
                ServerPayload::Result(outcome) => return Ok(outcome),
            }
        }

        if hand.is_bust() {
            info!("bust with {}", hand.value());
        }

        let mut dealer = Hand::new();
        dealer.push(upcard);
        loop {
            match self.link.recv_payload().await? {
                ServerPayload::Card(card) => {
                    dealer.push(card);
                    info!("dealer draws {card} (dealer total {})", dealer.value());
                }
                ServerPayload::Result(outcome) => return Ok(outcome),
            }
        }
    }

    async fn expect_card(&mut self) -> Result<Card, PlayerError> {
        match self.link.recv_payload().await? {
            ServerPayload::Card(card) => Ok(card),
            ServerPayload::Result(outcome) => Err(PlayerError::UnexpectedPayload(format!(
                "result ({outcome}) before the opening cards were dealt"
            ))),
        }
    }
}

fn describe(outcome: RoundOutcome) -> &'static str {
    match outcome {
        RoundOutcome::Win => "you win",
        RoundOutcome::Loss => "dealer wins",
        RoundOutcome::Tie => "it's a tie",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! DealerSession: the per-player game state machine.
//!
//! One `DealerSession` runs for every accepted player connection.  It owns
//! everything it touches (the link to the player, its deck source, the two
//! hands, the statistics), so concurrent sessions never share state.
//!
//! # Phases
//!
//! ```text
//! AwaitingRequest ──► DealingInitial ──► AwaitingPlayerMove ◄──► ResolvingHit
//!                          ▲                     │ Stand              │ bust
//!                          │                     ▼                    │
//!                          │               DealerDraws                │
//!                          │                     │                    │
//!                          │                     ▼                    │
//!                          └──── more rounds ─ RoundComplete ◄────────┘
//!                                                │ no rounds left
//!                                                ▼
//!                                         SessionComplete
//! ```
//!
//! - `DealingInitial`: fresh deck; deal player, dealer (visible), player,
//!   dealer (hidden).  Both player cards and the visible dealer card are sent;
//!   the hidden card is withheld.
//! - `AwaitingPlayerMove` / `ResolvingHit`: each Hit deals and sends one card.
//!   A player total above 21 ends the round as a loss right away; the hidden
//!   dealer card is never sent in that case.
//! - `DealerDraws`: reveal the hidden card, then draw while below 17.
//! - `RoundComplete`: send exactly one result and update the statistics.
//!
//! Any error from the link (disconnect, timeout, protocol violation) ends the
//! session immediately; remaining rounds are abandoned.
//!
//! # Architecture
//!
//! The session depends only on two traits: [`PlayerLink`] for I/O and
//! [`DeckSource`] for decks.  The infrastructure layer supplies a TCP-backed
//! link and shuffled decks; tests supply scripted links and stacked decks.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use bj_core::{
    decide_outcome, dealer_must_draw,
    protocol::messages::{Decision, RequestMessage},
    Card, Deck, Hand, ProtocolError, RoundOutcome, SessionStats,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, info};

/// Idle limit for every blocking receive from a player.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Pause before each deal and before the dealer reveals, so a human player
/// can follow along.
pub const DEFAULT_ROUND_PAUSE: Duration = Duration::from_secs(1);

/// Why a session ended early.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The player closed the connection, possibly mid-message.
    #[error("player disconnected")]
    Disconnected,
    /// The player sent nothing for the whole read timeout.
    #[error("no data from player for {0:?}")]
    Timeout(Duration),
    /// Any other socket failure.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The player sent bytes that do not follow the protocol.
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolError),
    /// The deck ran out mid-round.
    #[error("deck exhausted mid-round")]
    DeckExhausted,
}

impl SessionError {
    /// `true` when the player broke the protocol, as opposed to the
    /// connection simply going away.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, SessionError::Protocol(_))
    }
}

/// The session's view of one connected player.
#[async_trait]
pub trait PlayerLink: Send {
    /// Reads the player's opening Request.
    async fn recv_request(&mut self) -> Result<RequestMessage, SessionError>;

    /// Reads one Hit/Stand decision.
    async fn recv_decision(&mut self) -> Result<Decision, SessionError>;

    /// Sends one dealt card.
    async fn send_card(&mut self, card: Card) -> Result<(), SessionError>;

    /// Sends the round's result.
    async fn send_result(&mut self, outcome: RoundOutcome) -> Result<(), SessionError>;
}

/// Supplies a fresh deck at the start of every round.
pub trait DeckSource: Send {
    fn fresh_deck(&mut self) -> Deck;
}

/// Full 52-card decks shuffled with a per-session RNG.
pub struct ShuffledDecks {
    rng: StdRng,
}

impl ShuffledDecks {
    /// Seeds the RNG from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible shuffles, for replaying a session.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for ShuffledDecks {
    fn default() -> Self {
        Self::new()
    }
}

impl DeckSource for ShuffledDecks {
    fn fresh_deck(&mut self) -> Deck {
        let mut deck = Deck::new();
        deck.shuffle_with(&mut self.rng);
        deck
    }
}

/// Pre-arranged decks handed out in order, one per round.
///
/// Once the queue is empty every further round gets an empty deck, which
/// fails the session with [`SessionError::DeckExhausted`].
#[derive(Debug, Default)]
pub struct StackedDecks {
    decks: VecDeque<Deck>,
}

impl StackedDecks {
    pub fn new(decks: impl IntoIterator<Item = Deck>) -> Self {
        Self {
            decks: decks.into_iter().collect(),
        }
    }
}

impl DeckSource for StackedDecks {
    fn fresh_deck(&mut self) -> Deck {
        self.decks
            .pop_front()
            .unwrap_or_else(|| Deck::stacked(std::iter::empty()))
    }
}

/// Timing knobs for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub read_timeout: Duration,
    pub round_pause: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            round_pause: DEFAULT_ROUND_PAUSE,
        }
    }
}

/// Where the state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    AwaitingRequest,
    DealingInitial,
    AwaitingPlayerMove,
    ResolvingHit,
    DealerDraws,
    RoundComplete,
    SessionComplete,
}

/// Summary of a session that ran all its rounds.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub team_name: String,
    pub rounds_requested: u8,
    pub stats: SessionStats,
}

/// Cards in play during one round.
struct RoundTable {
    deck: Deck,
    player: Hand,
    dealer: Hand,
}

impl RoundTable {
    fn new(deck: Deck) -> Self {
        Self {
            deck,
            player: Hand::new(),
            dealer: Hand::new(),
        }
    }

    fn draw(&mut self) -> Result<Card, SessionError> {
        self.deck.deal_one().ok_or(SessionError::DeckExhausted)
    }

    fn deal_to_player(&mut self) -> Result<Card, SessionError> {
        let card = self.draw()?;
        self.player.push(card);
        Ok(card)
    }

    fn deal_to_dealer(&mut self) -> Result<Card, SessionError> {
        let card = self.draw()?;
        self.dealer.push(card);
        Ok(card)
    }
}

/// Runs the full multi-round game with one player.
pub struct DealerSession<L, D> {
    link: L,
    decks: D,
    settings: SessionSettings,
    phase: SessionPhase,
    stats: SessionStats,
    team_name: String,
}

impl<L: PlayerLink, D: DeckSource> DealerSession<L, D> {
    pub fn new(link: L, decks: D, settings: SessionSettings) -> Self {
        Self {
            link,
            decks,
            settings,
            phase: SessionPhase::AwaitingRequest,
            stats: SessionStats::new(),
            team_name: String::new(),
        }
    }

    /// Performs the handshake and plays every requested round.
    ///
    /// # Errors
    ///
    /// Returns the first [`SessionError`] raised in any phase; the caller is
    /// expected to drop the connection.
    pub async fn run(mut self) -> Result<SessionReport, SessionError> {
        let request = self.link.recv_request().await?;
        self.team_name = request.team_name.clone();
        info!(
            team = %request.team_name,
            rounds = request.rounds,
            "player joined, welcome to the game"
        );

        for round in 1..=request.rounds {
            let outcome = match self.play_round(round).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    info!(
                        team = %self.team_name,
                        completed = self.stats.rounds_played(),
                        "session abandoned in round {round}"
                    );
                    return Err(e);
                }
            };
            self.stats.record(outcome);
        }

        self.enter(SessionPhase::SessionComplete);
        info!(
            team = %self.team_name,
            rounds = self.stats.rounds_played(),
            wins = self.stats.wins,
            losses = self.stats.losses,
            ties = self.stats.ties,
            "all rounds finished, win rate {:.2}",
            self.stats.win_rate()
        );

        Ok(SessionReport {
            team_name: self.team_name,
            rounds_requested: request.rounds,
            stats: self.stats,
        })
    }

    async fn play_round(&mut self, round: u8) -> Result<RoundOutcome, SessionError> {
        self.enter(SessionPhase::DealingInitial);
        pause(self.settings.round_pause).await;
        info!(team = %self.team_name, "starting round {round}");

        let mut table = RoundTable::new(self.decks.fresh_deck());
        let first = table.deal_to_player()?;
        let visible = table.deal_to_dealer()?;
        let second = table.deal_to_player()?;
        let hidden = table.deal_to_dealer()?;

        self.send_card(first).await?;
        self.send_card(second).await?;
        self.send_card(visible).await?;
        debug!(
            player_total = table.player.value(),
            %visible,
            %hidden,
            "initial cards dealt"
        );

        loop {
            self.enter(SessionPhase::AwaitingPlayerMove);
            match self.link.recv_decision().await? {
                Decision::Stand => {
                    debug!(team = %self.team_name, "player stands");
                    break;
                }
                Decision::Hit => {
                    self.enter(SessionPhase::ResolvingHit);
                    let card = table.deal_to_player()?;
                    self.send_card(card).await?;
                    debug!(%card, player_total = table.player.value(), "player hits");
                    if table.player.is_bust() {
                        info!(team = %self.team_name, "player busts, dealer wins this round");
                        return self.finish_round(RoundOutcome::Loss).await;
                    }
                }
            }
        }

        self.enter(SessionPhase::DealerDraws);
        pause(self.settings.round_pause).await;
        self.send_card(hidden).await?;
        while dealer_must_draw(table.dealer.value()) {
            let card = table.deal_to_dealer()?;
            self.send_card(card).await?;
            debug!(%card, dealer_total = table.dealer.value(), "dealer draws");
        }

        let outcome = decide_outcome(table.player.value(), table.dealer.value());
        info!(
            team = %self.team_name,
            player_total = table.player.value(),
            dealer_total = table.dealer.value(),
            "round {round} result: {outcome}"
        );
        self.finish_round(outcome).await
    }

    async fn finish_round(&mut self, outcome: RoundOutcome) -> Result<RoundOutcome, SessionError> {
        self.enter(SessionPhase::RoundComplete);
        self.link.send_result(outcome).await?;
        Ok(outcome)
    }

    async fn send_card(&mut self, card: Card) -> Result<(), SessionError> {
        self.link.send_card(card).await
    }

    fn enter(&mut self, next: SessionPhase) {
        debug!(from = ?self.phase, to = ?next, "session phase");
        self.phase = next;
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use bj_core::{ServerPayload, Suit};

    /// Plays back a fixed list of decisions and records everything sent.
    struct ScriptedLink {
        request: Option<RequestMessage>,
        decisions: VecDeque<Result<Decision, SessionError>>,
        sent: Vec<ServerPayload>,
    }

    impl ScriptedLink {
        fn new(rounds: u8, decisions: Vec<Result<Decision, SessionError>>) -> Self {
            Self {
                request: Some(RequestMessage {
                    rounds,
                    team_name: "Testers".to_string(),
                }),
                decisions: decisions.into(),
                sent: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl<'a> PlayerLink for &'a mut ScriptedLink {
        async fn recv_request(&mut self) -> Result<RequestMessage, SessionError> {
            self.request.take().ok_or(SessionError::Disconnected)
        }

        async fn recv_decision(&mut self) -> Result<Decision, SessionError> {
            self.decisions
                .pop_front()
                .unwrap_or(Err(SessionError::Disconnected))
        }

        async fn send_card(&mut self, card: Card) -> Result<(), SessionError> {
            self.sent.push(ServerPayload::Card(card));
            Ok(())
        }

        async fn send_result(&mut self, outcome: RoundOutcome) -> Result<(), SessionError> {
            self.sent.push(ServerPayload::Result(outcome));
            Ok(())
        }
    }

    fn c(rank: u8) -> Card {
        Card::new(Suit::Hearts, rank).unwrap()
    }

    fn cards(ranks: &[u8]) -> Vec<ServerPayload> {
        ranks.iter().map(|&r| ServerPayload::Card(c(r))).collect()
    }

    fn settings() -> SessionSettings {
        SessionSettings {
            read_timeout: Duration::from_secs(1),
            round_pause: Duration::ZERO,
        }
    }

    /// Deal order is: player, dealer visible, player, dealer hidden, then hits.
    fn stacked(ranks: &[u8]) -> StackedDecks {
        StackedDecks::new([Deck::stacked(ranks.iter().map(|&r| c(r)))])
    }

    #[tokio::test]
    async fn test_stand_reveals_hidden_card_and_dealer_draws_to_seventeen() {
        // Arrange: player 10+8=18, dealer 9+7=16 draws a 5 to 21.
        let mut link = ScriptedLink::new(1, vec![Ok(Decision::Stand)]);
        let decks = stacked(&[10, 9, 8, 7, 5, 2]);

        // Act
        let report = DealerSession::new(&mut link, decks, settings()).run().await.unwrap();

        // Assert
        let mut expected = cards(&[10, 8, 9, 7, 5]);
        expected.push(ServerPayload::Result(RoundOutcome::Loss));
        assert_eq!(link.sent, expected);
        assert_eq!(report.stats, SessionStats { wins: 0, losses: 1, ties: 0 });
        assert_eq!(report.team_name, "Testers");
    }

    #[tokio::test]
    async fn test_bust_on_third_hit_skips_dealer_phase() {
        // Arrange: player 2+3, hits 4, 5, King -> 24.
        let hits = (0..5).map(|_| Ok(Decision::Hit)).collect();
        let mut link = ScriptedLink::new(1, hits);
        let decks = stacked(&[2, 10, 3, 7, 4, 5, 13, 6]);

        // Act
        let report = DealerSession::new(&mut link, decks, settings()).run().await.unwrap();

        // Assert: three initial cards, three hit cards, one loss.  The hidden
        // dealer 7 is never sent.
        let mut expected = cards(&[2, 3, 10, 4, 5, 13]);
        expected.push(ServerPayload::Result(RoundOutcome::Loss));
        assert_eq!(link.sent, expected);
        assert_eq!(link.decisions.len(), 2, "only three decisions consumed");
        assert_eq!(report.stats.losses, 1);
    }

    #[tokio::test]
    async fn test_dealer_bust_is_a_player_win() {
        let mut link = ScriptedLink::new(1, vec![Ok(Decision::Stand)]);
        let decks = stacked(&[10, 10, 9, 6, 12]);

        let report = DealerSession::new(&mut link, decks, settings()).run().await.unwrap();

        assert_eq!(link.sent.last(), Some(&ServerPayload::Result(RoundOutcome::Win)));
        assert_eq!(report.stats.wins, 1);
    }

    #[tokio::test]
    async fn test_equal_totals_tie_without_dealer_draw() {
        let mut link = ScriptedLink::new(1, vec![Ok(Decision::Stand)]);
        let decks = stacked(&[10, 10, 8, 8]);

        DealerSession::new(&mut link, decks, settings()).run().await.unwrap();

        let mut expected = cards(&[10, 8, 10, 8]);
        expected.push(ServerPayload::Result(RoundOutcome::Tie));
        assert_eq!(link.sent, expected);
    }

    #[tokio::test]
    async fn test_dealer_stops_at_first_total_of_seventeen() {
        // Arrange: dealer 2+3 draws 4 (9), 8 (17) and must not take the 10.
        let mut link = ScriptedLink::new(1, vec![Ok(Decision::Stand)]);
        let decks = stacked(&[10, 2, 9, 3, 4, 8, 10]);

        // Act
        DealerSession::new(&mut link, decks, settings()).run().await.unwrap();

        // Assert: player 19 beats dealer 17.
        let mut expected = cards(&[10, 9, 2, 3, 4, 8]);
        expected.push(ServerPayload::Result(RoundOutcome::Win));
        assert_eq!(link.sent, expected);
    }

    #[tokio::test]
    async fn test_hit_then_stand_wins() {
        // Player 5+6 hits a 10 (21) then stands; dealer 10+7 = 17.
        let mut link = ScriptedLink::new(1, vec![Ok(Decision::Hit), Ok(Decision::Stand)]);
        let decks = stacked(&[5, 10, 6, 7, 10]);

        let report = DealerSession::new(&mut link, decks, settings()).run().await.unwrap();

        let mut expected = cards(&[5, 6, 10, 10, 7]);
        expected.push(ServerPayload::Result(RoundOutcome::Win));
        assert_eq!(link.sent, expected);
        assert_eq!(report.stats.wins, 1);
    }

    #[tokio::test]
    async fn test_every_round_gets_a_fresh_deck() {
        // Arrange: two rounds, two different decks.
        let mut link = ScriptedLink::new(2, vec![Ok(Decision::Stand), Ok(Decision::Stand)]);
        let decks = StackedDecks::new([
            Deck::stacked([10, 10, 8, 8].map(c)),
            Deck::stacked([10, 10, 9, 7].map(c)),
        ]);

        // Act
        let report = DealerSession::new(&mut link, decks, settings()).run().await.unwrap();

        // Assert: round one ties 18/18, round two wins 19/17.
        assert_eq!(report.stats, SessionStats { wins: 1, losses: 0, ties: 1 });
        assert_eq!(report.rounds_requested, 2);
        let results: Vec<_> = link
            .sent
            .iter()
            .filter(|p| matches!(p, ServerPayload::Result(_)))
            .collect();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_unrecognized_move_ends_session_without_result() {
        // Arrange
        let bad = Err(SessionError::Protocol(ProtocolError::UnrecognizedMove(
            "Split".to_string(),
        )));
        let mut link = ScriptedLink::new(3, vec![bad]);
        let decks = stacked(&[10, 10, 8, 8]);

        // Act
        let err = DealerSession::new(&mut link, decks, settings())
            .run()
            .await
            .unwrap_err();

        // Assert
        assert!(err.is_protocol_violation());
        assert_eq!(link.sent.len(), 3, "only the opening cards were sent");
        assert!(!link
            .sent
            .iter()
            .any(|p| matches!(p, ServerPayload::Result(_))));
    }

    #[tokio::test]
    async fn test_disconnect_abandons_remaining_rounds() {
        let mut link = ScriptedLink::new(5, vec![Ok(Decision::Stand)]);
        let decks = StackedDecks::new([
            Deck::stacked([10, 10, 8, 8].map(c)),
            Deck::stacked([10, 10, 8, 8].map(c)),
        ]);

        let err = DealerSession::new(&mut link, decks, settings())
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Disconnected));
        assert!(!err.is_protocol_violation());
    }

    #[tokio::test]
    async fn test_exhausted_deck_fails_the_round() {
        let mut link = ScriptedLink::new(1, vec![Ok(Decision::Stand)]);
        let decks = stacked(&[10, 10, 8]);

        let err = DealerSession::new(&mut link, decks, settings())
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::DeckExhausted));
        assert!(link.sent.is_empty());
    }

    #[tokio::test]
    async fn test_missing_request_never_deals() {
        let mut link = ScriptedLink::new(1, vec![]);
        link.request = None;

        let err = DealerSession::new(&mut link, stacked(&[]), settings())
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Disconnected));
        assert!(link.sent.is_empty());
    }

    #[test]
    fn test_shuffled_decks_are_full_and_seeded_ones_repeat() {
        let mut a = ShuffledDecks::seeded(11);
        let mut b = ShuffledDecks::seeded(11);
        let deck = a.fresh_deck();
        assert_eq!(deck.remaining(), bj_core::domain::card::DECK_SIZE);
        assert_eq!(deck, b.fresh_deck());
    }

    #[test]
    fn test_default_settings_use_sixty_second_timeout() {
        let s = SessionSettings::default();
        assert_eq!(s.read_timeout, Duration::from_secs(60));
        assert_eq!(s.round_pause, Duration::from_secs(1));
    }
}

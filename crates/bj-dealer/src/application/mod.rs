//! Application layer use cases for the dealer.
//!
//! # What lives here? (for beginners)
//!
//! The dealer has a single use case: play a multi-round blackjack session
//! with one connected player.  It is written against two traits,
//! [`dealer_session::PlayerLink`] and [`dealer_session::DeckSource`], so it
//! contains no sockets and no randomness of its own.  The infrastructure
//! layer plugs in a TCP stream and a shuffling deck source; tests plug in
//! scripted fakes.
//!
//! # Sub-modules
//!
//! - **`dealer_session`** – The per-player state machine: handshake, deal,
//!   hit/stand loop, dealer draws, scoring, statistics.

pub mod dealer_session;

pub use dealer_session::{
    DealerSession, DeckSource, PlayerLink, SessionError, SessionPhase, SessionReport,
    SessionSettings, ShuffledDecks, StackedDecks,
};

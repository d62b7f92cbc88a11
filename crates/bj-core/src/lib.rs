//! # bj-core
//!
//! Shared library for Blackjack-over-LAN containing the wire protocol codec
//! and the card-game domain.
//!
//! This crate is used by both the dealer and the player applications.
//! It has no dependencies on network sockets, async runtimes, or the console.
//!
//! # Architecture overview (for beginners)
//!
//! A dealer process announces itself on the LAN with UDP broadcasts.  Players
//! hear the announcement, open a TCP connection to the dealer, and play a
//! number of blackjack rounds against it.  Every byte that travels between
//! the two is produced and parsed here.
//!
//! - **`protocol`** – How bytes travel over the network.  Five fixed-layout
//!   messages (Offer, Request, Payload-Card, Payload-Result, Decision), each
//!   starting with a magic cookie and a type byte.
//!
//! - **`domain`** – Pure game logic: cards and decks, hand totals, the
//!   dealer's drawing rule, and how a round is scored.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `bj_core::Card` instead of `bj_core::domain::card::Card`.
pub use domain::card::{Card, Deck, Suit};
pub use domain::hand::Hand;
pub use domain::rules::{decide_outcome, dealer_must_draw, RoundOutcome, SessionStats};
pub use protocol::codec::ProtocolError;
pub use protocol::messages::{Decision, OfferMessage, RequestMessage, ServerPayload};

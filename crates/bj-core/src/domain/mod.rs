//! Card-game domain: cards, decks, hands, and the round rules.
//!
//! Pure logic with no sockets, clocks, or console I/O.  Both the dealer and
//! the player build on these types; only the dealer ever owns a [`card::Deck`].

pub mod card;
pub mod hand;
pub mod rules;

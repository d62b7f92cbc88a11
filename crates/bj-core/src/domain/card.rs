//! Playing cards and the 52-card deck.
//!
//! A [`Deck`] is built fresh for every round, shuffled, and then consumed one
//! card at a time with [`Deck::deal_one`].  Cards are never put back, so a
//! single deck can never issue the same (suit, rank) pair twice.
//!
//! # Card values (for beginners)
//!
//! Blackjack only cares about the *value* of a card, not its suit:
//!
//! | Rank            | Value |
//! |-----------------|-------|
//! | Ace (1)         | 11    |
//! | 2–10            | rank  |
//! | Jack/Queen/King | 10    |
//!
//! This game always counts an Ace as 11; there is no "soft" Ace that drops
//! to 1 when the hand would otherwise bust.

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;

/// Lowest legal rank (Ace).
pub const MIN_RANK: u8 = 1;

/// Highest legal rank (King).
pub const MAX_RANK: u8 = 13;

/// Number of cards in a full deck.
pub const DECK_SIZE: usize = 52;

// ── Suit ──────────────────────────────────────────────────────────────────────

/// Card suit.  The discriminant is the suit code carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Suit {
    Hearts = 1,
    Diamonds = 2,
    Clubs = 3,
    Spades = 4,
}

impl Suit {
    /// All four suits in wire-code order.
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];

    /// Human-readable suit name.
    pub fn name(self) -> &'static str {
        match self {
            Suit::Hearts => "Hearts",
            Suit::Diamonds => "Diamonds",
            Suit::Clubs => "Clubs",
            Suit::Spades => "Spades",
        }
    }
}

impl TryFrom<u8> for Suit {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Suit::Hearts),
            2 => Ok(Suit::Diamonds),
            3 => Ok(Suit::Clubs),
            4 => Ok(Suit::Spades),
            _ => Err(()),
        }
    }
}

// ── Card ──────────────────────────────────────────────────────────────────────

/// A single playing card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub suit: Suit,
    /// 1 = Ace, 2–10 = number cards, 11 = Jack, 12 = Queen, 13 = King.
    pub rank: u8,
}

impl Card {
    /// Creates a card.  Returns `None` when `rank` is outside `1..=13`.
    pub fn new(suit: Suit, rank: u8) -> Option<Self> {
        (MIN_RANK..=MAX_RANK)
            .contains(&rank)
            .then_some(Self { suit, rank })
    }

    /// Blackjack value of the card (Ace = 11, face cards = 10).
    pub fn value(&self) -> u32 {
        match self.rank {
            1 => 11,
            11..=13 => 10,
            r => u32::from(r),
        }
    }

    fn rank_name(&self) -> String {
        match self.rank {
            1 => "Ace".to_string(),
            11 => "Jack".to_string(),
            12 => "Queen".to_string(),
            13 => "King".to_string(),
            r => r.to_string(),
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", self.rank_name(), self.suit.name())
    }
}

// ── Deck ──────────────────────────────────────────────────────────────────────

/// A single 52-card deck consumed by removal.
///
/// The top of the deck is the end of the internal vector, so dealing is an
/// O(1) `pop`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Builds an ordered, unshuffled deck containing every (suit, rank) pair once.
    pub fn new() -> Self {
        let cards = Suit::ALL
            .iter()
            .flat_map(|&suit| (MIN_RANK..=MAX_RANK).map(move |rank| Card { suit, rank }))
            .collect();
        Self { cards }
    }

    /// Builds a deck that deals `cards` in exactly the given order.
    ///
    /// Used for replaying a known shoe and for deterministic tests.
    pub fn stacked(cards: impl IntoIterator<Item = Card>) -> Self {
        let mut cards: Vec<Card> = cards.into_iter().collect();
        cards.reverse();
        Self { cards }
    }

    /// Shuffles the remaining cards using the thread-local RNG.
    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rand::rng());
    }

    /// Shuffles the remaining cards with a caller-supplied RNG.
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Removes and returns the top card, or `None` once the deck is empty.
    pub fn deal_one(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    /// Number of cards left to deal.
    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

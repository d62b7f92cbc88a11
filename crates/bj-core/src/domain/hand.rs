//! A hand of cards and its running total.

use crate::domain::card::Card;
use crate::domain::rules::BLACKJACK;

/// Ordered, append-only collection of dealt cards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a card to the hand.
    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Sum of the card values (Ace always 11).
    pub fn value(&self) -> u32 {
        self.cards.iter().map(Card::value).sum()
    }

    /// `true` once the total exceeds 21.
    pub fn is_bust(&self) -> bool {
        self.value() > BLACKJACK
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl FromIterator<Card> for Hand {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        Self {
            cards: iter.into_iter().collect(),
        }
    }
}

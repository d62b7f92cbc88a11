//! Dealer rules, round outcomes, and per-session statistics.
//!
//! These are pure functions of hand totals so they can be exercised without
//! a deck or a socket.

/// Highest total that does not bust.
pub const BLACKJACK: u32 = 21;

/// The dealer keeps drawing while their total is below this value.
pub const DEALER_STAND_THRESHOLD: u32 = 17;

/// Result of one round, from the player's point of view.
///
/// The discriminant is the `result` byte carried in a Payload-Result message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RoundOutcome {
    Tie = 1,
    Loss = 2,
    Win = 3,
}

impl TryFrom<u8> for RoundOutcome {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(RoundOutcome::Tie),
            2 => Ok(RoundOutcome::Loss),
            3 => Ok(RoundOutcome::Win),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for RoundOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RoundOutcome::Tie => "tie",
            RoundOutcome::Loss => "loss",
            RoundOutcome::Win => "win",
        })
    }
}

/// Returns `true` while the dealer must take another card.
pub fn dealer_must_draw(dealer_total: u32) -> bool {
    dealer_total < DEALER_STAND_THRESHOLD
}

/// Decides the round from the final totals.
///
/// A busted player loses regardless of the dealer.  Otherwise a busted dealer
/// loses, and if neither busted the higher total wins.
pub fn decide_outcome(player_total: u32, dealer_total: u32) -> RoundOutcome {
    if player_total > BLACKJACK {
        RoundOutcome::Loss
    } else if dealer_total > BLACKJACK || player_total > dealer_total {
        RoundOutcome::Win
    } else if player_total < dealer_total {
        RoundOutcome::Loss
    } else {
        RoundOutcome::Tie
    }
}

/// Running win/loss/tie counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one finished round.
    pub fn record(&mut self, outcome: RoundOutcome) {
        match outcome {
            RoundOutcome::Win => self.wins += 1,
            RoundOutcome::Loss => self.losses += 1,
            RoundOutcome::Tie => self.ties += 1,
        }
    }

    pub fn rounds_played(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    /// Fraction of rounds won; `0.0` before any round finished.
    pub fn win_rate(&self) -> f64 {
        match self.rounds_played() {
            0 => 0.0,
            n => f64::from(self.wins) / f64::from(n),
        }
    }
}

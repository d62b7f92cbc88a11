//! Application layer use cases for the player.
//!
//! # Sub-modules
//!
//! - **`play_rounds`** – Plays the requested number of rounds against a
//!   dealer: tracks the hand, asks a [`play_rounds::DecisionMaker`] what to
//!   do, and tallies the results.  Talks to the network only through the
//!   [`play_rounds::DealerLink`] trait.

pub mod play_rounds;

pub use play_rounds::{
    DealerLink, DecisionMaker, PlayerError, PlayerSession, TableView, ThresholdStrategy,
    DEFAULT_HIT_THRESHOLD,
};

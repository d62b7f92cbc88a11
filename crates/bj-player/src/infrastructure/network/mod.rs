//! Network infrastructure for the player.
//!
//! # Sub-modules
//!
//! - **`discovery`** – Binds the discovery port and waits for a valid UDP
//!   Offer, yielding the dealer's address and name.
//!
//! - **`dealer_conn`** – The TCP session with one dealer: sends the Request
//!   and Decisions, reads Payloads with an idle timeout.

pub mod dealer_conn;
pub mod discovery;

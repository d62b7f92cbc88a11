//! All Blackjack-over-LAN protocol message types and wire constants.
//!
//! Every message starts with the same 5-byte header:
//!
//! ```text
//! [magic_cookie:4][msg_type:1]
//! ```
//!
//! followed by a fixed-size body that depends on the message type.  There is
//! no length prefix: the receiver knows how many bytes to read from the type
//! byte (and, for payloads, from the `result` byte).

use crate::domain::card::Card;
use crate::domain::rules::RoundOutcome;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Fixed preamble of every message; anything else is rejected.
pub const MAGIC_COOKIE: u32 = 0xabcd_dcba;

/// UDP port players listen on for dealer offers.
pub const DISCOVERY_PORT: u16 = 13122;

/// Cookie (4) + message type (1).
pub const HEADER_SIZE: usize = 5;

/// Width of the NUL-padded server/team name fields.
pub const NAME_FIELD_SIZE: usize = 32;

/// Width of the ASCII move field in a Decision message.
pub const MOVE_FIELD_SIZE: usize = 5;

/// Header + tcp_port (2) + server_name (32).
pub const OFFER_SIZE: usize = HEADER_SIZE + 2 + NAME_FIELD_SIZE;

/// Header + rounds (1) + team_name (32).
pub const REQUEST_SIZE: usize = HEADER_SIZE + 1 + NAME_FIELD_SIZE;

/// Header + result (1).  A Payload-Result is exactly this long.
pub const PAYLOAD_HEADER_SIZE: usize = HEADER_SIZE + 1;

/// rank (2) + suit (1), present only when `result == 0`.
pub const CARD_FIELDS_SIZE: usize = 3;

/// Payload header + card fields.
pub const CARD_PAYLOAD_SIZE: usize = PAYLOAD_HEADER_SIZE + CARD_FIELDS_SIZE;

/// Header + move (5).
pub const DECISION_SIZE: usize = HEADER_SIZE + MOVE_FIELD_SIZE;

/// `result` byte meaning "the round continues and a card follows".
pub const RESULT_ROUND_CONTINUES: u8 = 0x0;

/// Move string for Hit; the five-byte spelling is part of the protocol.
pub const HIT_MOVE: &[u8; MOVE_FIELD_SIZE] = b"Hittt";

/// Move string for Stand.
pub const STAND_MOVE: &[u8; MOVE_FIELD_SIZE] = b"Stand";

// ── Message type codes ────────────────────────────────────────────────────────

/// Message type byte following the magic cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Dealer → players, UDP broadcast.
    Offer = 0x2,
    /// Player → dealer, first TCP message.
    Request = 0x3,
    /// Cards and results (dealer → player) and decisions (player → dealer).
    Payload = 0x4,
}

impl TryFrom<u8> for MessageType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x2 => Ok(MessageType::Offer),
            0x3 => Ok(MessageType::Request),
            0x4 => Ok(MessageType::Payload),
            _ => Err(()),
        }
    }
}

// ── Messages ──────────────────────────────────────────────────────────────────

/// OFFER (0x2): a dealer advertising its TCP port over UDP broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferMessage {
    /// TCP port the dealer accepts players on.
    pub tcp_port: u16,
    /// Display name of the dealer (at most 32 UTF-8 bytes on the wire).
    pub server_name: String,
}

/// REQUEST (0x3): a player asking to play `rounds` rounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMessage {
    /// Number of rounds requested; always at least 1.
    pub rounds: u8,
    /// Display name of the player's team (at most 32 UTF-8 bytes on the wire).
    pub team_name: String,
}

/// PAYLOAD (0x4) sent by the dealer: either the next card or the round result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerPayload {
    /// `result == 0`: the round continues and this card was dealt.
    Card(Card),
    /// `result ∈ {1, 2, 3}`: the round is over.
    Result(RoundOutcome),
}

/// What the first 6 bytes of a dealer payload announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadHeader {
    /// Three card bytes follow.
    CardFollows,
    /// The round ended; nothing follows.
    Result(RoundOutcome),
}

/// PAYLOAD (0x4) sent by the player: Hit or Stand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Hit,
    Stand,
}

impl Decision {
    /// The fixed five-byte move string for this decision.
    pub fn wire_move(self) -> &'static [u8; MOVE_FIELD_SIZE] {
        match self {
            Decision::Hit => HIT_MOVE,
            Decision::Stand => STAND_MOVE,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Decision::Hit => "Hit",
            Decision::Stand => "Stand",
        })
    }
}

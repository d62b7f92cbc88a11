//! Binary codec for encoding and decoding Blackjack-over-LAN messages.
//!
//! Wire format (all multi-byte integers big-endian, names NUL-padded UTF-8):
//! ```text
//! Offer     [cookie:4][0x2][tcp_port:2][server_name:32]
//! Request   [cookie:4][0x3][rounds:1][team_name:32]
//! Card      [cookie:4][0x4][result=0][rank:2][suit:1]
//! Result    [cookie:4][0x4][result=1|2|3]
//! Decision  [cookie:4][0x4][move:5]            "Hittt" | "Stand"
//! ```
//!
//! Every decoder checks the magic cookie before looking at anything else, so
//! a stray datagram or a confused peer is rejected with
//! [`ProtocolError::BadMagicCookie`] even when the rest of the frame happens
//! to look valid.
//!
//! Streams carry no length prefix.  A receiver reads the 5-byte header,
//! learns the message type, and then reads the fixed body size for that type.
//! Dealer payloads need one extra step: read 6 bytes, call
//! [`decode_payload_header`], and only when it says
//! [`PayloadHeader::CardFollows`] read the 3 card bytes and call
//! [`decode_card_fields`].

use thiserror::Error;

use crate::domain::card::{Card, Suit};
use crate::domain::rules::RoundOutcome;
use crate::protocol::messages::{
    Decision, MessageType, OfferMessage, PayloadHeader, RequestMessage, ServerPayload,
    CARD_FIELDS_SIZE, CARD_PAYLOAD_SIZE, DECISION_SIZE, HEADER_SIZE, HIT_MOVE, MAGIC_COOKIE,
    NAME_FIELD_SIZE, OFFER_SIZE, PAYLOAD_HEADER_SIZE, REQUEST_SIZE, RESULT_ROUND_CONTINUES,
    STAND_MOVE,
};

/// Errors that can occur while decoding a message.
///
/// Each variant maps to a different diagnostic at the session layer; all of
/// them are fatal to the connection that produced them.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The first four bytes are not [`MAGIC_COOKIE`].
    #[error("invalid magic cookie: 0x{0:08x}")]
    BadMagicCookie(u32),

    /// The byte slice is shorter than the message requires.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The message type byte is not a recognized value.
    #[error("unknown message type: 0x{0:02X}")]
    UnknownMessageType(u8),

    /// The message type is valid but not the one expected at this point.
    #[error("unexpected message type: expected {expected:?}, got {actual:?}")]
    UnexpectedMessageType {
        expected: MessageType,
        actual: MessageType,
    },

    /// A field value is out of range or not valid UTF-8.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A Decision carried something other than `Hittt` or `Stand`.
    #[error("unrecognized move: {0:?}")]
    UnrecognizedMove(String),
}

// ── Header ────────────────────────────────────────────────────────────────────

/// Validates the 5-byte header at the start of `bytes` and returns its type.
///
/// # Errors
///
/// [`ProtocolError::BadMagicCookie`] takes priority over every other check
/// once at least four bytes are present.
pub fn decode_header(bytes: &[u8]) -> Result<MessageType, ProtocolError> {
    let cookie = read_u32(bytes, 0)?;
    if cookie != MAGIC_COOKIE {
        return Err(ProtocolError::BadMagicCookie(cookie));
    }
    require_len(bytes, HEADER_SIZE)?;
    MessageType::try_from(bytes[4]).map_err(|_| ProtocolError::UnknownMessageType(bytes[4]))
}

/// Like [`decode_header`] but also requires a specific message type.
///
/// # Errors
///
/// Returns [`ProtocolError::UnexpectedMessageType`] when the header is valid
/// but carries a different type.
pub fn expect_header(bytes: &[u8], expected: MessageType) -> Result<(), ProtocolError> {
    let actual = decode_header(bytes)?;
    if actual != expected {
        return Err(ProtocolError::UnexpectedMessageType { expected, actual });
    }
    Ok(())
}

// ── Offer ─────────────────────────────────────────────────────────────────────

/// Encodes an Offer advertising `tcp_port` under `server_name`.
///
/// # Examples
///
/// ```rust
/// use bj_core::protocol::codec::{decode_offer, encode_offer};
///
/// let bytes = encode_offer(40123, "Dealer");
/// let offer = decode_offer(&bytes).unwrap();
/// assert_eq!(offer.tcp_port, 40123);
/// assert_eq!(offer.server_name, "Dealer");
/// ```
pub fn encode_offer(tcp_port: u16, server_name: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(OFFER_SIZE);
    write_header(&mut buf, MessageType::Offer);
    buf.extend_from_slice(&tcp_port.to_be_bytes());
    write_padded_name(&mut buf, server_name);
    buf
}

/// Decodes an Offer datagram.
///
/// # Errors
///
/// Returns [`ProtocolError`] on a bad cookie, a non-Offer type, a short
/// datagram, or a server name that is not valid UTF-8.
pub fn decode_offer(bytes: &[u8]) -> Result<OfferMessage, ProtocolError> {
    expect_header(bytes, MessageType::Offer)?;
    require_len(bytes, OFFER_SIZE)?;
    let tcp_port = u16::from_be_bytes([bytes[5], bytes[6]]);
    let server_name = read_padded_name(&bytes[7..OFFER_SIZE])?;
    Ok(OfferMessage {
        tcp_port,
        server_name,
    })
}

// ── Request ───────────────────────────────────────────────────────────────────

/// Encodes a Request for `rounds` rounds.
pub fn encode_request(rounds: u8, team_name: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(REQUEST_SIZE);
    write_header(&mut buf, MessageType::Request);
    buf.push(rounds);
    write_padded_name(&mut buf, team_name);
    buf
}

/// Decodes a Request.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedPayload`] for `rounds == 0` or an
/// invalid team name, in addition to the usual header errors.
pub fn decode_request(bytes: &[u8]) -> Result<RequestMessage, ProtocolError> {
    expect_header(bytes, MessageType::Request)?;
    require_len(bytes, REQUEST_SIZE)?;
    let rounds = bytes[5];
    if rounds == 0 {
        return Err(ProtocolError::MalformedPayload(
            "Request: rounds must be between 1 and 255".to_string(),
        ));
    }
    let team_name = read_padded_name(&bytes[6..REQUEST_SIZE])?;
    Ok(RequestMessage { rounds, team_name })
}

// ── Dealer payloads ───────────────────────────────────────────────────────────

/// Encodes a Payload-Card (`result == 0`) carrying `card`.
pub fn encode_card_payload(card: &Card) -> Vec<u8> {
    let mut buf = Vec::with_capacity(CARD_PAYLOAD_SIZE);
    write_header(&mut buf, MessageType::Payload);
    buf.push(RESULT_ROUND_CONTINUES);
    buf.extend_from_slice(&u16::from(card.rank).to_be_bytes());
    buf.push(card.suit as u8);
    buf
}

/// Encodes a Payload-Result announcing the end of the round.
pub fn encode_result_payload(outcome: RoundOutcome) -> Vec<u8> {
    let mut buf = Vec::with_capacity(PAYLOAD_HEADER_SIZE);
    write_header(&mut buf, MessageType::Payload);
    buf.push(outcome as u8);
    buf
}

/// Encodes either kind of dealer payload.
pub fn encode_payload(payload: &ServerPayload) -> Vec<u8> {
    match payload {
        ServerPayload::Card(card) => encode_card_payload(card),
        ServerPayload::Result(outcome) => encode_result_payload(*outcome),
    }
}

/// Decodes the first 6 bytes of a dealer payload.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedPayload`] for a `result` byte above 3.
pub fn decode_payload_header(bytes: &[u8]) -> Result<PayloadHeader, ProtocolError> {
    expect_header(bytes, MessageType::Payload)?;
    require_len(bytes, PAYLOAD_HEADER_SIZE)?;
    match bytes[5] {
        RESULT_ROUND_CONTINUES => Ok(PayloadHeader::CardFollows),
        code => RoundOutcome::try_from(code)
            .map(PayloadHeader::Result)
            .map_err(|_| ProtocolError::MalformedPayload(format!("unknown result code: {code}"))),
    }
}

/// Decodes the 3 card bytes (`rank:u16`, `suit:u8`) that follow a
/// [`PayloadHeader::CardFollows`] header.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedPayload`] for a rank outside `1..=13`
/// or a suit outside `1..=4`.
pub fn decode_card_fields(bytes: &[u8]) -> Result<Card, ProtocolError> {
    require_len(bytes, CARD_FIELDS_SIZE)?;
    let raw_rank = u16::from_be_bytes([bytes[0], bytes[1]]);
    let suit = Suit::try_from(bytes[2])
        .map_err(|_| ProtocolError::MalformedPayload(format!("unknown suit: {}", bytes[2])))?;
    u8::try_from(raw_rank)
        .ok()
        .and_then(|rank| Card::new(suit, rank))
        .ok_or_else(|| ProtocolError::MalformedPayload(format!("rank out of range: {raw_rank}")))
}

/// Decodes a complete dealer payload held in one buffer.
///
/// # Errors
///
/// See [`decode_payload_header`] and [`decode_card_fields`].
pub fn decode_payload(bytes: &[u8]) -> Result<ServerPayload, ProtocolError> {
    match decode_payload_header(bytes)? {
        PayloadHeader::Result(outcome) => Ok(ServerPayload::Result(outcome)),
        PayloadHeader::CardFollows => {
            require_len(bytes, CARD_PAYLOAD_SIZE)?;
            decode_card_fields(&bytes[PAYLOAD_HEADER_SIZE..CARD_PAYLOAD_SIZE]).map(ServerPayload::Card)
        }
    }
}

// ── Decision ──────────────────────────────────────────────────────────────────

/// Encodes a player's Hit/Stand decision.
pub fn encode_decision(decision: Decision) -> Vec<u8> {
    let mut buf = Vec::with_capacity(DECISION_SIZE);
    write_header(&mut buf, MessageType::Payload);
    buf.extend_from_slice(decision.wire_move());
    buf
}

/// Decodes a player's Decision.
///
/// Trailing NUL and whitespace bytes are ignored before matching.
///
/// # Errors
///
/// Returns [`ProtocolError::UnrecognizedMove`] for any move other than
/// `Hittt` or `Stand`.
pub fn decode_decision(bytes: &[u8]) -> Result<Decision, ProtocolError> {
    expect_header(bytes, MessageType::Payload)?;
    require_len(bytes, DECISION_SIZE)?;
    let raw = &bytes[HEADER_SIZE..DECISION_SIZE];
    let end = raw
        .iter()
        .rposition(|b| *b != 0 && !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    match &raw[..end] {
        m if m == HIT_MOVE => Ok(Decision::Hit),
        m if m == STAND_MOVE => Ok(Decision::Stand),
        other => Err(ProtocolError::UnrecognizedMove(
            String::from_utf8_lossy(other).into_owned(),
        )),
    }
}

// ── Utility helpers ───────────────────────────────────────────────────────────

fn write_header(buf: &mut Vec<u8>, msg_type: MessageType) {
    buf.extend_from_slice(&MAGIC_COOKIE.to_be_bytes());
    buf.push(msg_type as u8);
}

fn require_len(buf: &[u8], needed: usize) -> Result<(), ProtocolError> {
    if buf.len() < needed {
        Err(ProtocolError::InsufficientData {
            needed,
            available: buf.len(),
        })
    } else {
        Ok(())
    }
}

fn read_u32(buf: &[u8], offset: usize) -> Result<u32, ProtocolError> {
    require_len(buf, offset + 4)?;
    Ok(u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ]))
}

/// Writes `name` as exactly [`NAME_FIELD_SIZE`] bytes, truncating on a UTF-8
/// character boundary and padding with NULs.
fn write_padded_name(buf: &mut Vec<u8>, name: &str) {
    let mut end = name.len().min(NAME_FIELD_SIZE);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    buf.extend_from_slice(&name.as_bytes()[..end]);
    buf.resize(buf.len() + NAME_FIELD_SIZE - end, 0);
}

/// Reads a NUL-padded name field, stopping at the first NUL.
fn read_padded_name(field: &[u8]) -> Result<String, ProtocolError> {
    let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
    std::str::from_utf8(&field[..end])
        .map(str::to_string)
        .map_err(|e| ProtocolError::MalformedPayload(format!("invalid UTF-8 in name: {e}")))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn card(suit: Suit, rank: u8) -> Card {
        Card::new(suit, rank).unwrap()
    }

    fn with_cookie(mut bytes: Vec<u8>, cookie: u32) -> Vec<u8> {
        bytes[0..4].copy_from_slice(&cookie.to_be_bytes());
        bytes
    }

    // ── Layout ───────────────────────────────────────────────────────────────

    #[test]
    fn test_offer_layout_is_big_endian_and_padded() {
        let bytes = encode_offer(0x1234, "ab");
        assert_eq!(bytes.len(), OFFER_SIZE);
        assert_eq!(&bytes[0..4], &[0xab, 0xcd, 0xdc, 0xba]);
        assert_eq!(bytes[4], 0x2);
        assert_eq!(&bytes[5..7], &[0x12, 0x34]);
        assert_eq!(&bytes[7..9], b"ab");
        assert!(bytes[9..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_card_payload_layout() {
        let bytes = encode_card_payload(&card(Suit::Clubs, 12));
        assert_eq!(bytes, vec![0xab, 0xcd, 0xdc, 0xba, 0x4, 0x0, 0x00, 0x0C, 0x3]);
    }

    #[test]
    fn test_result_payload_layout() {
        let bytes = encode_result_payload(RoundOutcome::Loss);
        assert_eq!(bytes, vec![0xab, 0xcd, 0xdc, 0xba, 0x4, 0x2]);
    }

    #[test]
    fn test_decision_layout() {
        let bytes = encode_decision(Decision::Hit);
        assert_eq!(&bytes[5..], b"Hittt");
        assert_eq!(bytes.len(), DECISION_SIZE);
    }

    // ── Names ────────────────────────────────────────────────────────────────

    #[test]
    fn test_long_name_is_truncated_to_32_bytes() {
        let long = "x".repeat(40);
        let offer = decode_offer(&encode_offer(1, &long)).unwrap();
        assert_eq!(offer.server_name, "x".repeat(32));
    }

    #[test]
    fn test_truncation_respects_utf8_boundaries() {
        // 31 ASCII bytes followed by a 2-byte character: the character must
        // be dropped rather than split.
        let name = format!("{}é", "a".repeat(31));
        let request = decode_request(&encode_request(3, &name)).unwrap();
        assert_eq!(request.team_name, "a".repeat(31));
    }

    #[test]
    fn test_invalid_utf8_name_is_malformed() {
        let mut bytes = encode_request(1, "team");
        bytes[6] = 0xFF;
        assert!(matches!(
            decode_request(&bytes),
            Err(ProtocolError::MalformedPayload(_))
        ));
    }

    // ── Cookie ───────────────────────────────────────────────────────────────

    #[test]
    fn test_every_decoder_rejects_bad_cookie() {
        let bad = 0xdead_beef;
        assert_eq!(
            decode_offer(&with_cookie(encode_offer(1, "d"), bad)),
            Err(ProtocolError::BadMagicCookie(bad))
        );
        assert_eq!(
            decode_request(&with_cookie(encode_request(1, "t"), bad)),
            Err(ProtocolError::BadMagicCookie(bad))
        );
        assert_eq!(
            decode_payload(&with_cookie(encode_result_payload(RoundOutcome::Win), bad)),
            Err(ProtocolError::BadMagicCookie(bad))
        );
        assert_eq!(
            decode_decision(&with_cookie(encode_decision(Decision::Stand), bad)),
            Err(ProtocolError::BadMagicCookie(bad))
        );
    }

    #[test]
    fn test_cookie_checked_before_length() {
        // Four bytes of wrong cookie and nothing else.
        let result = decode_request(&[0, 0, 0, 1]);
        assert_eq!(result, Err(ProtocolError::BadMagicCookie(1)));
    }

    // ── Length / type ────────────────────────────────────────────────────────

    #[test]
    fn test_empty_bytes_returns_insufficient_data() {
        assert!(matches!(
            decode_header(&[]),
            Err(ProtocolError::InsufficientData { needed: 4, available: 0 })
        ));
    }

    #[test]
    fn test_truncated_offer_returns_insufficient_data() {
        let bytes = encode_offer(5, "dealer");
        assert!(matches!(
            decode_offer(&bytes[..20]),
            Err(ProtocolError::InsufficientData { needed: OFFER_SIZE, .. })
        ));
    }

    #[test]
    fn test_unknown_type_byte_is_reported() {
        let mut bytes = encode_decision(Decision::Hit);
        bytes[4] = 0x9;
        assert_eq!(decode_decision(&bytes), Err(ProtocolError::UnknownMessageType(0x9)));
    }

    #[test]
    fn test_request_where_decision_expected_is_unexpected_type() {
        let bytes = encode_request(2, "team");
        assert_eq!(
            decode_decision(&bytes),
            Err(ProtocolError::UnexpectedMessageType {
                expected: MessageType::Payload,
                actual: MessageType::Request,
            })
        );
    }

    #[test]
    fn test_request_with_zero_rounds_is_malformed() {
        let bytes = encode_request(0, "team");
        assert!(matches!(
            decode_request(&bytes),
            Err(ProtocolError::MalformedPayload(_))
        ));
    }

    // ── Payload ──────────────────────────────────────────────────────────────

    #[test]
    fn test_payload_header_announces_card() {
        let bytes = encode_card_payload(&card(Suit::Hearts, 1));
        assert_eq!(
            decode_payload_header(&bytes[..PAYLOAD_HEADER_SIZE]),
            Ok(PayloadHeader::CardFollows)
        );
        assert_eq!(
            decode_card_fields(&bytes[PAYLOAD_HEADER_SIZE..]),
            Ok(card(Suit::Hearts, 1))
        );
    }

    #[test]
    fn test_payload_header_announces_result() {
        let bytes = encode_result_payload(RoundOutcome::Tie);
        assert_eq!(
            decode_payload_header(&bytes),
            Ok(PayloadHeader::Result(RoundOutcome::Tie))
        );
    }

    #[test]
    fn test_unknown_result_code_is_malformed() {
        let mut bytes = encode_result_payload(RoundOutcome::Win);
        bytes[5] = 7;
        assert!(matches!(
            decode_payload_header(&bytes),
            Err(ProtocolError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_card_fields_reject_bad_rank_and_suit() {
        assert!(matches!(
            decode_card_fields(&[0x00, 0x0E, 0x1]),
            Err(ProtocolError::MalformedPayload(_))
        ));
        assert!(matches!(
            decode_card_fields(&[0x01, 0x01, 0x1]),
            Err(ProtocolError::MalformedPayload(_))
        ));
        assert!(matches!(
            decode_card_fields(&[0x00, 0x05, 0x0]),
            Err(ProtocolError::MalformedPayload(_))
        ));
    }

    // ── Decision ─────────────────────────────────────────────────────────────

    #[test]
    fn test_decision_split_is_unrecognized() {
        let mut bytes = encode_decision(Decision::Stand);
        bytes[5..].copy_from_slice(b"Split");
        assert_eq!(
            decode_decision(&bytes),
            Err(ProtocolError::UnrecognizedMove("Split".to_string()))
        );
    }

    #[test]
    fn test_decision_hit_spelled_normally_is_unrecognized() {
        let mut bytes = encode_decision(Decision::Hit);
        bytes[5..].copy_from_slice(b"Hit\0\0");
        assert_eq!(
            decode_decision(&bytes),
            Err(ProtocolError::UnrecognizedMove("Hit".to_string()))
        );
    }
}

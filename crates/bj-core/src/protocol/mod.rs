//! Protocol module containing message types and the binary codec.

pub mod codec;
pub mod messages;

pub use codec::{
    decode_card_fields, decode_decision, decode_header, decode_offer, decode_payload,
    decode_payload_header, decode_request, encode_card_payload, encode_decision, encode_offer,
    encode_payload, encode_request, encode_result_payload, expect_header, ProtocolError,
};
pub use messages::*;

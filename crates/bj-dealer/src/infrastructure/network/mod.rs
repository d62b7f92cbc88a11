//! Network infrastructure for the dealer.
//!
//! # Sub-modules
//!
//! - **`broadcaster`** – Sends the UDP Offer once per interval so players on
//!   the LAN can find this dealer without typing an address.
//!
//! - **`player_stream`** – Adapts a TCP stream to the session's `PlayerLink`
//!   trait: fixed-size frame reads with an idle timeout, payload writes.
//!
//! - **`server`** – Binds the TCP listener, runs the accept loop, and spawns
//!   one `DealerSession` per connection.

pub mod broadcaster;
pub mod player_stream;
pub mod server;

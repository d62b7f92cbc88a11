//! Infrastructure layer for the player.
//!
//! OS-facing adapters: the UDP Offer listener, the TCP dealer connection,
//! and the interactive console.
//!
//! **Dependency rule**: this layer may depend on `application`, `domain` and
//! `bj_core`, but MUST NOT be imported by the `application` layer.

pub mod console;
pub mod network;

//! Infrastructure layer for the dealer.
//!
//! Contains OS-facing adapters: the TCP listener, the UDP offer broadcaster,
//! and the TOML configuration file.
//!
//! **Dependency rule**: this layer may depend on `application` and `bj_core`,
//! but MUST NOT be imported by the `application` layer.

pub mod network;
pub mod storage;

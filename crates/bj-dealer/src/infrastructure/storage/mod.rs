//! Storage infrastructure: the dealer's TOML configuration file.
//!
//! The `config` sub-module reads the file, fills in defaults for anything
//! missing, and rejects values that would make the dealer unusable.

pub mod config;

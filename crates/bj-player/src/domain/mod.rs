//! Domain types for the player application.

pub mod config;

pub use config::PlayerConfig;

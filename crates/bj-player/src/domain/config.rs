//! Player configuration.

use std::time::Duration;

use bj_core::protocol::messages::DISCOVERY_PORT;

/// Team name sent in the Request when none is given.
pub const DEFAULT_TEAM_NAME: &str = "Team Joker";

/// Idle limit for each read from the dealer.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Runtime configuration for the player, built from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    /// UDP port to listen on for dealer Offers.
    pub discovery_port: u16,
    /// Name sent to the dealer (at most 32 bytes are transmitted).
    pub team_name: String,
    /// How long to wait for each payload before giving up on the dealer.
    pub read_timeout: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            discovery_port: DISCOVERY_PORT,
            team_name: DEFAULT_TEAM_NAME.to_string(),
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}
